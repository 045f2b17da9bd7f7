//! Single-record delimited encoding for string-keyed maps.
//!
//! A map travels as one comma-separated record whose fields are `key=value`
//! tokens: `a=1,"b=x,y",c=`. Fields containing a comma, a quote or a line
//! break are wrapped in double quotes and embedded quotes are doubled, so
//! values with `,` or `=` survive a round trip.
//!
//! The reader is strict: a bare quote inside an unquoted field, or a quoted
//! field that is not closed or is followed by anything but a comma, is a
//! [`FlagenvError::MalformedRecord`]. Only the first record of the input is
//! read; leading blank lines are skipped.

use std::collections::HashMap;

use crate::error::FlagenvError;

/// Split a delimited record into its fields.
///
/// An empty token yields an empty sequence.
pub fn parse_delimited(token: &str) -> Result<Vec<String>, FlagenvError> {
    let record = token.trim_start_matches(['\r', '\n']);
    if record.is_empty() {
        return Ok(Vec::new());
    }

    let malformed = |reason| FlagenvError::MalformedRecord {
        record: token.to_string(),
        reason,
    };

    let mut fields = Vec::new();
    let mut chars = record.chars().peekable();

    loop {
        let mut field = String::new();

        if chars.peek() == Some(&'"') {
            chars.next();
            loop {
                match chars.next() {
                    Some('"') => match chars.peek() {
                        Some('"') => {
                            chars.next();
                            field.push('"');
                        }
                        Some(',') | Some('\r') | Some('\n') | None => break,
                        Some(_) => return Err(malformed("extraneous or missing \" in quoted-field")),
                    },
                    Some(c) => field.push(c),
                    None => return Err(malformed("extraneous or missing \" in quoted-field")),
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                match c {
                    ',' | '\r' | '\n' => break,
                    '"' => return Err(malformed("bare \" in non-quoted-field")),
                    _ => {
                        field.push(c);
                        chars.next();
                    }
                }
            }
        }

        fields.push(field);

        match chars.next() {
            Some(',') => continue,
            _ => break,
        }
    }

    Ok(fields)
}

/// Join fields into a single delimited record, without a line terminator.
pub fn format_delimited<S: AsRef<str>>(fields: &[S]) -> String {
    let mut out = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let field = field.as_ref();
        if needs_quotes(field) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out
}

fn needs_quotes(field: &str) -> bool {
    if field.is_empty() {
        return false;
    }
    if field == r"\." {
        return true;
    }
    field.contains([',', '"', '\r', '\n']) || field.starts_with(char::is_whitespace)
}

/// Split every element on its first `=`.
///
/// Later duplicates of a key overwrite earlier ones.
pub fn parse_key_value_pairs<S: AsRef<str>>(
    pairs: &[S],
) -> Result<HashMap<String, String>, FlagenvError> {
    let mut map = HashMap::with_capacity(pairs.len());
    for pair in pairs {
        let pair = pair.as_ref();
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| FlagenvError::InvalidPair(pair.to_string()))?;
        map.insert(key.to_string(), value.to_string());
    }
    Ok(map)
}

/// Convert every value to a base-10 signed 64-bit integer.
pub fn to_int64_map(map: HashMap<String, String>) -> Result<HashMap<String, i64>, FlagenvError> {
    map.into_iter()
        .map(|(key, value)| match value.parse::<i64>() {
            Ok(n) => Ok((key, n)),
            Err(source) => Err(FlagenvError::InvalidInt { value, source }),
        })
        .collect()
}

/// Render map entries as `key=value` tokens, in the map's iteration order.
pub(crate) fn map_to_pairs<V: std::fmt::Display>(map: &HashMap<String, V>) -> Vec<String> {
    map.iter().map(|(k, v)| format!("{k}={v}")).collect()
}
