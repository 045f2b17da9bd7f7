//! Populate a config struct from a settings snapshot.
//!
//! [`decode`] walks the same field description as [`setup`](crate::setup).
//! Each leaf is looked up under its lowercased environment name; missing keys
//! leave the field as it is. Values are coerced weakly, so an environment
//! string `"8080"` fills a `u16` and a changed bool flag fills a `String` with
//! `"1"`. Nested and embedded structs are decoded from the same flat snapshot,
//! because their environment names are not prefixed.

use std::time::Duration;

use toml::{Table, Value};
use tracing::trace;

use crate::codec;
use crate::error::FlagenvError;
use crate::field::{Configure, Slot};
use crate::hooks;
use crate::value::{self, FlagValue, Scalar};

/// Copy snapshot values into `config`.
pub fn decode(settings: &Table, config: &mut dyn Configure) -> Result<(), FlagenvError> {
    for field in config.fields() {
        let (meta, slot) = field.into_parts();
        match slot {
            Slot::Nested(inner) | Slot::Embedded(inner) => {
                trace!(field = %meta.ident, "decoding struct");
                decode(settings, inner).map_err(|e| FlagenvError::Nested {
                    field: meta.ident.clone(),
                    source: Box::new(e),
                })?;
            }
            Slot::Unsupported(type_name) => {
                return Err(FlagenvError::UnsupportedType {
                    field: meta.ident,
                    type_name,
                });
            }
            leaf => {
                let key = meta.names()?.env.to_lowercase();
                if let Some(source) = settings.get(&key) {
                    trace!(key = %key, value = %source, "decoding field");
                    assign(&key, source, leaf)?;
                }
            }
        }
    }
    Ok(())
}

fn assign(key: &str, source: &Value, slot: Slot<'_>) -> Result<(), FlagenvError> {
    match slot {
        Slot::String(v) => *v = to_string(key, source)?,
        Slot::Bool(v) => *v = to_bool(key, source)?,
        Slot::I8(v) => *v = to_int(key, source)?,
        Slot::I16(v) => *v = to_int(key, source)?,
        Slot::I32(v) => *v = to_int(key, source)?,
        Slot::I64(v) => *v = to_int(key, source)?,
        Slot::Isize(v) => *v = to_int(key, source)?,
        Slot::U8(v) => *v = to_int(key, source)?,
        Slot::U16(v) => *v = to_int(key, source)?,
        Slot::U32(v) => *v = to_int(key, source)?,
        Slot::U64(v) => *v = to_int(key, source)?,
        Slot::Usize(v) => *v = to_int(key, source)?,
        Slot::F64(v) => *v = to_float(key, source)?,
        Slot::Duration(v) => *v = to_duration(key, source)?,
        Slot::Strings(v) => *v = to_strings(key, source)?,
        Slot::StringMap(v) => *v = hooks::string_map_hook(source)?,
        Slot::Int64Map(v) => *v = hooks::int64_map_hook(source)?,
        Slot::Custom(v) => v.decode(key, source)?,
        // Walked by `decode` itself.
        Slot::Nested(_) | Slot::Embedded(_) | Slot::Unsupported(_) => {}
    }
    Ok(())
}

/// Decode a caller-defined value: the custom-value hook first, then a shape
/// check that names the target type.
///
/// A value whose snapshot form is composite (a changed map or slice flag
/// snapshots as a token array) is turned back into the delimited record its
/// `set` reads.
pub(crate) fn custom_value<T: FlagValue + Default>(
    key: &str,
    source: &Value,
) -> Result<T, FlagenvError> {
    let record = setting_record(source).map(Value::String);
    hooks::custom_value_hook::<T>(record.as_ref().unwrap_or(source)).ok_or_else(|| {
        FlagenvError::UnexpectedShape {
            key: key.to_string(),
            expected: T::default().type_name(),
            found: source.type_str(),
        }
    })
}

/// Re-encode an array of tokens, or a table of `key = scalar` entries, as
/// one delimited record.
fn setting_record(source: &Value) -> Option<String> {
    let tokens: Vec<String> = match source {
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<_>>()?,
        Value::Table(table) => table
            .iter()
            .map(|(k, v)| match v {
                Value::String(s) => Some(format!("{k}={s}")),
                Value::Integer(i) => Some(format!("{k}={i}")),
                _ => None,
            })
            .collect::<Option<_>>()?,
        _ => return None,
    };
    Some(codec::format_delimited(&tokens))
}

fn unexpected(key: &str, expected: &'static str, found: &Value) -> FlagenvError {
    FlagenvError::UnexpectedShape {
        key: key.to_string(),
        expected,
        found: found.type_str(),
    }
}

fn to_string(key: &str, source: &Value) -> Result<String, FlagenvError> {
    match source {
        Value::String(s) => Ok(s.clone()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Boolean(b) => Ok(if *b { "1" } else { "0" }.to_string()),
        other => Err(unexpected(key, "string", other)),
    }
}

fn to_bool(key: &str, source: &Value) -> Result<bool, FlagenvError> {
    match source {
        Value::Boolean(b) => Ok(*b),
        Value::Integer(i) => Ok(*i != 0),
        Value::Float(f) => Ok(*f != 0.0),
        Value::String(s) if s.is_empty() => Ok(false),
        Value::String(s) => value::parse_bool(s)
            .ok_or_else(|| FlagenvError::invalid_value(s, "bool", "invalid syntax")),
        other => Err(unexpected(key, "bool", other)),
    }
}

fn to_int<T: Scalar + TryFrom<i64>>(key: &str, source: &Value) -> Result<T, FlagenvError> {
    let in_range = |n: i64, raw: String| {
        T::try_from(n).map_err(|_| FlagenvError::invalid_value(&raw, T::TYPE_NAME, "value out of range"))
    };
    match source {
        Value::Integer(i) => in_range(*i, i.to_string()),
        Value::Boolean(b) => in_range(i64::from(*b), b.to_string()),
        Value::Float(f) => {
            let t = f.trunc();
            if t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64 {
                in_range(t as i64, f.to_string())
            } else {
                Err(FlagenvError::invalid_value(
                    &f.to_string(),
                    T::TYPE_NAME,
                    "value out of range",
                ))
            }
        }
        Value::String(s) if s.is_empty() => in_range(0, String::new()),
        Value::String(s) => T::parse_raw(s),
        other => Err(unexpected(key, T::TYPE_NAME, other)),
    }
}

fn to_float(key: &str, source: &Value) -> Result<f64, FlagenvError> {
    match source {
        Value::Float(f) => Ok(*f),
        Value::Integer(i) => Ok(*i as f64),
        Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) if s.is_empty() => Ok(0.0),
        Value::String(s) => f64::parse_raw(s),
        other => Err(unexpected(key, "float64", other)),
    }
}

fn to_duration(key: &str, source: &Value) -> Result<Duration, FlagenvError> {
    if let Some(d) = hooks::duration_hook(source)? {
        return Ok(d);
    }
    match source {
        Value::Integer(nanos) => u64::try_from(*nanos)
            .map(Duration::from_nanos)
            .map_err(|_| {
                FlagenvError::invalid_value(&nanos.to_string(), "duration", "negative duration")
            }),
        other => Err(unexpected(key, "duration", other)),
    }
}

fn to_strings(key: &str, source: &Value) -> Result<Vec<String>, FlagenvError> {
    if let Some(items) = hooks::string_slice_hook(source) {
        return Ok(items);
    }
    match source {
        Value::Array(items) => items.iter().map(|item| to_string(key, item)).collect(),
        Value::Integer(_) | Value::Float(_) | Value::Boolean(_) => Ok(vec![to_string(key, source)?]),
        other => Err(unexpected(key, "stringSlice", other)),
    }
}
