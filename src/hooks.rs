//! Decode hooks: pure conversions from snapshot values into field types.
//!
//! A snapshot value can be in several shapes depending on the layer it came
//! from. A changed map flag snapshots as an array of `key=value` tokens, an
//! environment variable is a single delimited record, and a default is
//! already a table. The map hooks accept all three. The other hooks return
//! `None` when they do not apply, leaving the value to the generic weak
//! conversion in [`decode`](crate::decode).

use std::collections::HashMap;
use std::time::Duration;

use toml::Value;
use tracing::warn;

use crate::codec;
use crate::error::FlagenvError;
use crate::map::MapElement;
use crate::value::{self, FlagValue};

fn map_hook<V: MapElement>(
    source: &Value,
    element: impl Fn(&Value) -> Option<V>,
) -> Result<HashMap<String, V>, FlagenvError> {
    match source {
        Value::Array(items) => {
            let tokens = items
                .iter()
                .map(|item| {
                    item.as_str().ok_or(FlagenvError::UnsupportedMapShape {
                        found: item.type_str(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            V::convert(codec::parse_key_value_pairs(&tokens)?)
        }
        Value::String(record) => {
            let tokens = codec::parse_delimited(record)?;
            V::convert(codec::parse_key_value_pairs(&tokens)?)
        }
        Value::Table(table) => table
            .iter()
            .map(|(k, v)| {
                element(v)
                    .map(|v| (k.clone(), v))
                    .ok_or(FlagenvError::UnsupportedMapShape { found: "table" })
            })
            .collect(),
        other => Err(FlagenvError::UnsupportedMapShape {
            found: other.type_str(),
        }),
    }
}

/// Convert a snapshot value into a string-to-string map.
pub fn string_map_hook(source: &Value) -> Result<HashMap<String, String>, FlagenvError> {
    map_hook(source, |v| v.as_str().map(str::to_string))
}

/// Convert a snapshot value into a string-to-i64 map.
pub fn int64_map_hook(source: &Value) -> Result<HashMap<String, i64>, FlagenvError> {
    map_hook(source, Value::as_integer)
}

/// Parse a duration string such as `1h30m` or `250ms`.
pub fn duration_hook(source: &Value) -> Result<Option<Duration>, FlagenvError> {
    match source {
        Value::String(raw) => value::parse_duration(raw).map(Some),
        _ => Ok(None),
    }
}

/// Split a string on commas. An empty string is an empty sequence.
pub fn string_slice_hook(source: &Value) -> Option<Vec<String>> {
    match source {
        Value::String(raw) if raw.is_empty() => Some(Vec::new()),
        Value::String(raw) => Some(raw.split(',').map(str::to_string).collect()),
        _ => None,
    }
}

/// Build a `T` by calling `set` on a default value with a string source.
///
/// A rejected string yields `None` like any other non-applicable source, so
/// the caller reports the shape mismatch.
pub fn custom_value_hook<T: FlagValue + Default>(source: &Value) -> Option<T> {
    let raw = source.as_str()?;
    let mut value = T::default();
    match value.set(raw) {
        Ok(()) => Some(value),
        Err(err) => {
            warn!(value = raw, kind = value.type_name(), error = %err, "custom value rejected input");
            None
        }
    }
}
