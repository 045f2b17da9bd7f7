//! Composite flag values for string-keyed maps.
//!
//! [`StringMap`] and [`Int64Map`] let a map field behave as a flag: each
//! occurrence is a delimited record of `key=value` tokens (see [`codec`]).
//! The first [`set`](FlagValue::set) replaces the map wholesale; every later
//! one merges into it, last write per key winning, so
//! `--label a=1 --label b=2` accumulates `{a: 1, b: 2}`.
//!
//! A failed `set` leaves the held map untouched.

use std::collections::HashMap;
use std::fmt;

use toml::Value;

use crate::codec;
use crate::error::FlagenvError;
use crate::value::FlagValue;

/// Element types a [`MapValue`] supports.
pub trait MapElement: Clone + fmt::Display + 'static {
    const TYPE_NAME: &'static str;

    fn convert(map: HashMap<String, String>) -> Result<HashMap<String, Self>, FlagenvError>;
}

impl MapElement for String {
    const TYPE_NAME: &'static str = "stringToString";

    fn convert(map: HashMap<String, String>) -> Result<HashMap<String, Self>, FlagenvError> {
        Ok(map)
    }
}

impl MapElement for i64 {
    const TYPE_NAME: &'static str = "stringToInt64";

    fn convert(map: HashMap<String, String>) -> Result<HashMap<String, Self>, FlagenvError> {
        codec::to_int64_map(map)
    }
}

/// A map-typed flag value with accumulate-on-repeat semantics.
#[derive(Debug, Clone, PartialEq)]
pub struct MapValue<V> {
    value: HashMap<String, V>,
    changed: bool,
}

pub type StringMap = MapValue<String>;
pub type Int64Map = MapValue<i64>;

impl<V: MapElement> MapValue<V> {
    /// Wrap an initial map. It is replaced by the first `set`.
    pub fn new(value: HashMap<String, V>) -> Self {
        Self {
            value,
            changed: false,
        }
    }

    pub fn get(&self) -> &HashMap<String, V> {
        &self.value
    }

    pub fn into_inner(self) -> HashMap<String, V> {
        self.value
    }

    /// Whether `set` has succeeded at least once.
    pub fn changed(&self) -> bool {
        self.changed
    }
}

impl<V: MapElement> Default for MapValue<V> {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}

impl<V: MapElement> fmt::Display for MapValue<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}]",
            codec::format_delimited(&codec::map_to_pairs(&self.value))
        )
    }
}

impl<V: MapElement> FlagValue for MapValue<V> {
    fn set(&mut self, raw: &str) -> Result<(), FlagenvError> {
        let fields = codec::parse_delimited(raw)?;
        let parsed = V::convert(codec::parse_key_value_pairs(&fields)?)?;
        if self.changed {
            self.value.extend(parsed);
        } else {
            self.value = parsed;
        }
        self.changed = true;
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        V::TYPE_NAME
    }

    /// Snapshot as a sequence of `key=value` tokens; the map decode hooks
    /// accept that shape directly.
    fn to_setting(&self) -> Value {
        Value::Array(
            codec::map_to_pairs(&self.value)
                .into_iter()
                .map(Value::String)
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn first_set_replaces_initial_map() {
        let mut m = StringMap::new(string_map(&[("old", "x")]));
        m.set("a=1").unwrap();
        assert_eq!(m.get(), &string_map(&[("a", "1")]));
        assert!(m.changed());
    }

    #[test]
    fn later_sets_merge() {
        let mut m = StringMap::default();
        m.set("a=1").unwrap();
        m.set("b=2").unwrap();
        assert_eq!(m.get(), &string_map(&[("a", "1"), ("b", "2")]));
    }

    #[test]
    fn later_sets_overwrite_same_key() {
        let mut m = StringMap::default();
        m.set("a=1").unwrap();
        m.set("a=2").unwrap();
        assert_eq!(m.get(), &string_map(&[("a", "2")]));
    }

    #[test]
    fn malformed_token_leaves_map_unchanged() {
        let mut m = StringMap::default();
        m.set("x=9").unwrap();
        let err = m.set("a=1,b").unwrap_err();
        assert!(err.is_format_error());
        assert_eq!(m.get(), &string_map(&[("x", "9")]));
    }

    #[test]
    fn malformed_first_set_keeps_initial_map() {
        let mut m = StringMap::new(string_map(&[("keep", "me")]));
        assert!(m.set("nope").is_err());
        assert_eq!(m.get(), &string_map(&[("keep", "me")]));
        assert!(!m.changed());
    }

    #[test]
    fn quoted_values_survive() {
        let mut m = StringMap::default();
        m.set(r#""dsn=host=db,port=5432",b=2"#).unwrap();
        assert_eq!(m.get()["dsn"], "host=db,port=5432");
        assert_eq!(m.get()["b"], "2");
    }

    #[test]
    fn display_is_bracketed_record() {
        let m = StringMap::new(string_map(&[("a", "1")]));
        assert_eq!(m.to_string(), "[a=1]");
        assert_eq!(StringMap::default().to_string(), "[]");
    }

    #[test]
    fn display_of_many_entries_round_trips() {
        let m = StringMap::new(string_map(&[("a", "1"), ("b", "x,y"), ("c", "")]));
        let shown = m.to_string();
        let inner = shown.trim_start_matches('[').trim_end_matches(']');
        let back = codec::parse_key_value_pairs(&codec::parse_delimited(inner).unwrap()).unwrap();
        assert_eq!(&back, m.get());
    }

    #[test]
    fn int64_map_merges() {
        let mut m = Int64Map::default();
        m.set("a=1").unwrap();
        m.set("b=-2,a=3").unwrap();
        assert_eq!(m.get()["a"], 3);
        assert_eq!(m.get()["b"], -2);
        assert_eq!(m.type_name(), "stringToInt64");
    }

    #[test]
    fn int64_map_rejects_non_integer() {
        let mut m = Int64Map::default();
        m.set("a=1").unwrap();
        let err = m.set("b=two").unwrap_err();
        assert!(matches!(err, FlagenvError::InvalidInt { ref value, .. } if value == "two"));
        assert_eq!(m.get().len(), 1);
    }

    #[test]
    fn setting_is_sequence_of_pairs() {
        let m = Int64Map::new([("n".to_string(), 5)].into_iter().collect());
        assert_eq!(m.to_setting(), Value::Array(vec![Value::String("n=5".into())]));
    }
}
