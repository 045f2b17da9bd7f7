//! The settable-value capability and the built-in flag values.
//!
//! Every registered flag owns a [`FlagValue`]. Parsing a flag occurrence calls
//! [`FlagValue::set`]; the settings snapshot reads [`FlagValue::to_setting`]
//! once the flag is known to be changed. Callers plug their own types into
//! the binder by implementing this trait (see [`Field::value`](crate::Field::value)).

use std::fmt;
use std::time::Duration;

use toml::Value;

use crate::codec;
use crate::error::FlagenvError;

/// A value that can be parsed from a flag occurrence and printed back.
///
/// `Display` is the value's textual form (used for help defaults and, unless
/// overridden, for the settings snapshot).
pub trait FlagValue: fmt::Display {
    /// Parse one occurrence into the value.
    fn set(&mut self, raw: &str) -> Result<(), FlagenvError>;

    /// Short type name shown as the flag's value placeholder.
    fn type_name(&self) -> &'static str;

    /// How a changed flag appears in the settings snapshot.
    fn to_setting(&self) -> Value {
        Value::String(self.to_string())
    }

    /// A bare `--flag` without a value means `true`.
    fn is_bool_flag(&self) -> bool {
        false
    }
}

/// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`.
pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

pub(crate) fn parse_duration(raw: &str) -> Result<Duration, FlagenvError> {
    if raw == "0" {
        return Ok(Duration::ZERO);
    }
    humantime::parse_duration(raw).map_err(|e| FlagenvError::invalid_value(raw, "duration", e))
}

pub(crate) fn format_duration(d: Duration) -> String {
    humantime::format_duration(d).to_string()
}

/// Scalar types a [`ScalarValue`] can hold.
pub trait Scalar: Clone + 'static {
    const TYPE_NAME: &'static str;

    fn parse_raw(raw: &str) -> Result<Self, FlagenvError>;

    fn render(&self) -> String;

    fn setting(&self) -> Value;
}

macro_rules! integer_scalar {
    ($($ty:ty => $name:literal),* $(,)?) => {$(
        impl Scalar for $ty {
            const TYPE_NAME: &'static str = $name;

            fn parse_raw(raw: &str) -> Result<Self, FlagenvError> {
                raw.parse().map_err(|e| FlagenvError::invalid_value(raw, $name, e))
            }

            fn render(&self) -> String {
                self.to_string()
            }

            fn setting(&self) -> Value {
                i64::try_from(*self)
                    .map(Value::Integer)
                    .unwrap_or_else(|_| Value::String(self.to_string()))
            }
        }
    )*};
}

integer_scalar! {
    i8 => "int8",
    i16 => "int16",
    i32 => "int32",
    i64 => "int64",
    isize => "int",
    u8 => "uint8",
    u16 => "uint16",
    u32 => "uint32",
    u64 => "uint64",
    usize => "uint",
}

impl Scalar for String {
    const TYPE_NAME: &'static str = "string";

    fn parse_raw(raw: &str) -> Result<Self, FlagenvError> {
        Ok(raw.to_string())
    }

    fn render(&self) -> String {
        self.clone()
    }

    fn setting(&self) -> Value {
        Value::String(self.clone())
    }
}

impl Scalar for bool {
    const TYPE_NAME: &'static str = "bool";

    fn parse_raw(raw: &str) -> Result<Self, FlagenvError> {
        parse_bool(raw).ok_or_else(|| FlagenvError::invalid_value(raw, "bool", "invalid syntax"))
    }

    fn render(&self) -> String {
        self.to_string()
    }

    fn setting(&self) -> Value {
        Value::Boolean(*self)
    }
}

impl Scalar for f64 {
    const TYPE_NAME: &'static str = "float64";

    fn parse_raw(raw: &str) -> Result<Self, FlagenvError> {
        raw.parse()
            .map_err(|e| FlagenvError::invalid_value(raw, "float64", e))
    }

    fn render(&self) -> String {
        self.to_string()
    }

    fn setting(&self) -> Value {
        Value::Float(*self)
    }
}

impl Scalar for Duration {
    const TYPE_NAME: &'static str = "duration";

    fn parse_raw(raw: &str) -> Result<Self, FlagenvError> {
        parse_duration(raw)
    }

    fn render(&self) -> String {
        format_duration(*self)
    }

    fn setting(&self) -> Value {
        Value::String(format_duration(*self))
    }
}

/// Flag value holding a single scalar; every occurrence replaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarValue<T> {
    value: T,
}

impl<T: Scalar> ScalarValue<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn get(&self) -> &T {
        &self.value
    }
}

impl<T: Scalar> fmt::Display for ScalarValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value.render())
    }
}

impl<T: Scalar> FlagValue for ScalarValue<T> {
    fn set(&mut self, raw: &str) -> Result<(), FlagenvError> {
        self.value = T::parse_raw(raw)?;
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn to_setting(&self) -> Value {
        self.value.setting()
    }

    fn is_bool_flag(&self) -> bool {
        T::TYPE_NAME == "bool"
    }
}

/// Flag value for a string sequence.
///
/// Each occurrence is read as a delimited record. The first occurrence
/// replaces the initial value, later ones append to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringSliceValue {
    value: Vec<String>,
    changed: bool,
}

impl StringSliceValue {
    pub fn new(value: Vec<String>) -> Self {
        Self {
            value,
            changed: false,
        }
    }

    pub fn get(&self) -> &[String] {
        &self.value
    }
}

impl fmt::Display for StringSliceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", codec::format_delimited(&self.value))
    }
}

impl FlagValue for StringSliceValue {
    fn set(&mut self, raw: &str) -> Result<(), FlagenvError> {
        let items = codec::parse_delimited(raw)?;
        if self.changed {
            self.value.extend(items);
        } else {
            self.value = items;
        }
        self.changed = true;
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        "stringSlice"
    }

    fn to_setting(&self) -> Value {
        Value::Array(self.value.iter().cloned().map(Value::String).collect())
    }
}
