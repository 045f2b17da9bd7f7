//! Field descriptors: how a config struct exposes its fields to the binder.
//!
//! A struct implements [`Configure`] by listing its fields in declaration
//! order. Each [`Field`] carries the metadata the binder derives names from
//! ([`FieldMeta`]) and a [`Slot`], a typed mutable handle on the field. The
//! slot kind is resolved once, when the field is described:
//!
//! ```ignore
//! impl Configure for AppConfig {
//!     fn fields(&mut self) -> Vec<Field<'_>> {
//!         vec![
//!             Field::new("Host", &mut self.host).desc("Address to bind"),
//!             Field::new("Port", &mut self.port).tags(r#"flag:"port,p""#),
//!             Field::new("Labels", &mut self.labels),
//!             Field::nested("Database", &mut self.database),
//!             Field::embedded("Common", &mut self.common),
//!             Field::value("Level", &mut self.level),
//!         ]
//!     }
//! }
//! ```
//!
//! # Naming
//!
//! Without explicit names, the identifier is split into words and joined as
//! `SHOUTY_SNAKE` for the environment and `kebab-case` for the flag:
//! `MaxRetryCount` (or `max_retry_count`) becomes `MAX_RETRY_COUNT` and
//! `--max-retry-count`. A digit run is a word of its own, so `Int64Map`
//! becomes `INT_64_MAP` and `--int-64-map`.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::time::Duration;

use heck::{ToKebabCase, ToShoutySnakeCase};
use toml::Value;

use crate::error::FlagenvError;
use crate::value::FlagValue;

/// A struct whose fields can be bound to flags and environment variables.
pub trait Configure {
    /// Describe every bindable field, in declaration order.
    fn fields(&mut self) -> Vec<Field<'_>>;
}

impl<C: Configure + ?Sized> Configure for Box<C> {
    fn fields(&mut self) -> Vec<Field<'_>> {
        (**self).fields()
    }
}

/// Declarative metadata for one field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMeta {
    pub ident: String,
    pub env: Option<String>,
    pub flag: Option<String>,
    pub shorthand: Option<String>,
    pub desc: Option<String>,
}

/// Names derived from a [`FieldMeta`].
#[derive(Debug, Clone, PartialEq)]
pub struct Names {
    pub env: String,
    pub flag: String,
    pub shorthand: Option<char>,
    pub usage: String,
}

impl FieldMeta {
    pub fn new(ident: &str) -> Self {
        Self {
            ident: ident.to_string(),
            ..Self::default()
        }
    }

    /// Resolve environment name, flag name, shorthand and usage text.
    ///
    /// An explicit env `PRIMARY,alias` keeps only `PRIMARY`; an explicit flag
    /// `name,s` carries shorthand `s`. Empty explicit names fall back to the
    /// derived ones.
    pub fn names(&self) -> Result<Names, FlagenvError> {
        let mut env = self.env.clone().unwrap_or_default();
        let mut flag = self.flag.clone().unwrap_or_default();
        let mut shorthand = self.shorthand.clone().unwrap_or_default();

        if let Some((name, short)) = flag.split_once(',') {
            shorthand = short.split(',').next().unwrap_or_default().to_string();
            flag = name.to_string();
        }
        if let Some((primary, _alias)) = env.split_once(',') {
            env = primary.to_string();
        }

        if env.is_empty() {
            env = derive_env_name(&self.ident);
        }
        if flag.is_empty() {
            flag = derive_flag_name(&self.ident);
        }

        let shorthand = match shorthand.chars().count() {
            0 => None,
            1 => shorthand.chars().next(),
            _ => {
                return Err(FlagenvError::InvalidShorthand {
                    flag,
                    shorthand,
                });
            }
        };

        let usage = format!(
            "{} (environment {env})",
            self.desc.as_deref().unwrap_or_default()
        );

        Ok(Names {
            env,
            flag,
            shorthand,
            usage,
        })
    }
}

pub fn derive_env_name(ident: &str) -> String {
    split_digit_runs(ident).to_shouty_snake_case()
}

pub fn derive_flag_name(ident: &str) -> String {
    split_digit_runs(ident).to_kebab_case()
}

/// Mark letter/digit boundaries so a digit run is a word of its own:
/// `OAuth2Token` splits as `O Auth 2 Token`.
fn split_digit_runs(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len() + 4);
    let mut prev: Option<char> = None;
    for c in ident.chars() {
        if let Some(p) = prev
            && ((p.is_ascii_digit() && c.is_alphabetic())
                || (p.is_alphabetic() && c.is_ascii_digit()))
        {
            out.push('_');
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

/// Parse a struct-tag style annotation: space separated `key:"value"` pairs.
///
/// Values use backslash escapes for `"` and `\`. Parsing stops at the first
/// malformed pair; pairs read before it are kept.
pub fn parse_tags(tags: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut rest = tags;

    loop {
        rest = rest.trim_start();
        let Some((key, after)) = rest.split_once(':') else {
            break;
        };
        if key.is_empty() || key.contains(char::is_whitespace) || key.contains('"') {
            break;
        }
        let Some(quoted) = after.strip_prefix('"') else {
            break;
        };

        let mut value = String::new();
        let mut chars = quoted.char_indices();
        let mut end = None;
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, escaped)) => value.push(escaped),
                    None => break,
                },
                '"' => {
                    end = Some(i);
                    break;
                }
                _ => value.push(c),
            }
        }
        let Some(end) = end else {
            break;
        };

        out.push((key.to_string(), value));
        rest = &quoted[end + 1..];
    }

    out
}

/// A typed mutable handle on one struct field.
pub enum Slot<'a> {
    String(&'a mut String),
    Bool(&'a mut bool),
    I8(&'a mut i8),
    I16(&'a mut i16),
    I32(&'a mut i32),
    I64(&'a mut i64),
    Isize(&'a mut isize),
    U8(&'a mut u8),
    U16(&'a mut u16),
    U32(&'a mut u32),
    U64(&'a mut u64),
    Usize(&'a mut usize),
    F64(&'a mut f64),
    Duration(&'a mut Duration),
    Strings(&'a mut Vec<String>),
    StringMap(&'a mut HashMap<String, String>),
    Int64Map(&'a mut HashMap<String, i64>),
    Custom(&'a mut dyn CustomValue),
    Nested(&'a mut dyn Configure),
    Embedded(&'a mut dyn Configure),
    /// A field type with no flag representation; binding it fails.
    Unsupported(&'static str),
}

macro_rules! resolve_slot {
    ($any:ident, $name:ident; $($ty:ty => $variant:ident),* $(,)?) => {{
        $(
            if $any.is::<$ty>() {
                return match $any.downcast_mut::<$ty>() {
                    Some(v) => Slot::$variant(v),
                    None => Slot::Unsupported($name),
                };
            }
        )*
        Slot::Unsupported($name)
    }};
}

impl<'a> Slot<'a> {
    /// Resolve the slot kind from the field's concrete type.
    pub fn of<T: Any>(value: &'a mut T) -> Self {
        let name = type_name::<T>();
        let any: &'a mut dyn Any = value;
        resolve_slot!(any, name;
            String => String,
            bool => Bool,
            i8 => I8,
            i16 => I16,
            i32 => I32,
            i64 => I64,
            isize => Isize,
            u8 => U8,
            u16 => U16,
            u32 => U32,
            u64 => U64,
            usize => Usize,
            f64 => F64,
            Duration => Duration,
            Vec<String> => Strings,
            HashMap<String, String> => StringMap,
            HashMap<String, i64> => Int64Map,
        )
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Slot::String(_) => "string",
            Slot::Bool(_) => "bool",
            Slot::I8(_) => "int8",
            Slot::I16(_) => "int16",
            Slot::I32(_) => "int32",
            Slot::I64(_) => "int64",
            Slot::Isize(_) => "int",
            Slot::U8(_) => "uint8",
            Slot::U16(_) => "uint16",
            Slot::U32(_) => "uint32",
            Slot::U64(_) => "uint64",
            Slot::Usize(_) => "uint",
            Slot::F64(_) => "float64",
            Slot::Duration(_) => "duration",
            Slot::Strings(_) => "stringSlice",
            Slot::StringMap(_) => "stringToString",
            Slot::Int64Map(_) => "stringToInt64",
            Slot::Custom(v) => v.current().type_name(),
            Slot::Nested(_) => "struct",
            Slot::Embedded(_) => "embedded struct",
            Slot::Unsupported(name) => *name,
        }
    }
}

/// A caller-defined [`FlagValue`] bound to a field.
///
/// Implemented for every `FlagValue + Default + Clone`: the flag registry
/// gets a copy of the current value, and decoding builds a fresh default
/// value to `set` from the snapshot.
pub trait CustomValue {
    fn current(&self) -> &dyn FlagValue;

    fn flag_value(&self) -> Box<dyn FlagValue>;

    fn decode(&mut self, key: &str, source: &Value) -> Result<(), FlagenvError>;
}

impl<T> CustomValue for T
where
    T: FlagValue + Default + Clone + 'static,
{
    fn current(&self) -> &dyn FlagValue {
        self
    }

    fn flag_value(&self) -> Box<dyn FlagValue> {
        Box::new(self.clone())
    }

    fn decode(&mut self, key: &str, source: &Value) -> Result<(), FlagenvError> {
        *self = crate::decode::custom_value::<T>(key, source)?;
        Ok(())
    }
}

/// One described field: metadata plus its slot.
pub struct Field<'a> {
    meta: FieldMeta,
    slot: Slot<'a>,
}

impl<'a> Field<'a> {
    /// A scalar, sequence or map field; the kind follows the value's type.
    pub fn new<T: Any>(ident: &str, value: &'a mut T) -> Self {
        Self {
            meta: FieldMeta::new(ident),
            slot: Slot::of(value),
        }
    }

    /// A nested struct; its flags are prefixed with this field's flag name.
    pub fn nested<C: Configure>(ident: &str, value: &'a mut C) -> Self {
        Self {
            meta: FieldMeta::new(ident),
            slot: Slot::Nested(value),
        }
    }

    /// An embedded struct; its fields join the parent's namespace.
    pub fn embedded<C: Configure>(ident: &str, value: &'a mut C) -> Self {
        Self {
            meta: FieldMeta::new(ident),
            slot: Slot::Embedded(value),
        }
    }

    /// A field whose type implements [`FlagValue`] itself.
    pub fn value<T>(ident: &str, value: &'a mut T) -> Self
    where
        T: FlagValue + Default + Clone + 'static,
    {
        Self {
            meta: FieldMeta::new(ident),
            slot: Slot::Custom(value),
        }
    }

    /// A field with an explicitly chosen slot.
    pub fn with_slot(ident: &str, slot: Slot<'a>) -> Self {
        Self {
            meta: FieldMeta::new(ident),
            slot,
        }
    }

    pub fn env(mut self, name: &str) -> Self {
        self.meta.env = Some(name.to_string());
        self
    }

    pub fn flag(mut self, name: &str) -> Self {
        self.meta.flag = Some(name.to_string());
        self
    }

    pub fn short(mut self, shorthand: char) -> Self {
        self.meta.shorthand = Some(shorthand.to_string());
        self
    }

    pub fn desc(mut self, desc: &str) -> Self {
        self.meta.desc = Some(desc.to_string());
        self
    }

    /// Apply `env`, `flag` and `desc` entries from a struct-tag string.
    pub fn tags(mut self, tags: &str) -> Self {
        for (key, value) in parse_tags(tags) {
            match key.as_str() {
                "env" => self.meta.env = Some(value),
                "flag" => self.meta.flag = Some(value),
                "desc" => self.meta.desc = Some(value),
                _ => {}
            }
        }
        self
    }

    pub fn meta(&self) -> &FieldMeta {
        &self.meta
    }

    pub fn slot(&self) -> &Slot<'a> {
        &self.slot
    }

    pub fn into_parts(self) -> (FieldMeta, Slot<'a>) {
        (self.meta, self.slot)
    }
}
