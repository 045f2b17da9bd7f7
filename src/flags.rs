//! The flag-registration store.
//!
//! A [`FlagSet`] owns one [`FlagValue`] per registered flag. It knows nothing
//! about argument syntax: occurrences are fed in through [`FlagSet::set`],
//! either by the clap adapter (`cli` module) or by any other front end.

use std::collections::HashMap;
use std::fmt;

use toml::Value;
use tracing::debug;

use crate::error::FlagenvError;
use crate::value::FlagValue;

/// A registered flag.
pub struct Flag {
    name: String,
    shorthand: Option<char>,
    usage: String,
    default: String,
    default_setting: Value,
    value: Box<dyn FlagValue>,
    changed: bool,
}

impl Flag {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shorthand(&self) -> Option<char> {
        self.shorthand
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// Textual form of the value the flag was registered with.
    pub fn default_value(&self) -> &str {
        &self.default
    }

    /// Snapshot form of the value the flag was registered with.
    pub fn default_setting(&self) -> &Value {
        &self.default_setting
    }

    pub fn value(&self) -> &dyn FlagValue {
        self.value.as_ref()
    }

    /// Snapshot form of the current value.
    pub fn setting(&self) -> Value {
        self.value.to_setting()
    }

    /// Whether at least one occurrence was applied.
    pub fn changed(&self) -> bool {
        self.changed
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("name", &self.name)
            .field("shorthand", &self.shorthand)
            .field("type", &self.value.type_name())
            .field("value", &self.value.to_string())
            .field("changed", &self.changed)
            .finish()
    }
}

/// Registry of named flags, in registration order.
#[derive(Debug, Default)]
pub struct FlagSet {
    flags: Vec<Flag>,
    by_name: HashMap<String, usize>,
    by_short: HashMap<char, usize>,
}

impl FlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a flag. Long names and shorthands must be unique.
    pub fn register(
        &mut self,
        name: &str,
        shorthand: Option<char>,
        usage: &str,
        value: Box<dyn FlagValue>,
    ) -> Result<&Flag, FlagenvError> {
        if self.by_name.contains_key(name) {
            return Err(FlagenvError::DuplicateFlag(name.to_string()));
        }
        if let Some(short) = shorthand
            && self.by_short.contains_key(&short)
        {
            return Err(FlagenvError::DuplicateFlag(format!("{name} (shorthand -{short})")));
        }

        debug!(
            flag = name,
            shorthand = ?shorthand,
            kind = value.type_name(),
            default = %value,
            "registered flag"
        );

        let idx = self.flags.len();
        self.flags.push(Flag {
            name: name.to_string(),
            shorthand,
            usage: usage.to_string(),
            default: value.to_string(),
            default_setting: value.to_setting(),
            value,
            changed: false,
        });
        self.by_name.insert(name.to_string(), idx);
        if let Some(short) = shorthand {
            self.by_short.insert(short, idx);
        }
        Ok(&self.flags[idx])
    }

    pub fn lookup(&self, name: &str) -> Option<&Flag> {
        self.by_name.get(name).map(|&idx| &self.flags[idx])
    }

    pub fn lookup_short(&self, shorthand: char) -> Option<&Flag> {
        self.by_short.get(&shorthand).map(|&idx| &self.flags[idx])
    }

    /// Apply one occurrence of `--name raw`.
    pub fn set(&mut self, name: &str, raw: &str) -> Result<(), FlagenvError> {
        let idx = *self
            .by_name
            .get(name)
            .ok_or_else(|| FlagenvError::UnknownFlag(name.to_string()))?;
        let flag = &mut self.flags[idx];
        flag.value
            .set(raw)
            .map_err(|e| FlagenvError::InvalidFlagValue {
                flag: name.to_string(),
                value: raw.to_string(),
                source: Box::new(e),
            })?;
        flag.changed = true;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.flags.iter()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}
