//! Layered settings store.
//!
//! [`Settings`] is an explicit context object: it is created before
//! [`setup`](crate::setup), collects environment bindings, defaults and flag
//! bindings while fields are registered, and produces a flat snapshot for
//! [`decode`](crate::decode). Every layer is a sparse [`toml::Table`] and the
//! snapshot is their deep merge, lowest priority first:
//!
//! ```text
//! Unchanged flag default     value the flag was registered with
//!        ↑ overridden by
//! Explicit default           set_default()
//!        ↑ overridden by
//! Environment                bound variable, read from the captured vars
//!        ↑ overridden by
//! Changed flag               at least one occurrence on the command line
//! ```
//!
//! Keys are case-insensitive and stored lowercased. The environment variable
//! read for a key is the key in upper case.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use toml::{Table, Value};
use tracing::debug;

use crate::error::FlagenvError;
use crate::flags::{Flag, FlagSet};
use crate::types::{SettingEntry, Source};

#[derive(Debug, Clone)]
pub struct Settings {
    allow_empty_env: bool,
    vars: HashMap<String, String>,
    env_bindings: BTreeMap<String, String>,
    defaults: Table,
    flag_bindings: BTreeMap<String, String>,
}

impl Settings {
    /// Capture the process environment. Empty values count as set.
    pub fn new() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)));
        Self::with_vars(vars).allow_empty_env(true)
    }

    /// Use a synthetic environment instead of the process one.
    ///
    /// Empty values are ignored unless [`allow_empty_env`](Self::allow_empty_env)
    /// is turned on.
    pub fn with_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            allow_empty_env: false,
            vars: vars.into_iter().collect(),
            env_bindings: BTreeMap::new(),
            defaults: Table::new(),
            flag_bindings: BTreeMap::new(),
        }
    }

    /// Whether an environment variable set to `""` counts as a value.
    pub fn allow_empty_env(mut self, allow: bool) -> Self {
        self.allow_empty_env = allow;
        self
    }

    /// Bind `name` to the environment variable `NAME`.
    pub fn bind_env(&mut self, name: &str) -> Result<(), FlagenvError> {
        if name.is_empty() {
            return Err(FlagenvError::EnvBinding {
                name: name.to_string(),
                reason: "missing key to bind to".into(),
            });
        }
        let key = name.to_lowercase();
        let var = name.to_uppercase();
        debug!(key = %key, env = %var, "bound environment variable");
        self.env_bindings.insert(key, var);
        Ok(())
    }

    pub fn set_default(&mut self, name: &str, value: Value) {
        self.defaults.insert(name.to_lowercase(), value);
    }

    /// Read `name` from `flag` whenever the flag has been changed.
    pub fn bind_flag(&mut self, name: &str, flag: &Flag) -> Result<(), FlagenvError> {
        if name.is_empty() {
            return Err(FlagenvError::EnvBinding {
                name: flag.name().to_string(),
                reason: "missing key to bind flag to".into(),
            });
        }
        self.flag_bindings
            .insert(name.to_lowercase(), flag.name().to_string());
        Ok(())
    }

    fn env_value(&self, key: &str) -> Option<&str> {
        let var = self.env_bindings.get(key)?;
        let value = self.vars.get(var)?;
        if value.is_empty() && !self.allow_empty_env {
            return None;
        }
        Some(value)
    }

    fn env_table(&self) -> Table {
        self.env_bindings
            .keys()
            .filter_map(|key| {
                let value = self.env_value(key)?;
                Some((key.clone(), Value::String(value.to_string())))
            })
            .collect()
    }

    /// Split bound flags into (unchanged defaults, changed values).
    fn flag_tables(&self, flags: &FlagSet) -> (Table, Table) {
        let mut unchanged = Table::new();
        let mut changed = Table::new();
        for (key, name) in &self.flag_bindings {
            let Some(flag) = flags.lookup(name) else {
                continue;
            };
            if flag.changed() {
                changed.insert(key.clone(), flag.setting());
            } else {
                unchanged.insert(key.clone(), flag.default_setting().clone());
            }
        }
        (unchanged, changed)
    }

    /// Merge every layer into one snapshot.
    pub fn all_settings(&self, flags: &FlagSet) -> Table {
        let (flag_defaults, changed) = self.flag_tables(flags);
        [flag_defaults, self.defaults.clone(), self.env_table(), changed]
            .into_iter()
            .fold(Table::new(), merge_layer)
    }

    /// Every known key with the layer its value comes from, sorted by key.
    pub fn sources(&self, flags: &FlagSet) -> Vec<SettingEntry> {
        let merged = self.all_settings(flags);
        let keys: BTreeSet<&String> = self
            .env_bindings
            .keys()
            .chain(self.flag_bindings.keys())
            .chain(self.defaults.keys())
            .collect();

        keys.into_iter()
            .filter_map(|key| {
                let value = merged.get(key)?.clone();
                let flag = self.flag_bindings.get(key).and_then(|n| flags.lookup(n));
                let source = if flag.is_some_and(Flag::changed) {
                    Source::Flag
                } else if self.env_value(key).is_some() {
                    Source::Env
                } else if self.defaults.contains_key(key) {
                    Source::Default
                } else {
                    Source::FlagDefault
                };
                Some(SettingEntry {
                    key: key.clone(),
                    source,
                    value,
                })
            })
            .collect()
    }
}

/// Overlay `upper` onto `lower`. Tables merge key by key, anything else
/// replaces the lower value.
fn merge_layer(mut lower: Table, upper: Table) -> Table {
    for (key, value) in upper {
        let merged = match (lower.remove(&key), value) {
            (Some(Value::Table(below)), Value::Table(above)) => {
                Value::Table(merge_layer(below, above))
            }
            (_, value) => value,
        };
        lower.insert(key, merged);
    }
    lower
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}
