use serde::Serialize;
use toml::Value;

/// The layer a snapshot value was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// A flag given on the command line.
    Flag,
    /// A bound environment variable.
    Env,
    /// An explicit default, normally the field's value before setup.
    Default,
    /// The value an unchanged flag was registered with.
    FlagDefault,
}

/// One key of the settings snapshot together with its origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingEntry {
    pub key: String,
    pub source: Source,
    pub value: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_serializes_with_snake_case_source() {
        let entry = SettingEntry {
            key: "port".into(),
            source: Source::FlagDefault,
            value: Value::Integer(8080),
        };
        let table = Value::try_from(&entry).unwrap();
        assert_eq!(table["key"].as_str(), Some("port"));
        assert_eq!(table["source"].as_str(), Some("flag_default"));
        assert_eq!(table["value"].as_integer(), Some(8080));
    }
}
