#[cfg(test)]
pub mod test {
    use std::collections::HashMap;
    use std::fmt;
    use std::time::Duration;

    use crate::error::FlagenvError;
    use crate::field::{Configure, Field};
    use crate::value::FlagValue;

    /// A caller-defined flag value.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub enum Level {
        Debug,
        #[default]
        Info,
        Warn,
        Error,
    }

    impl fmt::Display for Level {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(match self {
                Level::Debug => "debug",
                Level::Info => "info",
                Level::Warn => "warn",
                Level::Error => "error",
            })
        }
    }

    impl FlagValue for Level {
        fn set(&mut self, raw: &str) -> Result<(), FlagenvError> {
            *self = match raw {
                "debug" => Level::Debug,
                "info" => Level::Info,
                "warn" => Level::Warn,
                "error" => Level::Error,
                _ => return Err(FlagenvError::invalid_value(raw, "level", "unknown level")),
            };
            Ok(())
        }

        fn type_name(&self) -> &'static str {
            "level"
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct TestConfig {
        pub host: String,
        pub port: u16,
        pub debug: bool,
        pub ratio: f64,
        pub timeout: Duration,
        pub tags: Vec<String>,
        pub labels: HashMap<String, String>,
        pub limits: HashMap<String, i64>,
        pub level: Level,
        pub server: ServerConfig,
        pub common: CommonConfig,
    }

    impl Default for TestConfig {
        fn default() -> Self {
            Self {
                host: "localhost".into(),
                port: 8080,
                debug: false,
                ratio: 0.5,
                timeout: Duration::from_secs(30),
                tags: vec!["base".into()],
                labels: HashMap::from([("tier".to_string(), "web".to_string())]),
                limits: HashMap::new(),
                level: Level::Info,
                server: ServerConfig::default(),
                common: CommonConfig::default(),
            }
        }
    }

    impl Configure for TestConfig {
        fn fields(&mut self) -> Vec<Field<'_>> {
            vec![
                Field::new("Host", &mut self.host).desc("Address to bind"),
                Field::new("Port", &mut self.port)
                    .tags(r#"flag:"port,p" desc:"Port to listen on""#),
                Field::new("Debug", &mut self.debug).short('d'),
                Field::new("Ratio", &mut self.ratio),
                Field::new("Timeout", &mut self.timeout),
                Field::new("Tags", &mut self.tags),
                Field::new("Labels", &mut self.labels).flag("label"),
                Field::new("Limits", &mut self.limits),
                Field::value("Level", &mut self.level),
                Field::nested("Server", &mut self.server),
                Field::embedded("Common", &mut self.common),
            ]
        }
    }

    /// Nested struct with explicit env names, since the env namespace is
    /// not prefixed.
    #[derive(Debug, Clone, PartialEq)]
    pub struct ServerConfig {
        pub host: String,
        pub port: u16,
    }

    impl Default for ServerConfig {
        fn default() -> Self {
            Self {
                host: "127.0.0.1".into(),
                port: 9000,
            }
        }
    }

    impl Configure for ServerConfig {
        fn fields(&mut self) -> Vec<Field<'_>> {
            vec![
                Field::new("Host", &mut self.host).env("SERVER_HOST"),
                Field::new("Port", &mut self.port).env("SERVER_PORT"),
            ]
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct CommonConfig {
        pub region: String,
    }

    impl Default for CommonConfig {
        fn default() -> Self {
            Self {
                region: "us".into(),
            }
        }
    }

    impl Configure for CommonConfig {
        fn fields(&mut self) -> Vec<Field<'_>> {
            vec![Field::new("Region", &mut self.region)]
        }
    }

    /// Root with a plain nested struct and no explicit names.
    #[derive(Debug, Default, PartialEq)]
    pub struct PlainRoot {
        pub server: PlainServer,
    }

    #[derive(Debug, Default, PartialEq)]
    pub struct PlainServer {
        pub port: u16,
    }

    impl Configure for PlainRoot {
        fn fields(&mut self) -> Vec<Field<'_>> {
            vec![Field::nested("Server", &mut self.server)]
        }
    }

    impl Configure for PlainServer {
        fn fields(&mut self) -> Vec<Field<'_>> {
            vec![Field::new("Port", &mut self.port)]
        }
    }

    /// A map with non-string keys between two supported fields.
    #[derive(Debug, Default)]
    pub struct UnsupportedConfig {
        pub name: String,
        pub weights: HashMap<i32, String>,
        pub after: String,
    }

    impl Configure for UnsupportedConfig {
        fn fields(&mut self) -> Vec<Field<'_>> {
            vec![
                Field::new("Name", &mut self.name),
                Field::new("Weights", &mut self.weights),
                Field::new("After", &mut self.after),
            ]
        }
    }

    #[test]
    fn test_config_describes_every_field() {
        let mut cfg = TestConfig::default();
        let kinds: Vec<&str> = cfg.fields().iter().map(|f| f.slot().kind_name()).collect();
        assert_eq!(
            kinds,
            vec![
                "string",
                "uint16",
                "bool",
                "float64",
                "duration",
                "stringSlice",
                "stringToString",
                "stringToInt64",
                "level",
                "struct",
                "embedded struct",
            ]
        );
    }
}
