//! Configuration structs for the flagenv demo application.
//!
//! [`DemoConfig`] holds scalar keys, a map, a custom value, a nested
//! [`ServerConfig`] and an embedded [`DisplayConfig`].
//!
//! | Field                   | Flag                  | Env var           |
//! |-------------------------|-----------------------|-------------------|
//! | `name`                  | `--name`, `-n`        | `DEMO_NAME`       |
//! | `verbose`               | `--verbose`, `-v`     | `VERBOSE`         |
//! | `timeout`               | `--timeout`           | `TIMEOUT`         |
//! | `tags`                  | `--tags`              | `TAGS`            |
//! | `labels`                | `--label`             | `LABELS`          |
//! | `log_level`             | `--log-level`         | `LOG_LEVEL`       |
//! | `server.host`           | `--server-host`       | `SERVER_HOST`     |
//! | `server.port`           | `--server-port`       | `SERVER_PORT`     |
//! | `server.max_connections`| `--server-max-connections` | `MAX_CONNECTIONS` |
//! | `display.color`         | `--color`             | `COLOR`           |
//!
//! `server.max_connections` has no explicit env name, so it shows the
//! unprefixed environment name of nested structs.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use flagenv::{Configure, Field, FlagValue, FlagenvError};

/// Root configuration for the demo application.
#[derive(Debug)]
pub struct DemoConfig {
    pub name: String,
    pub verbose: bool,
    pub timeout: Duration,
    pub tags: Vec<String>,
    pub labels: HashMap<String, String>,
    pub log_level: LogLevel,
    pub server: ServerConfig,
    pub display: DisplayConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            name: "flagenv-demo".into(),
            verbose: false,
            timeout: Duration::from_secs(30),
            tags: Vec::new(),
            labels: HashMap::new(),
            log_level: LogLevel::Info,
            server: ServerConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Configure for DemoConfig {
    fn fields(&mut self) -> Vec<Field<'_>> {
        vec![
            Field::new("Name", &mut self.name)
                .tags(r#"env:"DEMO_NAME" flag:"name,n" desc:"Application name shown in the banner""#),
            Field::new("Verbose", &mut self.verbose)
                .short('v')
                .desc("Enable verbose output"),
            Field::new("Timeout", &mut self.timeout).desc("Request timeout"),
            Field::new("Tags", &mut self.tags).desc("Free-form tags"),
            Field::new("Labels", &mut self.labels)
                .flag("label")
                .desc("key=value labels, repeatable"),
            Field::value("LogLevel", &mut self.log_level).desc("Log level"),
            Field::nested("Server", &mut self.server),
            Field::embedded("Display", &mut self.display),
        ]
    }
}

/// Server-related configuration.
#[derive(Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            max_connections: 100,
        }
    }
}

impl Configure for ServerConfig {
    fn fields(&mut self) -> Vec<Field<'_>> {
        vec![
            Field::new("Host", &mut self.host)
                .env("SERVER_HOST")
                .desc("Hostname to bind to"),
            Field::new("Port", &mut self.port)
                .env("SERVER_PORT")
                .desc("Port number"),
            Field::new("MaxConnections", &mut self.max_connections)
                .desc("Maximum number of allowed connections"),
        ]
    }
}

/// Display settings, flattened into the root namespace.
#[derive(Debug)]
pub struct DisplayConfig {
    /// Supported values: red, green, yellow.
    pub color: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color: "yellow".into(),
        }
    }
}

impl Configure for DisplayConfig {
    fn fields(&mut self) -> Vec<Field<'_>> {
        vec![Field::new("Color", &mut self.color).desc("Terminal color for output: red, green or yellow")]
    }
}

/// A custom flag value: parsed by `set`, printed by `Display`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
        })
    }
}

impl FlagValue for LogLevel {
    fn set(&mut self, raw: &str) -> Result<(), FlagenvError> {
        *self = match raw.to_ascii_lowercase().as_str() {
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" => LogLevel::Warn,
            _ => {
                return Err(FlagenvError::InvalidValue {
                    value: raw.to_string(),
                    type_name: "level",
                    reason: "expected debug, info or warn".into(),
                });
            }
        };
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        "level"
    }
}
