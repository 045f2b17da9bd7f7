#[cfg(feature = "clap")]
use std::ffi::OsString;

#[cfg(feature = "clap")]
use clap::{ArgMatches, Command};
use tracing::debug;

use crate::binder;
use crate::decode;
use crate::error::FlagenvError;
use crate::field::Configure;
use crate::flags::FlagSet;
use crate::settings::Settings;
use crate::types::SettingEntry;

/// Entry point for binding and loading a configuration struct.
pub struct Flagenv;

impl Flagenv {
    pub fn builder() -> FlagenvBuilder {
        FlagenvBuilder::new()
    }
}

/// Builder for the setup → parse → snapshot → decode pipeline.
///
/// Environment and arguments default to the process ones; both can be
/// replaced with synthetic data, which is how the tests drive it.
pub struct FlagenvBuilder {
    #[cfg(feature = "clap")]
    name: Option<String>,
    #[cfg(feature = "clap")]
    about: Option<String>,
    #[cfg(feature = "clap")]
    args: Option<Vec<OsString>>,
    vars: Option<Vec<(String, String)>>,
    env_enabled: bool,
    allow_empty_env: bool,
    #[cfg(feature = "clap")]
    base: Option<Command>,
}

/// What [`FlagenvBuilder::load`] leaves behind besides the populated struct.
#[derive(Debug)]
pub struct Bindings {
    pub flags: FlagSet,
    pub settings: Settings,
    /// Matches for the caller's own arguments on the base command.
    #[cfg(feature = "clap")]
    pub matches: ArgMatches,
}

impl Bindings {
    /// Where every settings key got its value from.
    pub fn sources(&self) -> Vec<SettingEntry> {
        self.settings.sources(&self.flags)
    }
}

impl FlagenvBuilder {
    fn new() -> Self {
        Self {
            #[cfg(feature = "clap")]
            name: None,
            #[cfg(feature = "clap")]
            about: None,
            #[cfg(feature = "clap")]
            args: None,
            vars: None,
            env_enabled: true,
            allow_empty_env: true,
            #[cfg(feature = "clap")]
            base: None,
        }
    }

    /// Program name shown in usage (default: `"app"`).
    #[cfg(feature = "clap")]
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// One-line description shown in help.
    #[cfg(feature = "clap")]
    pub fn about(mut self, about: &str) -> Self {
        self.about = Some(about.to_string());
        self
    }

    /// Parse these arguments (including the program name) instead of the
    /// process arguments.
    #[cfg(feature = "clap")]
    pub fn args<I, T>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Read these variables instead of the process environment.
    pub fn vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.vars = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Ignore the environment entirely.
    pub fn no_env(mut self) -> Self {
        self.env_enabled = false;
        self
    }

    /// Whether a variable set to `""` counts as a value (default: `true`).
    pub fn allow_empty_env(mut self, allow: bool) -> Self {
        self.allow_empty_env = allow;
        self
    }

    /// Start from this clap command instead of an empty one, so the
    /// application's own arguments and subcommands parse alongside the flags.
    #[cfg(feature = "clap")]
    pub fn base_command(mut self, command: Command) -> Self {
        self.base = Some(command);
        self
    }

    fn settings(&self) -> Settings {
        let settings = match (&self.vars, self.env_enabled) {
            (_, false) => Settings::with_vars(Vec::new()),
            (Some(vars), true) => Settings::with_vars(vars.clone()),
            (None, true) => Settings::new(),
        };
        settings.allow_empty_env(self.allow_empty_env)
    }

    #[cfg(feature = "clap")]
    fn base(&self) -> Command {
        let mut command = self
            .base
            .clone()
            .unwrap_or_else(|| Command::new(self.name.clone().unwrap_or_else(|| "app".into())));
        if let Some(name) = &self.name {
            command = command.name(name.clone());
        }
        if let Some(about) = &self.about {
            command = command.about(about.clone());
        }
        command
    }

    /// The clap command with every flag of `config`, for help and usage.
    ///
    /// `config` is described but not modified.
    #[cfg(feature = "clap")]
    pub fn command(self, config: &mut dyn Configure) -> Result<Command, FlagenvError> {
        let mut flags = FlagSet::new();
        let mut settings = Settings::with_vars(Vec::new());
        binder::setup(&mut flags, &mut settings, config)?;
        Ok(flags.command(self.base()))
    }

    /// Bind `config`, parse arguments, and populate `config` from the merged
    /// flags, environment and its own initial values.
    pub fn load(self, config: &mut dyn Configure) -> Result<Bindings, FlagenvError> {
        let mut flags = FlagSet::new();
        let mut settings = self.settings();
        binder::setup(&mut flags, &mut settings, config)?;

        #[cfg(feature = "clap")]
        let matches = {
            let args = self
                .args
                .clone()
                .unwrap_or_else(|| std::env::args_os().collect());
            flags.parse_from(self.base(), args)?
        };

        let snapshot = settings.all_settings(&flags);
        debug!(flags = flags.len(), keys = snapshot.len(), "decoding settings");
        decode::decode(&snapshot, config)?;

        Ok(Bindings {
            flags,
            settings,
            #[cfg(feature = "clap")]
            matches,
        })
    }
}

#[cfg(all(test, feature = "clap"))]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::fixtures::test::{Level, PlainRoot, TestConfig, UnsupportedConfig};
    use crate::map::{Int64Map, StringMap};
    use crate::types::Source;
    use std::collections::HashMap;
    use std::time::Duration;

    fn load(args: &[&str], vars: &[(&str, &str)]) -> (TestConfig, Bindings) {
        let mut cfg = TestConfig::default();
        let bindings = Flagenv::builder()
            .name("test")
            .args(std::iter::once("test").chain(args.iter().copied()))
            .vars(vars.iter().copied())
            .load(&mut cfg)
            .unwrap();
        (cfg, bindings)
    }

    fn source_of(bindings: &Bindings, key: &str) -> Source {
        bindings
            .sources()
            .into_iter()
            .find(|e| e.key == key)
            .map(|e| e.source)
            .unwrap()
    }

    #[test]
    fn defaults_only() {
        let (cfg, bindings) = load(&[], &[]);
        assert_eq!(cfg, TestConfig::default());
        assert_eq!(source_of(&bindings, "port"), Source::Default);
    }

    #[test]
    fn env_overrides_default() {
        let (cfg, bindings) = load(&[], &[("PORT", "2")]);
        assert_eq!(cfg.port, 2);
        assert_eq!(source_of(&bindings, "port"), Source::Env);
    }

    #[test]
    fn flag_overrides_env() {
        let (cfg, bindings) = load(&["--port=1"], &[("PORT", "2")]);
        assert_eq!(cfg.port, 1);
        assert_eq!(source_of(&bindings, "port"), Source::Flag);
    }

    #[test]
    fn shorthand_flag() {
        let (cfg, _) = load(&["-p", "7", "-d"], &[]);
        assert_eq!(cfg.port, 7);
        assert!(cfg.debug);
    }

    #[test]
    fn nested_flag_is_prefixed() {
        let (cfg, _) = load(&["--server-port", "1", "--server-host=db"], &[]);
        assert_eq!(cfg.server.port, 1);
        assert_eq!(cfg.server.host, "db");
    }

    #[test]
    fn nested_env_uses_explicit_name() {
        let (cfg, _) = load(&[], &[("SERVER_PORT", "5")]);
        assert_eq!(cfg.server.port, 5);
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn plain_nested_env_is_unprefixed() {
        let mut cfg = PlainRoot::default();
        Flagenv::builder()
            .args(["test"])
            .vars([("PORT", "3")])
            .load(&mut cfg)
            .unwrap();
        assert_eq!(cfg.server.port, 3);

        let mut cfg = PlainRoot::default();
        Flagenv::builder()
            .args(["test", "--server-port", "4"])
            .vars([("PORT", "3")])
            .load(&mut cfg)
            .unwrap();
        assert_eq!(cfg.server.port, 4);
    }

    #[test]
    fn embedded_flag_joins_parent_namespace() {
        let (cfg, _) = load(&["--region", "eu"], &[]);
        assert_eq!(cfg.common.region, "eu");
    }

    #[test]
    fn repeated_map_flag_merges() {
        let (cfg, _) = load(&["--label", "a=1", "--label", "b=2"], &[]);
        assert_eq!(
            cfg.labels,
            HashMap::from([("a".to_string(), "1".to_string()), ("b".into(), "2".into())])
        );
    }

    #[test]
    fn map_from_env_record() {
        let (cfg, _) = load(&[], &[("LIMITS", "cpu=2,mem=512")]);
        assert_eq!(cfg.limits.len(), 2);
        assert_eq!(cfg.limits["cpu"], 2);
    }

    #[test]
    fn map_flag_overrides_env_map() {
        let (cfg, _) = load(&["--label", "x=1"], &[("LABELS", "y=2")]);
        assert_eq!(cfg.labels, HashMap::from([("x".to_string(), "1".to_string())]));
    }

    #[test]
    fn map_default_survives_when_unset() {
        let (cfg, _) = load(&[], &[]);
        assert_eq!(cfg.labels["tier"], "web");
    }

    #[test]
    fn slices_from_flag_and_env() {
        let (cfg, _) = load(&["--tags", "a,b", "--tags", "c"], &[]);
        assert_eq!(cfg.tags, ["a", "b", "c"]);

        let (cfg, _) = load(&[], &[("TAGS", "x,y")]);
        assert_eq!(cfg.tags, ["x", "y"]);
    }

    #[test]
    fn duration_and_custom_value_flags() {
        let (cfg, _) = load(&["--timeout", "2m", "--level", "warn"], &[]);
        assert_eq!(cfg.timeout, Duration::from_secs(120));
        assert_eq!(cfg.level, Level::Warn);

        let (cfg, _) = load(&[], &[("LEVEL", "error"), ("TIMEOUT", "250ms")]);
        assert_eq!(cfg.level, Level::Error);
        assert_eq!(cfg.timeout, Duration::from_millis(250));
    }

    #[test]
    fn bool_env_spellings() {
        let (cfg, _) = load(&[], &[("DEBUG", "T")]);
        assert!(cfg.debug);
    }

    #[test]
    fn empty_env_counts_unless_disabled() {
        let (cfg, _) = load(&[], &[("HOST", "")]);
        assert_eq!(cfg.host, "");

        let mut cfg = TestConfig::default();
        Flagenv::builder()
            .args(["test"])
            .vars([("HOST", "")])
            .allow_empty_env(false)
            .load(&mut cfg)
            .unwrap();
        assert_eq!(cfg.host, "localhost");
    }

    #[test]
    fn no_env_ignores_vars() {
        let mut cfg = TestConfig::default();
        Flagenv::builder()
            .args(["test"])
            .vars([("PORT", "2")])
            .no_env()
            .load(&mut cfg)
            .unwrap();
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn invalid_env_value_is_format_error() {
        let mut cfg = TestConfig::default();
        let err = Flagenv::builder()
            .args(["test"])
            .vars([("PORT", "http")])
            .load(&mut cfg)
            .unwrap_err();
        assert!(err.is_format_error());
        assert!(err.to_string().contains("\"http\""));
    }

    #[test]
    fn unsupported_field_fails_setup() {
        let mut cfg = UnsupportedConfig::default();
        let err = Flagenv::builder()
            .args(["test"])
            .vars(Vec::<(String, String)>::new())
            .load(&mut cfg)
            .unwrap_err();
        assert!(err.is_type_error());
    }

    #[test]
    fn unknown_argument_is_cli_error() {
        let mut cfg = TestConfig::default();
        let err = Flagenv::builder()
            .args(["test", "--nope"])
            .vars(Vec::<(String, String)>::new())
            .load(&mut cfg)
            .unwrap_err();
        assert!(matches!(err, FlagenvError::Cli(_)));
    }

    #[test]
    fn base_command_arguments_come_back() {
        let mut cfg = TestConfig::default();
        let base = Command::new("test").arg(clap::Arg::new("input").required(true));
        let bindings = Flagenv::builder()
            .base_command(base)
            .args(["test", "--port", "3", "file.txt"])
            .vars(Vec::<(String, String)>::new())
            .load(&mut cfg)
            .unwrap();
        assert_eq!(
            bindings.matches.get_one::<String>("input").map(String::as_str),
            Some("file.txt")
        );
        assert_eq!(cfg.port, 3);
    }

    #[derive(Debug, Default)]
    struct MapFields {
        labels: StringMap,
        limits: Int64Map,
    }

    impl Configure for MapFields {
        fn fields(&mut self) -> Vec<Field<'_>> {
            vec![
                Field::value("Labels", &mut self.labels),
                Field::value("Limits", &mut self.limits),
            ]
        }
    }

    fn load_maps(args: &[&str], vars: &[(&str, &str)]) -> MapFields {
        let mut cfg = MapFields {
            labels: StringMap::new(HashMap::from([("tier".to_string(), "web".to_string())])),
            limits: Int64Map::default(),
        };
        Flagenv::builder()
            .args(std::iter::once("test").chain(args.iter().copied()))
            .vars(vars.iter().copied())
            .load(&mut cfg)
            .unwrap();
        cfg
    }

    #[test]
    fn map_value_fields_keep_defaults() {
        let cfg = load_maps(&[], &[]);
        assert_eq!(
            cfg.labels.into_inner(),
            HashMap::from([("tier".to_string(), "web".to_string())])
        );
        assert!(cfg.limits.get().is_empty());
    }

    #[test]
    fn map_value_fields_from_repeated_flag() {
        let cfg = load_maps(&["--labels", "a=1", "--labels", "b=2", "--limits", "n=3"], &[]);
        assert_eq!(
            cfg.labels.into_inner(),
            HashMap::from([("a".to_string(), "1".to_string()), ("b".into(), "2".into())])
        );
        assert_eq!(cfg.limits.get()["n"], 3);
    }

    #[test]
    fn map_value_fields_from_env() {
        let cfg = load_maps(&[], &[("LABELS", r#"a=1,"b=x,y""#), ("LIMITS", "n=4")]);
        assert_eq!(cfg.labels.get()["b"], "x,y");
        assert_eq!(cfg.limits.get()["n"], 4);
    }

    #[derive(Debug, Default)]
    struct HostConfig {
        host: String,
    }

    impl Configure for HostConfig {
        fn fields(&mut self) -> Vec<Field<'_>> {
            vec![Field::new("Host", &mut self.host).tags(r#"flag:"host,h""#)]
        }
    }

    #[test]
    fn shorthand_h_is_a_regular_flag() {
        let mut cfg = HostConfig::default();
        Flagenv::builder()
            .args(["test", "-h", "db"])
            .vars(Vec::<(String, String)>::new())
            .load(&mut cfg)
            .unwrap();
        assert_eq!(cfg.host, "db");

        let err = Flagenv::builder()
            .args(["test", "--help"])
            .vars(Vec::<(String, String)>::new())
            .load(&mut HostConfig::default())
            .unwrap_err();
        assert!(matches!(err, FlagenvError::Cli(ref e) if e.kind() == clap::error::ErrorKind::DisplayHelp));
    }

    #[test]
    fn command_renders_help() {
        let mut cfg = TestConfig::default();
        let help = Flagenv::builder()
            .name("demo")
            .about("Demo app")
            .command(&mut cfg)
            .unwrap()
            .render_help()
            .to_string();
        assert!(help.contains("Demo app"));
        assert!(help.contains("--server-port <uint16>"));
        assert!(help.contains("Port to listen on (environment PORT)"));
        assert_eq!(cfg, TestConfig::default());
    }
}
