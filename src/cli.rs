//! Clap adapter for the flag registry.
//!
//! This module is the integration layer between the framework-agnostic
//! [`FlagSet`] and [clap](https://docs.rs/clap). It is compiled only when the
//! `clap` Cargo feature is enabled (on by default).
//!
//! [`FlagSet::command`] turns every registered flag into a clap [`Arg`] on
//! top of a caller-supplied base [`Command`], so the application keeps its
//! own arguments and subcommands. [`FlagSet::parse_from`] runs clap and
//! replays every command-line occurrence into [`FlagSet::set`], in order.
//! Only occurrences typed on the command line count as "changed"; defaults
//! are resolved later by the settings store, never by clap.

use std::ffi::OsString;

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::trace;

use crate::error::FlagenvError;
use crate::flags::{Flag, FlagSet};

const HELP: &str = "help";
const HELP_ID: &str = "flagenv-help";

fn arg_for(flag: &Flag) -> Arg {
    let mut arg = Arg::new(flag.name().to_string())
        .long(flag.name().to_string())
        .help(flag.usage().to_string())
        .value_name(flag.value().type_name())
        .value_parser(clap::value_parser!(String))
        .action(ArgAction::Append);

    if let Some(short) = flag.shorthand() {
        arg = arg.short(short);
    }

    if flag.value().is_bool_flag() {
        arg.num_args(0..=1)
            .require_equals(true)
            .default_missing_value("true")
    } else {
        arg.num_args(1)
    }
}

impl FlagSet {
    /// Add one argument per registered flag to `base`.
    ///
    /// `base` must not already define arguments with the same ids. A flag
    /// named `help` or with shorthand `h` takes that spelling over from
    /// clap's help flag, which keeps whichever of `--help` and `-h` is still
    /// free. `version` and `-V` are handled the same way, without a
    /// replacement.
    pub fn command(&self, mut base: Command) -> Command {
        let help_long = self.lookup(HELP).is_some();
        let help_short = self.lookup_short('h').is_some();
        if help_long || help_short {
            base = base.disable_help_flag(true);
            if !(help_long && help_short) {
                let mut help = Arg::new(HELP_ID)
                    .help("Print help")
                    .action(ArgAction::Help);
                if !help_long {
                    help = help.long(HELP);
                }
                if !help_short {
                    help = help.short('h');
                }
                base = base.arg(help);
            }
        }
        if self.lookup("version").is_some() || self.lookup_short('V').is_some() {
            base = base.disable_version_flag(true);
        }
        self.iter().fold(base, |cmd, flag| cmd.arg(arg_for(flag)))
    }

    /// Parse `args` (including the binary name) and apply every flag
    /// occurrence. The matches are returned for the caller's own arguments.
    pub fn parse_from<I, T>(&mut self, base: Command, args: I) -> Result<ArgMatches, FlagenvError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self.command(base).try_get_matches_from(args)?;
        self.apply_matches(&matches)?;
        Ok(matches)
    }

    /// Replay command-line occurrences from already-parsed matches.
    pub fn apply_matches(&mut self, matches: &ArgMatches) -> Result<(), FlagenvError> {
        let names: Vec<String> = self.iter().map(|f| f.name().to_string()).collect();
        for name in names {
            if matches.value_source(&name) != Some(ValueSource::CommandLine) {
                continue;
            }
            let Some(values) = matches.get_many::<String>(&name) else {
                continue;
            };
            for raw in values {
                trace!(flag = %name, value = %raw, "applying flag occurrence");
                self.set(&name, raw)?;
            }
        }
        Ok(())
    }
}
