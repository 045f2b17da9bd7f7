use std::num::ParseIntError;

use thiserror::Error;

#[derive(Debug, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum FlagenvError {
    #[error("unsupported type {type_name} for field '{field}'")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(flagenv::unsupported_type)))]
    UnsupportedType {
        field: String,
        type_name: &'static str,
    },

    #[error("invalid shorthand '{shorthand}' for flag '{flag}' (must be a single character)")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(flagenv::invalid_shorthand)))]
    InvalidShorthand { flag: String, shorthand: String },

    #[error("cannot decode {found} into {expected} for '{key}'")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(flagenv::unexpected_shape)))]
    UnexpectedShape {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("unsupported map type {found}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(flagenv::unsupported_map)))]
    UnsupportedMapShape { found: &'static str },

    #[error("malformed record \"{record}\": {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(flagenv::format)))]
    MalformedRecord { record: String, reason: &'static str },

    #[error("invalid key=value format in \"{0}\"")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(flagenv::format)))]
    InvalidPair(String),

    #[error("invalid int in \"{value}\": {source}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(flagenv::format)))]
    InvalidInt {
        value: String,
        source: ParseIntError,
    },

    #[error("invalid value \"{value}\" for {type_name}: {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(flagenv::format)))]
    InvalidValue {
        value: String,
        type_name: &'static str,
        reason: String,
    },

    #[error("invalid argument \"{value}\" for \"--{flag}\" flag: {source}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(flagenv::invalid_flag_value)))]
    InvalidFlagValue {
        flag: String,
        value: String,
        source: Box<FlagenvError>,
    },

    #[error("flag redefined: {0}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(flagenv::duplicate_flag)))]
    DuplicateFlag(String),

    #[error("unknown flag: --{0}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(flagenv::unknown_flag)))]
    UnknownFlag(String),

    #[error("failed to bind env {name}: {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(flagenv::env_binding)))]
    EnvBinding { name: String, reason: String },

    #[error("failed to setup struct {field}: {source}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(flagenv::nested)))]
    Nested {
        field: String,
        source: Box<FlagenvError>,
    },

    #[cfg(feature = "clap")]
    #[error(transparent)]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(flagenv::cli)))]
    Cli(#[from] clap::Error),
}

impl FlagenvError {
    pub(crate) fn invalid_value(
        value: &str,
        type_name: &'static str,
        reason: impl ToString,
    ) -> Self {
        FlagenvError::InvalidValue {
            value: value.to_string(),
            type_name,
            reason: reason.to_string(),
        }
    }

    /// Unsupported field kinds and wrong input shapes.
    pub fn is_type_error(&self) -> bool {
        match self {
            FlagenvError::UnsupportedType { .. }
            | FlagenvError::InvalidShorthand { .. }
            | FlagenvError::UnexpectedShape { .. }
            | FlagenvError::UnsupportedMapShape { .. } => true,
            FlagenvError::Nested { source, .. } => source.is_type_error(),
            _ => false,
        }
    }

    /// Malformed records, malformed `key=value` tokens and unparsable values.
    pub fn is_format_error(&self) -> bool {
        match self {
            FlagenvError::MalformedRecord { .. }
            | FlagenvError::InvalidPair(_)
            | FlagenvError::InvalidInt { .. }
            | FlagenvError::InvalidValue { .. } => true,
            FlagenvError::InvalidFlagValue { source, .. } | FlagenvError::Nested { source, .. } => {
                source.is_format_error()
            }
            _ => false,
        }
    }
}
