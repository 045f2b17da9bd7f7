//! Bind the fields of a configuration struct to command-line flags and
//! environment variables at the same time, then fill the struct from
//! whichever source provided a value.
//!
//! ```ignore
//! let mut config = AppConfig::default();
//! Flagenv::builder()
//!     .name("myapp")
//!     .load(&mut config)?;
//! ```
//!
//! That single call registers `--host`, `--port` and friends, binds `HOST`,
//! `PORT` and friends, parses the process arguments, and writes the winning
//! value of every field back into `config`.
//!
//! # Describing a struct
//!
//! A struct opts in by implementing [`Configure`], listing its fields in
//! declaration order. The kind of each field is resolved from its type when
//! it is described, so a `u16` becomes a `uint16` flag and a
//! `HashMap<String, i64>` becomes a `stringToInt64` flag without any further
//! annotation:
//!
//! ```ignore
//! impl Configure for AppConfig {
//!     fn fields(&mut self) -> Vec<Field<'_>> {
//!         vec![
//!             Field::new("Host", &mut self.host).desc("Address to bind"),
//!             Field::new("Port", &mut self.port).tags(r#"flag:"port,p""#),
//!             Field::new("Labels", &mut self.labels),
//!             Field::nested("Database", &mut self.database),
//!             Field::value("Level", &mut self.level),
//!         ]
//!     }
//! }
//! ```
//!
//! Supported field types: `String`, `bool`, every fixed-width integer,
//! `isize`/`usize`, `f64`, [`Duration`](std::time::Duration), `Vec<String>`,
//! `HashMap<String, String>`, `HashMap<String, i64>`, nested structs, and any
//! type implementing [`FlagValue`]. Anything else (a map with non-string keys,
//! a `Vec<u8>`) fails setup with a type error naming the field and its type.
//!
//! # Naming
//!
//! | Field | Environment | Flag |
//! |-------|-------------|------|
//! | `MaxRetryCount` | `MAX_RETRY_COUNT` | `--max-retry-count` |
//! | `OAuth2Token` | `O_AUTH_2_TOKEN` | `--o-auth-2-token` |
//! | `env:"DB_URL,DATABASE_URL"` | `DB_URL` | derived |
//! | `flag:"listen,l"` | derived | `--listen`, `-l` |
//!
//! The usage text of every flag ends in `(environment NAME)`.
//!
//! Nested structs prefix the flag name with their own (`Server.Port` is
//! `--server-port`) but **not** the environment name (`PORT`). Give nested
//! fields explicit `env` names when two of them would collide. Embedded
//! structs ([`Field::embedded`]) join the parent's namespace.
//!
//! # Precedence
//!
//! ```text
//! Flag's registered value    the field's value before setup
//!        ↑ overridden by
//! Explicit default           the same value, recorded per key
//!        ↑ overridden by
//! Environment variable       NAME, empty values count by default
//!        ↑ overridden by
//! Changed flag               given at least once on the command line
//! ```
//!
//! # Map values
//!
//! Map fields travel as one delimited record of `key=value` tokens, quoted
//! like CSV: `--label 'a=1,"b=x,y"'` or `LABELS=a=1,b=2`. Repeating a map
//! flag merges: `--label a=1 --label b=2` yields both keys. The [`codec`]
//! functions expose the encoding directly.
//!
//! # Working without the loader
//!
//! [`Flagenv`] is a thin pipeline over public pieces: [`setup`] registers
//! into a [`FlagSet`] and a [`Settings`] store, the clap adapter (the `cli`
//! module, behind the `clap` Cargo feature, on by default) feeds occurrences
//! into the flag set, [`Settings::all_settings`] produces the snapshot, and
//! [`decode`] writes it back. The decode [`hooks`] are public for callers
//! that build their own snapshot.
//!
//! # Error handling
//!
//! All fallible operations return [`FlagenvError`]. Use
//! [`is_type_error`](FlagenvError::is_type_error) and
//! [`is_format_error`](FlagenvError::is_format_error) to classify failures.
//! With the `rich-errors` feature every variant carries a miette diagnostic
//! code.

pub mod codec;
pub mod error;
pub mod hooks;
pub mod types;

mod binder;
mod builder;
#[cfg(feature = "clap")]
mod cli;
mod decode;
mod field;
mod flags;
mod map;
mod settings;
mod value;

#[cfg(test)]
mod fixtures;

pub use binder::setup;
pub use builder::{Bindings, Flagenv, FlagenvBuilder};
pub use decode::decode;
pub use error::FlagenvError;
pub use field::{
    derive_env_name, derive_flag_name, parse_tags, Configure, CustomValue, Field, FieldMeta,
    Names, Slot,
};
pub use flags::{Flag, FlagSet};
pub use map::{Int64Map, MapElement, MapValue, StringMap};
pub use settings::Settings;
pub use types::{SettingEntry, Source};
pub use value::{FlagValue, Scalar, ScalarValue, StringSliceValue};
