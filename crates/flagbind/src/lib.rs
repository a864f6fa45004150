//! # flagbind
//!
//! Derive command-line flags, environment-variable fallbacks and layered
//! configuration files from one struct.
//!
//! A struct deriving [`Schema`] is the single source of truth: every visible
//! field becomes a [`clap`] argument named after its dotted path, gets an
//! environment variable derived from the same path and can be filled from a
//! JSON or TOML configuration file. Values are resolved in this order:
//!
//! 1. **Command line** - `--tls.ca-cert /etc/ca.pem`
//! 2. **Environment** - `TLS_CA_CERT=/etc/ca.pem`
//! 3. **Config file** - the last readable candidate of [`ConfigFiles`]
//! 4. **Default** - `#[flag(default = "...")]` or the struct's initial value
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use flagbind::{Cli, ConfigFiles, Json, Schema};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Default, Schema, Serialize, Deserialize)]
//! #[serde(default, rename_all = "kebab-case")]
//! struct Config {
//!     /// Release version.
//!     pub version: String,
//!
//!     /// Data directory.
//!     pub data_root: Option<String>,
//!
//!     #[flag(short = 'p', default = "8080", help = "listen port")]
//!     pub port: u32,
//!
//!     pub tls: Option<Tls>,
//! }
//!
//! #[derive(Default, Schema, Serialize, Deserialize)]
//! #[serde(default, rename_all = "kebab-case")]
//! struct Tls {
//!     pub enable: bool,
//!     pub ca_cert: String,
//! }
//!
//! fn main() -> flagbind::Result<()> {
//!     let mut config = Config::default();
//!
//!     Cli::new(clap::Command::new("server"))
//!         .config_files(ConfigFiles::new(["./config.json", "/etc/config.json"]), Json)
//!         .run(&mut config, |config, _| {
//!             println!("serving {} on {}", config.version, config.port);
//!             Ok(())
//!         })?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Field Attributes
//!
//! | Attribute | Description |
//! |-----------|-------------|
//! | `name = "x"` | Flag name instead of the case-converted identifier; `"-"` skips the field |
//! | `short = 'x'` | Single-character shorthand |
//! | `help = "..."` | Help text; the doc comment is used otherwise |
//! | `env = "X"` | Environment variable name; `"-"` disables the lookup |
//! | `default = "..."` | Textual default, parsed like a command-line value |
//! | `skip` | Do not bind the field |
//! | `flatten` | Nested struct whose flags take no path segment |
//!
//! Only `pub` fields are bound.
//!
//! ## Supported Types
//!
//! `String`, `bool`, `i32`, `i64`, `u32`, `u64`, `f64`,
//! [`Duration`](std::time::Duration), [`IpAddr`](std::net::IpAddr),
//! `Vec<String>`, `Vec<i32>`, `Vec<IpAddr>`, `HashMap<String, String>`,
//! nested structs deriving [`Schema`], and `Option`/`Box` around any of them.
//!
//! ## Feature Flags
//!
//! | Feature | Description | Default |
//! |---------|-------------|---------|
//! | `json` | [`Json`] decoder and `duration::text` | **Yes** |
//! | `toml` | [`Toml`] decoder (implies `json`) | No |
//! | `full` | All formats | No |

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

extern crate self as flagbind;

// Re-export the derive macro
pub use flagbind_macro::Schema;

/// Re-export clap, whose `Command` and `ArgMatches` appear in the API.
pub use clap;

/// Re-export miette for error reporting.
pub use miette;

// ============================================================================
// Core Modules
// ============================================================================

mod error;
pub use error::{BoxError, Error, Origin};

/// A Result type that displays errors with miette's fancy formatting.
///
/// ```rust,ignore
/// fn main() -> flagbind::Result<()> {
///     Cli::new(command).run(&mut config, |_, _| Ok(()))?;
///     Ok(())
/// }
/// ```
pub type Result<T> = miette::Result<T>;

pub mod duration;
pub mod names;

mod schema;
pub use schema::{EnvName, FieldSpec, FieldVisitor};

// The trait shares its name with the derive macro, which lives in the macro
// namespace.
pub use schema::Schema;

mod slot;
pub use slot::{Bindable, Kind, Leaf, Slot, Unsupported};

pub mod binding;
pub use binding::{FieldBinding, Scope, TemplateFn, TemplateKind};

pub mod env;
pub use env::{Environment, ProcessEnv};

mod source;
pub use source::{ConfigSources, Source, ValueSource};

// ============================================================================
// Configuration Files
// ============================================================================

pub mod config;
pub use config::{ConfigFiles, FileReader, OsFiles, Unmarshal};

#[cfg(feature = "json")]
mod format;
#[cfg(feature = "json")]
pub use format::Json;
#[cfg(feature = "toml")]
pub use format::Toml;

// ============================================================================
// Command Runner
// ============================================================================

mod cli;
pub use cli::{Cli, Hook, Outcome};
