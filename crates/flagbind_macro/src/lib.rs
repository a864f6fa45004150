//! # flagbind_macro
//!
//! Procedural macro implementation for the `flagbind` crate.
//!
//! This crate provides `#[derive(Schema)]`, which turns a struct into a
//! field walker: every bound field is handed to a `flagbind::FieldVisitor`
//! together with its static metadata and a typed mutable handle.
//!
//! **Note:** Users should depend on the `flagbind` crate, not this one
//! directly. `flagbind` re-exports this macro along with the runtime types.
//!
//! # Module Structure
//!
//! - `parse` - Attribute parsing for `#[flag(...)]`
//! - `field` - Field type classification and slot generation
//! - `expand` - Macro expansion orchestration

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod expand;
mod field;
mod parse;

/// Derive macro binding a struct's fields to flags, env vars and config files.
///
/// # Field Attributes
///
/// All options are optional:
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `name = "x"` | Flag name instead of the kebab-cased identifier; `"-"` skips |
/// | `short = 'x'` | Single-character shorthand |
/// | `help = "..."` | Help text; falls back to the doc comment |
/// | `env = "X"` | Environment variable name; `"-"` disables the lookup |
/// | `default = "..."` | Textual default |
/// | `skip` | Do not bind the field |
/// | `flatten` | Nested struct without its own path segment |
///
/// Only `pub` fields are bound. Private fields are ignored.
///
/// # Example
///
/// ```ignore
/// use flagbind::Schema;
///
/// #[derive(Default, Schema)]
/// struct Config {
///     /// Release version.
///     pub version: String,
///
///     #[flag(short = 'p', default = "8080", env = "LISTEN_PORT")]
///     pub port: u32,
///
///     #[flag(flatten)]
///     pub log: LogConfig,
///
///     pub tls: Option<TlsConfig>,
///
///     #[flag(skip)]
///     pub cache: Vec<u8>,
/// }
/// ```
#[proc_macro_derive(Schema, attributes(flag))]
pub fn derive_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand::Expander::expand(input).unwrap_or_else(|err| err.to_compile_error().into())
}
