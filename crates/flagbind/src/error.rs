//! Error types for binding, loading and resolving configuration.
//!
//! Every variant is fatal for the invocation that produced it: the command
//! body never runs once any of these is returned.
//!
//! | Variant | When It Occurs |
//! |---------|----------------|
//! | [`Error::UnsupportedType`] | A field's type has no flag representation |
//! | [`Error::UnsupportedElement`] | A `Vec` field has an unsupported element type |
//! | [`Error::UnsupportedMapValue`] | A map field is not `HashMap<String, String>` |
//! | [`Error::InvalidDefault`] | An integer-list default contains a non-integer |
//! | [`Error::InvalidValue`] | A command-line or environment value failed to parse |
//! | [`Error::Cli`] | Argument parsing failed (help requests excluded) |
//! | [`Error::ReadConfig`] | An explicitly requested config file is unreadable |
//! | [`Error::Decode`] / [`Error::Parse`] / [`Error::TypeMismatch`] | A config file failed to decode |
//! | [`Error::PreRun`] / [`Error::Command`] | A hook or the command body failed |

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};

use miette::{Diagnostic, NamedSource, SourceSpan};

/// Boxed error returned by unmarshallers, hooks and command bodies.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Where a rejected value came from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Origin {
    /// Typed on the command line.
    CommandLine,

    /// Read from the named environment variable.
    Environment(String),
}

impl Display for Origin {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::CommandLine => write!(f, "command line"),
            Self::Environment(name) => write!(f, "environment variable {name}"),
        }
    }
}

/// Errors produced by flagbind.
///
/// # Diagnostic Codes
///
/// | Code | Meaning |
/// |------|---------|
/// | `flagbind::unsupported_type` | Field type cannot be bound |
/// | `flagbind::unsupported_element` | `Vec` element type cannot be bound |
/// | `flagbind::unsupported_map_value` | Map type cannot be bound |
/// | `flagbind::invalid_default` | Textual default is malformed |
/// | `flagbind::invalid_value` | CLI or env value is malformed |
/// | `flagbind::cli` | Argument parsing failed |
/// | `flagbind::config::read_error` | Explicit config file unreadable |
/// | `flagbind::config::decode_error` | Config file failed to decode |
/// | `flagbind::config::parse_error` | Config file has a syntax error |
/// | `flagbind::config::type_mismatch` | Config value has the wrong type |
#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum Error {
    /// A field type has no flag representation.
    #[error("unsupported field type `{ty}` for field `{field}`")]
    #[diagnostic(
        code(flagbind::unsupported_type),
        help(
            "supported types are String, bool, i32, i64, u32, u64, f64, Duration, IpAddr, \
             Vec<String>, Vec<i32>, Vec<IpAddr>, HashMap<String, String> and nested schemas"
        )
    )]
    UnsupportedType {
        /// Field identifier.
        field: String,

        /// Declared field type.
        ty: String,
    },

    /// A `Vec` field whose element type is not supported.
    #[error("unsupported slice element type in `{ty}` for field `{field}`")]
    #[diagnostic(
        code(flagbind::unsupported_element),
        help("list fields must be Vec<String>, Vec<i32> or Vec<IpAddr>")
    )]
    UnsupportedElement {
        /// Field identifier.
        field: String,

        /// Declared field type.
        ty: String,
    },

    /// A map field other than `HashMap<String, String>`.
    #[error("unsupported map type `{ty}` for field `{field}`")]
    #[diagnostic(
        code(flagbind::unsupported_map_value),
        help("map fields must be HashMap<String, String>")
    )]
    UnsupportedMapValue {
        /// Field identifier.
        field: String,

        /// Declared field type.
        ty: String,
    },

    /// An integer-list default with a non-integer element.
    #[error("invalid default {value:?} for flag --{flag}")]
    #[diagnostic(
        code(flagbind::invalid_default),
        help("integer list defaults must be comma-separated integers")
    )]
    InvalidDefault {
        /// Flag path.
        flag: String,

        /// The offending default text.
        value: String,

        /// Parse failure of the first bad element.
        #[source]
        source: std::num::ParseIntError,
    },

    /// A command-line or environment value was rejected by the flag's setter.
    #[error("invalid value {value:?} for flag --{flag} from {origin}: expected {expected} ({reason})")]
    #[diagnostic(
        code(flagbind::invalid_value),
        help("command-line and environment values must parse as the flag's type")
    )]
    InvalidValue {
        /// Flag path.
        flag: String,

        /// Where the value came from.
        origin: Origin,

        /// The rejected text.
        value: String,

        /// Human-readable kind, e.g. `integer`.
        expected: &'static str,

        /// Parser message.
        reason: String,
    },

    /// Argument parsing failed for a reason other than a help request.
    #[error("{message}")]
    #[diagnostic(code(flagbind::cli), help("run with --help for usage"))]
    Cli {
        /// Rendered parse error.
        message: String,
    },

    /// An explicitly requested configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    #[diagnostic(
        code(flagbind::config::read_error),
        help("the file was requested explicitly; check the path and its permissions")
    )]
    ReadConfig {
        /// Requested path.
        path: String,

        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The unmarshaller rejected a configuration file.
    #[error("failed to decode configuration file: {path}")]
    #[diagnostic(code(flagbind::config::decode_error))]
    Decode {
        /// File that failed to decode.
        path: String,

        /// Decoder error.
        #[source]
        source: BoxError,
    },

    /// Syntax error in a configuration file, with its location.
    #[error("{format} parse error in {path}")]
    #[diagnostic(code(flagbind::config::parse_error))]
    Parse {
        /// Format name (JSON, TOML).
        format: &'static str,

        /// File path.
        path: String,

        /// File content for the snippet.
        #[source_code]
        src: NamedSource<String>,

        /// Location of the error.
        #[label("{message}")]
        span: SourceSpan,

        /// What went wrong.
        message: String,

        /// How to fix it.
        #[help]
        help: String,
    },

    /// A configuration value does not fit the target field.
    #[error("type mismatch at `{key}` in {path}: {message}")]
    #[diagnostic(
        code(flagbind::config::type_mismatch),
        help("check that the value matches the field type")
    )]
    TypeMismatch {
        /// Dotted key inside the file.
        key: String,

        /// File path.
        path: String,

        /// Deserializer message.
        message: String,
    },

    /// A pre-run hook returned an error.
    #[error("pre-run hook failed")]
    #[diagnostic(code(flagbind::pre_run))]
    PreRun {
        /// Hook error.
        #[source]
        source: BoxError,
    },

    /// The command body returned an error.
    #[error("command failed")]
    #[diagnostic(code(flagbind::command))]
    Command {
        /// Body error.
        #[source]
        source: BoxError,
    },
}

impl Error {
    pub(crate) fn invalid_value(
        flag: &str,
        origin: &Origin,
        value: &str,
        expected: &'static str,
        reason: impl Display,
    ) -> Self {
        Self::InvalidValue {
            flag: flag.to_string(),
            origin: origin.clone(),
            value: value.to_string(),
            expected,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn cli(err: &clap::Error) -> Self {
        Self::Cli {
            message: err.to_string().trim_end().to_string(),
        }
    }

    /// Returns `true` for schema errors, which are raised before any flag
    /// is registered.
    #[must_use]
    pub const fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedType { .. }
                | Self::UnsupportedElement { .. }
                | Self::UnsupportedMapValue { .. }
                | Self::InvalidDefault { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_display() {
        assert_eq!(Origin::CommandLine.to_string(), "command line");
        assert_eq!(
            Origin::Environment("PORT".into()).to_string(),
            "environment variable PORT"
        );
    }

    #[test]
    fn test_invalid_value_message() {
        let err = Error::invalid_value(
            "port",
            &Origin::Environment("PORT".into()),
            "abc",
            "integer",
            "invalid digit found in string",
        );

        assert_eq!(
            err.to_string(),
            "invalid value \"abc\" for flag --port from environment variable PORT: \
             expected integer (invalid digit found in string)"
        );
    }

    #[test]
    fn test_unsupported_type_is_schema_error() {
        let err = Error::UnsupportedType {
            field: "ratio".into(),
            ty: "f32".into(),
        };

        assert!(err.is_schema_error());
        assert_eq!(
            err.to_string(),
            "unsupported field type `f32` for field `ratio`"
        );
    }

    #[test]
    fn test_diagnostic_code() {
        let err = Error::Cli {
            message: "error: unexpected argument".into(),
        };

        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("flagbind::cli"));
        assert!(!err.is_schema_error());
    }
}
