//! Source attribution for bound flags.
//!
//! After a run, every leaf flag is recorded with the source that supplied
//! its final value, following the precedence order:
//!
//! 1. **CLI arguments** - `--port 8080`
//! 2. **Environment variables** - `PORT=8080`
//! 3. **Config files** - `config.json`
//! 4. **Defaults** - `#[flag(default = "...")]` or the struct's initial value

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

/// Indicates where a flag's final value came from.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Source {
    /// Given on the command line.
    Cli,

    /// Read from the flag's environment variable.
    Environment,

    /// Changed by the loaded configuration file.
    ConfigFile(Option<PathBuf>),

    /// The declared default or the value the struct started with.
    Default,
}

impl Display for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI argument"),

            Self::Environment => write!(f, "Environment variable"),

            Self::ConfigFile(Some(path)) => write!(f, "Config file ({})", path.display()),

            Self::ConfigFile(None) => write!(f, "Config file"),

            Self::Default => write!(f, "Default value"),
        }
    }
}

/// Source of one flag, with the env variable consulted for it.
#[derive(Clone, Debug)]
pub struct ValueSource {
    /// Env variable bound to the flag, if any.
    pub env_name: Option<String>,

    /// Where the value originated from.
    pub source: Source,
}

impl ValueSource {
    /// Creates a new `ValueSource`.
    pub fn new(env_name: Option<impl Into<String>>, source: Source) -> Self {
        Self {
            env_name: env_name.map(Into::into),
            source,
        }
    }
}

impl Display for ValueSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.env_name {
            Some(name) => write!(f, "{}: {name}", self.source),
            None => write!(f, "{}", self.source),
        }
    }
}

/// Source attribution for every flag of a run, keyed by flag path.
///
/// # Display Output
///
/// ```text
/// Configuration Source:
/// --------------------------------------------------
///   version    <- Environment variable [VERSION]
///   tls.enable <- Config file (/etc/config.json) [TLS_ENABLE]
///   token      <- Default value
/// ```
#[derive(Clone, Debug, Default)]
pub struct ConfigSources {
    entries: Vec<(String, ValueSource)>,
}

impl ConfigSources {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Records the source of a flag.
    pub fn add(&mut self, path: impl Into<String>, source: ValueSource) {
        self.entries.push((path.into(), source));
    }

    /// All entries in schema order.
    #[must_use]
    pub fn entries(&self) -> &[(String, ValueSource)] {
        &self.entries
    }

    /// Looks up a flag by its dotted path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&ValueSource> {
        self.entries
            .iter()
            .find(|(name, _)| name == path)
            .map(|(_, source)| source)
    }

    /// Iterates over flag paths and their sources.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValueSource)> {
        self.entries
            .iter()
            .map(|(name, source)| (name.as_str(), source))
    }
}

impl Display for ConfigSources {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Configuration Source:")?;
        writeln!(f, "{}", "-".repeat(50))?;

        let max_len = self
            .entries
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0);

        for (path, source) in &self.entries {
            write!(f, "  {path:<max_len$} <- {}", source.source)?;

            match &source.env_name {
                Some(name) => writeln!(f, " [{name}]")?,
                None => writeln!(f)?,
            }
        }

        Ok(())
    }
}
