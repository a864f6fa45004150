//! Layered configuration file loading.
//!
//! [`ConfigFiles`] declares the candidate paths, the `--conf`/`-f` flag that
//! replaces them and an optional environment variable that does the same.
//! Candidates are tried from the last to the first; the first readable file
//! is decoded into the schema and the rest are ignored.
//!
//! ```text
//! --conf given        -> its values, explicit
//! else env override   -> comma-split value, explicit
//! else                -> declared paths, implicit
//! ```
//!
//! A read failure is fatal for an explicit list and skipped for an implicit
//! one. Decode failures are always fatal.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use clap::{Arg, ArgAction, value_parser};

use crate::env::Environment;
use crate::error::{BoxError, Error};

/// Reads configuration files.
pub trait FileReader {
    /// Returns the full content of `path`.
    ///
    /// # Errors
    ///
    /// Any I/O error, including a missing file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Reads from the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsFiles;

impl FileReader for OsFiles {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// In-memory files, keyed by path.
impl FileReader for HashMap<PathBuf, String> {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.get(path)
            .map(|content| content.clone().into_bytes())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }
}

/// Decodes file content into a schema value in place.
///
/// Fields absent from the file keep their current values.
pub trait Unmarshal<S: ?Sized> {
    /// Decodes `bytes`, read from `path`, into `target`.
    ///
    /// # Errors
    ///
    /// [`Error::Decode`], [`Error::Parse`] or [`Error::TypeMismatch`].
    fn unmarshal(&self, path: &Path, bytes: &[u8], target: &mut S) -> Result<(), Error>;
}

impl<S, F> Unmarshal<S> for F
where
    S: ?Sized,
    F: Fn(&[u8], &mut S) -> Result<(), BoxError>,
{
    fn unmarshal(&self, path: &Path, bytes: &[u8], target: &mut S) -> Result<(), Error> {
        self(bytes, target).map_err(|source| Error::Decode {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Candidate configuration files and their overrides.
#[derive(Clone, Debug)]
pub struct ConfigFiles {
    paths: Vec<PathBuf>,
    env: Option<String>,
    long: String,
    short: Option<char>,
}

impl ConfigFiles {
    /// Candidates in increasing priority: the last existing one wins.
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            env: None,
            long: "conf".to_string(),
            short: Some('f'),
        }
    }

    /// Environment variable whose comma-separated value replaces the
    /// declared paths.
    #[must_use]
    pub fn env(mut self, name: impl Into<String>) -> Self {
        self.env = Some(name.into());
        self
    }

    /// Renames the path flag (default `--conf` / `-f`).
    #[must_use]
    pub fn flag(mut self, long: impl Into<String>, short: Option<char>) -> Self {
        self.long = long.into();
        self.short = short;
        self
    }

    /// Declared candidate paths.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Name of the override variable.
    #[must_use]
    pub fn env_name(&self) -> Option<&str> {
        self.env.as_deref()
    }

    /// Long name, also the argument id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.long
    }

    pub(crate) fn arg(&self) -> Arg {
        let mut help = "the global config file path.".to_string();

        if let Some(env) = &self.env {
            help.push_str(&format!(" (env: {env})"));
        }

        let mut arg = Arg::new(self.long.clone())
            .long(self.long.clone())
            .help(help)
            .value_name("PATH")
            .value_parser(value_parser!(String))
            .value_delimiter(',')
            .action(ArgAction::Append)
            .global(true);

        if let Some(short) = self.short {
            arg = arg.short(short);
        }

        if !self.paths.is_empty() {
            arg = arg.default_values(self.paths.iter().map(|p| p.display().to_string()));
        }

        arg
    }

    /// Effective candidate list and whether it was requested explicitly.
    pub(crate) fn candidates(
        &self,
        from_cli: Option<Vec<String>>,
        env: &dyn Environment,
    ) -> (Vec<PathBuf>, bool) {
        if let Some(values) = from_cli {
            return (clean(values.iter().map(String::as_str)), true);
        }

        if let Some(name) = &self.env
            && let Some(value) = env.lookup(name)
            && !value.trim().is_empty()
        {
            tracing::debug!(env = %name, "config paths overridden by environment");
            return (clean(value.split(',')), true);
        }

        (self.paths.clone(), false)
    }

    /// Tries `candidates` from last to first and decodes the first readable
    /// file into `target`.
    ///
    /// Returns the loaded path, or `None` when nothing was loaded.
    ///
    /// # Errors
    ///
    /// - [`Error::ReadConfig`] when `explicit` and a candidate is unreadable
    /// - any error of the unmarshaller
    pub fn load<S: ?Sized>(
        candidates: &[PathBuf],
        explicit: bool,
        reader: &dyn FileReader,
        unmarshal: &dyn Unmarshal<S>,
        target: &mut S,
    ) -> Result<Option<PathBuf>, Error> {
        for path in candidates.iter().rev() {
            match reader.read(path) {
                Ok(bytes) => {
                    tracing::info!(path = %path.display(), "loading configuration file");
                    unmarshal.unmarshal(path, &bytes, target)?;
                    return Ok(Some(path.clone()));
                }

                Err(source) if explicit => {
                    return Err(Error::ReadConfig {
                        path: path.display().to_string(),
                        source,
                    });
                }

                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "skipping configuration file");
                }
            }
        }

        Ok(None)
    }
}

fn clean<'a>(values: impl Iterator<Item = &'a str>) -> Vec<PathBuf> {
    values
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Target {
        loaded: Vec<String>,
    }

    fn record(bytes: &[u8], target: &mut Target) -> Result<(), BoxError> {
        target.loaded.push(String::from_utf8(bytes.to_vec())?);
        Ok(())
    }

    fn files(entries: &[(&str, &str)]) -> HashMap<PathBuf, String> {
        entries
            .iter()
            .map(|(path, content)| (PathBuf::from(path), (*content).to_string()))
            .collect()
    }

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn test_last_existing_candidate_wins() {
        let reader = files(&[
            ("./config.json", "local"),
            ("/etc/config.json", "system"),
        ]);
        let candidates = [PathBuf::from("./config.json"), PathBuf::from("/etc/config.json")];
        let mut target = Target::default();

        let loaded = ConfigFiles::load(&candidates, false, &reader, &record, &mut target).unwrap();

        assert_eq!(loaded, Some(PathBuf::from("/etc/config.json")));
        assert_eq!(target.loaded, ["system"]);
    }

    #[test]
    fn test_implicit_missing_candidates_are_skipped() {
        let reader = files(&[("./config.json", "local")]);
        let candidates = [PathBuf::from("./config.json"), PathBuf::from("/etc/config.json")];
        let mut target = Target::default();

        let loaded = ConfigFiles::load(&candidates, false, &reader, &record, &mut target).unwrap();

        assert_eq!(loaded, Some(PathBuf::from("./config.json")));
        assert_eq!(target.loaded, ["local"]);
    }

    #[test]
    fn test_nothing_found_is_success() {
        let candidates = [PathBuf::from("/nope.json")];
        let mut target = Target::default();

        let loaded = ConfigFiles::load(&candidates, false, &files(&[]), &record, &mut target).unwrap();

        assert!(loaded.is_none());
        assert!(target.loaded.is_empty());
    }

    #[test]
    fn test_explicit_missing_file_is_fatal() {
        let candidates = [PathBuf::from("/missing.json")];
        let mut target = Target::default();

        let err = ConfigFiles::load(&candidates, true, &files(&[]), &record, &mut target).unwrap_err();

        assert!(matches!(err, Error::ReadConfig { ref path, .. } if path == "/missing.json"));
        assert!(target.loaded.is_empty());
    }

    #[test]
    fn test_decode_error_is_fatal() {
        let reader = files(&[("/etc/app.json", "x")]);
        let fail = |_: &[u8], _: &mut Target| -> Result<(), BoxError> { Err("bad content".into()) };
        let mut target = Target::default();

        let err = ConfigFiles::load(
            &[PathBuf::from("/etc/app.json")],
            false,
            &reader,
            &fail,
            &mut target,
        )
        .unwrap_err();

        assert!(matches!(err, Error::Decode { ref path, .. } if path == "/etc/app.json"));
    }

    #[test]
    fn test_candidates_from_cli_are_explicit() {
        let files = ConfigFiles::new(["a.json"]).env("APP_CONF");
        let env: HashMap<String, String> = [("APP_CONF".to_string(), "b.json".to_string())].into();

        let (paths, explicit) = files.candidates(Some(vec!["c.json".into(), " ".into()]), &env);

        assert!(explicit);
        assert_eq!(paths, [PathBuf::from("c.json")]);
    }

    #[test]
    fn test_candidates_from_env_are_explicit() {
        let files = ConfigFiles::new(["a.json"]).env("APP_CONF");
        let env: HashMap<String, String> =
            [("APP_CONF".to_string(), "b.json, ,c.json".to_string())].into();

        let (paths, explicit) = files.candidates(None, &env);

        assert!(explicit);
        assert_eq!(paths, [PathBuf::from("b.json"), PathBuf::from("c.json")]);
    }

    #[test]
    fn test_declared_candidates_are_implicit() {
        let files = ConfigFiles::new(["./config.json", "/etc/config.json"]).env("APP_CONF");

        let (paths, explicit) = files.candidates(None, &no_env());

        assert!(!explicit);
        assert_eq!(paths, files.paths());
    }

    #[test]
    fn test_flag_rename() {
        let files = ConfigFiles::new(Vec::<PathBuf>::new()).flag("config", None);
        let arg = files.arg();

        assert_eq!(files.id(), "config");
        assert_eq!(arg.get_long(), Some("config"));
        assert_eq!(arg.get_short(), None);
    }

    #[test]
    fn test_arg_help_mentions_env() {
        let files = ConfigFiles::new(["/etc/app.json"]).env("APP_CONF");
        let arg = files.arg();

        let help = arg.get_help().map(ToString::to_string).unwrap_or_default();
        assert_eq!(help, "the global config file path. (env: APP_CONF)");
        assert_eq!(arg.get_short(), Some('f'));
        assert_eq!(arg.get_default_values().len(), 1);
    }
}
