//! The command runner: binds a schema to a [`clap::Command`] and resolves
//! every field in precedence order.
//!
//! One invocation goes through these phases:
//!
//! 1. defaults: every field is resolved against the [`Scope`] and its
//!    textual default is applied;
//! 2. registration: one argument per leaf, plus the config path flag;
//! 3. parse: a help or version request ends the run here;
//! 4. config: the first readable candidate file is decoded into the schema;
//! 5. resolution: command-line values, then environment fallbacks;
//! 6. pre-run hooks, in installation order;
//! 7. the command body.
//!
//! The resulting precedence is command line > environment > config file >
//! default.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::parser::ValueSource as ClapSource;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};

use crate::binding::{self, FieldBinding, Scope, TemplateFn, TemplateKind};
use crate::config::{ConfigFiles, FileReader, OsFiles, Unmarshal};
use crate::env::{self, Environment, ProcessEnv};
use crate::error::{BoxError, Error, Origin};
use crate::schema::Schema;
use crate::slot::Kind;
use crate::source::{ConfigSources, Source, ValueSource};

/// A pre-run hook. Receives the fully resolved schema.
pub type Hook<S> = Box<dyn FnMut(&mut S, &ArgMatches) -> Result<(), BoxError>>;

/// What a run ended with.
#[derive(Debug)]
pub enum Outcome<R> {
    /// Help or version output was requested. No file was read and the body
    /// did not run.
    Help(String),

    /// The body ran.
    Ran {
        /// Value returned by the body.
        value: R,

        /// Where each flag's final value came from.
        sources: ConfigSources,
    },
}

impl<R> Outcome<R> {
    /// The body's value, if it ran.
    pub fn into_value(self) -> Option<R> {
        match self {
            Self::Help(_) => None,
            Self::Ran { value, .. } => Some(value),
        }
    }
}

/// Binds a schema to a command and runs it.
///
/// # Example
///
/// ```rust,ignore
/// use flagbind::{Cli, ConfigFiles, Json, Schema};
///
/// #[derive(Default, Schema, serde::Serialize, serde::Deserialize)]
/// struct Config {
///     /// Listen port.
///     #[flag(short = 'p', default = "8080")]
///     pub port: u32,
/// }
///
/// let mut config = Config::default();
/// Cli::new(clap::Command::new("server"))
///     .env_prefix("SERVER")
///     .config_files(ConfigFiles::new(["/etc/server.json"]), Json)
///     .run(&mut config, |config, _| {
///         println!("listening on {}", config.port);
///         Ok(())
///     })?;
/// ```
pub struct Cli<S> {
    command: Command,
    prefix: String,
    env_prefix: Option<String>,
    templates: Vec<TemplateFn>,
    global: bool,
    config: Option<(ConfigFiles, Box<dyn Unmarshal<S>>)>,
    environment: Box<dyn Environment>,
    files: Box<dyn FileReader>,
    pre_run: Option<Hook<S>>,
}

impl<S: Schema> Cli<S> {
    /// Wraps a command. Its name, about text and existing arguments are kept.
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self {
            command,
            prefix: String::new(),
            env_prefix: None,
            templates: Vec::new(),
            global: false,
            config: None,
            environment: Box::new(ProcessEnv),
            files: Box::new(OsFiles),
            pre_run: None,
        }
    }

    /// Prefix for every flag path (`prefix.field`).
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Prefix for every env variable (`PREFIX_FIELD`).
    #[must_use]
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Adds a template function for help and default text containing `{{`.
    #[must_use]
    pub fn template<F>(mut self, template: F) -> Self
    where
        F: Fn(TemplateKind, &str, &str) -> String + 'static,
    {
        self.templates.push(Box::new(template));
        self
    }

    /// Registers flags as global, so subcommands accept them too.
    #[must_use]
    pub const fn global(mut self, global: bool) -> Self {
        self.global = global;
        self
    }

    /// Enables config file loading with the given decoder.
    #[must_use]
    pub fn config_files<U>(mut self, files: ConfigFiles, unmarshal: U) -> Self
    where
        U: Unmarshal<S> + 'static,
    {
        self.config = Some((files, Box::new(unmarshal)));
        self
    }

    /// Replaces the process environment.
    #[must_use]
    pub fn environment<E: Environment + 'static>(mut self, environment: E) -> Self {
        self.environment = Box::new(environment);
        self
    }

    /// Replaces the filesystem used for config files.
    #[must_use]
    pub fn file_reader<R: FileReader + 'static>(mut self, files: R) -> Self {
        self.files = Box::new(files);
        self
    }

    /// Adds a hook that runs after resolution and before the body.
    ///
    /// Hooks run in the order they were added.
    #[must_use]
    pub fn pre_run<F>(mut self, mut hook: F) -> Self
    where
        S: 'static,
        F: FnMut(&mut S, &ArgMatches) -> Result<(), BoxError> + 'static,
    {
        let chained: Hook<S> = match self.pre_run.take() {
            Some(mut previous) => Box::new(move |schema: &mut S, matches: &ArgMatches| {
                previous(schema, matches)?;
                hook(schema, matches)
            }),
            None => Box::new(hook),
        };

        self.pre_run = Some(chained);
        self
    }

    /// Resolves the flag metadata of every leaf and applies the textual
    /// defaults, without parsing anything.
    ///
    /// # Errors
    ///
    /// Schema errors.
    pub fn bindings(&self, schema: &mut S) -> Result<Vec<FieldBinding>, Error> {
        let scope = Scope::new(&self.prefix, self.env_prefix.as_deref(), &self.templates);
        binding::collect(schema, &scope)
    }

    /// Runs the command against `args`, the first of which is the binary
    /// name.
    ///
    /// # Errors
    ///
    /// Any [`Error`]; the body does not run when one is returned before it.
    pub fn run_from<I, T, F, R>(&mut self, args: I, schema: &mut S, body: F) -> Result<Outcome<R>, Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
        F: FnOnce(&mut S, &ArgMatches) -> Result<R, BoxError>,
    {
        let bindings = self.bindings(schema)?;

        let mut command = self.command.clone().args_override_self(true);

        for binding in &bindings {
            tracing::debug!(
                flag = %binding.path,
                env = ?binding.env_name,
                kind = ?binding.kind,
                "registering flag"
            );
            command = command.arg(flag_arg(binding, self.global));
        }

        if let Some((files, _)) = &self.config {
            command = command.arg(files.arg());
        }

        let matches = match command.try_get_matches_from_mut(args) {
            Ok(matches) => matches,
            Err(err) if is_help(err.kind()) => return Ok(Outcome::Help(err.to_string())),
            Err(err) => return Err(Error::cli(&err)),
        };

        let (loaded, before) = self.load_config(&matches, schema)?;
        let sources = self.resolve(&bindings, &matches, schema, loaded, &before)?;

        if let Some(hook) = self.pre_run.as_mut() {
            hook(schema, &matches).map_err(|source| Error::PreRun { source })?;
        }

        let value = body(schema, &matches).map_err(|source| Error::Command { source })?;

        Ok(Outcome::Ran { value, sources })
    }

    /// Runs the command against the process arguments, printing help output
    /// when it is requested.
    ///
    /// # Errors
    ///
    /// See [`Cli::run_from`].
    pub fn run<F, R>(&mut self, schema: &mut S, body: F) -> Result<Outcome<R>, Error>
    where
        F: FnOnce(&mut S, &ArgMatches) -> Result<R, BoxError>,
    {
        let outcome = self.run_from(std::env::args_os(), schema, body)?;

        if let Outcome::Help(text) = &outcome {
            print!("{text}");
        }

        Ok(outcome)
    }

    /// Loads the config file, returning its path and the rendered leaf
    /// values from before the load.
    fn load_config(
        &self,
        matches: &ArgMatches,
        schema: &mut S,
    ) -> Result<(Option<PathBuf>, Vec<String>), Error> {
        let Some((files, unmarshal)) = &self.config else {
            return Ok((None, Vec::new()));
        };

        let from_cli = (matches.value_source(files.id()) == Some(ClapSource::CommandLine))
            .then(|| string_values(matches, files.id()));

        let (candidates, explicit) = files.candidates(from_cli, self.environment.as_ref());

        if candidates.is_empty() {
            return Ok((None, Vec::new()));
        }

        let mut before = Vec::new();
        binding::for_each_leaf(schema, |_, leaf| {
            before.push(leaf.render());
            Ok(())
        })?;

        let loaded = ConfigFiles::load(
            &candidates,
            explicit,
            self.files.as_ref(),
            unmarshal.as_ref(),
            schema,
        )?;

        Ok((loaded, before))
    }

    fn resolve(
        &self,
        bindings: &[FieldBinding],
        matches: &ArgMatches,
        schema: &mut S,
        loaded: Option<PathBuf>,
        before: &[String],
    ) -> Result<ConfigSources, Error> {
        let mut sources = ConfigSources::new();
        let environment = self.environment.as_ref();

        binding::for_each_leaf(schema, |index, mut leaf| {
            let Some(binding) = bindings.get(index) else {
                return Ok(());
            };

            let flag = binding.path.as_str();
            let explicit = matches.value_source(flag) == Some(ClapSource::CommandLine);

            let source = if explicit {
                leaf.set_all(flag, &Origin::CommandLine, &string_values(matches, flag))?;
                Source::Cli
            } else if env::fallback(&mut leaf, flag, binding.env_name.as_deref(), explicit, environment)? {
                Source::Environment
            } else if loaded.is_some() && before.get(index).is_some_and(|prev| *prev != leaf.render()) {
                Source::ConfigFile(loaded.clone())
            } else {
                Source::Default
            };

            tracing::debug!(flag, %source, "resolved flag");
            sources.add(flag, ValueSource::new(binding.env_name.clone(), source));
            Ok(())
        })?;

        Ok(sources)
    }
}

fn is_help(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    )
}

fn string_values(matches: &ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn flag_arg(binding: &FieldBinding, global: bool) -> Arg {
    let mut arg = Arg::new(binding.path.clone())
        .long(binding.path.clone())
        .help(binding.help.clone())
        .value_name(binding.kind.value_name())
        .value_parser(value_parser!(String))
        .global(global);

    if let Some(short) = binding.shorthand {
        arg = arg.short(short);
    }

    arg = match binding.kind {
        Kind::Bool => arg
            .action(ArgAction::Set)
            .num_args(0..=1)
            .require_equals(true)
            .default_missing_value("true"),
        kind if kind.is_repeatable() => arg.action(ArgAction::Append).allow_hyphen_values(true),
        _ => arg.action(ArgAction::Set).allow_hyphen_values(true),
    };

    if let Some(shown) = &binding.shown_default {
        arg = arg.default_value(shown.clone());
    }

    arg
}
