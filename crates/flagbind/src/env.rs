//! Environment lookup and the per-field env fallback.

use std::collections::HashMap;

use crate::error::{Error, Origin};
use crate::slot::Leaf;

/// Read access to environment variables.
pub trait Environment {
    /// Returns the variable's value, or `None` when it is not set.
    fn lookup(&self, name: &str) -> Option<String>;
}

/// The process environment.
///
/// Values that are not valid UTF-8 are converted lossily.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var_os(name).map(|value| value.to_string_lossy().into_owned())
    }
}

impl Environment for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<E: Environment + ?Sized> Environment for &E {
    fn lookup(&self, name: &str) -> Option<String> {
        (**self).lookup(name)
    }
}

/// Assigns a field from its environment variable unless the flag was given
/// on the command line.
///
/// Returns `true` when the environment supplied the value.
///
/// # Errors
///
/// [`Error::InvalidValue`] when the variable does not parse as the field's
/// kind.
pub fn fallback(
    leaf: &mut Leaf<'_>,
    flag: &str,
    env_name: Option<&str>,
    explicitly_set: bool,
    env: &dyn Environment,
) -> Result<bool, Error> {
    if explicitly_set {
        return Ok(false);
    }

    let Some(name) = env_name else {
        return Ok(false);
    };

    let Some(value) = env.lookup(name) else {
        return Ok(false);
    };

    tracing::debug!(flag, env = name, "applying environment value");
    leaf.set(flag, &Origin::Environment(name.to_string()), &value)?;
    Ok(true)
}
