//! Flag path, env name, help and default resolution for schema fields.
//!
//! A [`Scope`] carries the accumulated flag prefix, the env prefix and the
//! template functions down a schema tree. Resolving a [`FieldSpec`] in a
//! scope yields a [`FieldBinding`]:
//!
//! 1. path: explicit `name`, else the case-converted identifier, joined to
//!    the scope prefix with `.`;
//! 2. shorthand: explicit `short` only;
//! 3. env name: explicit `env`, else derived from the path, then prefixed
//!    with `env_prefix + "_"`; `env = "-"` disables the lookup;
//! 4. help: template-expanded, with `" (env: NAME) "` appended;
//! 5. default: template-expanded.
//!
//! A nested schema gets a child scope whose prefix is the field's path, or
//! the unchanged parent prefix when the field is `flatten`.

use std::fmt::{self, Debug, Formatter};

use crate::error::Error;
use crate::names::{to_env_case, to_flag_case};
use crate::schema::{EnvName, FieldSpec, FieldVisitor, Schema};
use crate::slot::{Kind, Leaf, Slot};

/// Marker that switches on template expansion.
pub const TEMPLATE_MARKER: &str = "{{";

/// Which attribute text a template function is asked to rewrite.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TemplateKind {
    /// `help = "..."` or the doc comment.
    Help,

    /// `default = "..."`.
    Default,
}

/// Rewrites attribute text containing [`TEMPLATE_MARKER`].
///
/// Called with the text kind, the resolved flag path and the raw text. An
/// empty result or the unchanged input means "not handled".
pub type TemplateFn = Box<dyn Fn(TemplateKind, &str, &str) -> String>;

/// Runs `raw` through the template functions in order.
///
/// The first function whose output is non-empty and differs from the input
/// wins. Text without the marker is returned as is.
#[must_use]
pub fn expand_template(templates: &[TemplateFn], kind: TemplateKind, path: &str, raw: &str) -> String {
    if !raw.contains(TEMPLATE_MARKER) {
        return raw.to_string();
    }

    templates
        .iter()
        .map(|template| template(kind, path, raw))
        .find(|rewritten| !rewritten.is_empty() && rewritten != raw)
        .unwrap_or_else(|| raw.to_string())
}

/// Fully resolved metadata of one leaf field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldBinding {
    /// Dotted flag path (`tls.ca-cert`), also the clap argument id.
    pub path: String,

    /// Single-character shorthand.
    pub shorthand: Option<char>,

    /// Environment variable consulted when the flag is absent.
    pub env_name: Option<String>,

    /// Help text, including the env hint.
    pub help: String,

    /// Template-expanded textual default.
    pub default: Option<String>,

    /// Value kind of the field.
    pub kind: Kind,

    /// Value after defaults, shown in help; `None` for the zero value.
    pub shown_default: Option<String>,
}

/// Prefixes and template functions for one level of a schema tree.
pub struct Scope<'t> {
    prefix: String,
    env_prefix: Option<String>,
    templates: &'t [TemplateFn],
}

impl Debug for Scope<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("prefix", &self.prefix)
            .field("env_prefix", &self.env_prefix)
            .field("templates", &self.templates.len())
            .finish()
    }
}

impl<'t> Scope<'t> {
    /// Root scope. Empty prefixes mean "none".
    #[must_use]
    pub fn new(prefix: &str, env_prefix: Option<&str>, templates: &'t [TemplateFn]) -> Self {
        Self {
            prefix: prefix.to_string(),
            env_prefix: env_prefix.filter(|p| !p.is_empty()).map(str::to_string),
            templates,
        }
    }

    /// Flag path of a field in this scope.
    #[must_use]
    pub fn path(&self, spec: &FieldSpec) -> String {
        let own = match spec.name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => to_flag_case(spec.ident),
        };

        if self.prefix.is_empty() {
            own
        } else {
            format!("{}.{own}", self.prefix)
        }
    }

    /// Env variable name for a field at `path`.
    #[must_use]
    pub fn env_name(&self, spec: &FieldSpec, path: &str) -> Option<String> {
        let base = match spec.env {
            EnvName::Suppressed => return None,
            EnvName::Explicit(name) => name.to_string(),
            EnvName::Derived => to_env_case(path),
        };

        Some(match &self.env_prefix {
            Some(prefix) => format!("{prefix}_{base}"),
            None => base,
        })
    }

    /// Resolves a leaf field.
    #[must_use]
    pub fn resolve(&self, spec: &FieldSpec, kind: Kind) -> FieldBinding {
        let path = self.path(spec);
        let env_name = self.env_name(spec, &path);

        let mut help = expand_template(
            self.templates,
            TemplateKind::Help,
            &path,
            spec.help.unwrap_or_default(),
        );

        if let Some(env) = &env_name {
            help.push_str(&format!(" (env: {env}) "));
        }

        let default = spec
            .default
            .map(|raw| expand_template(self.templates, TemplateKind::Default, &path, raw));

        FieldBinding {
            path,
            shorthand: spec.short,
            env_name,
            help,
            default,
            kind,
            shown_default: None,
        }
    }

    /// Scope for the fields of a nested schema.
    #[must_use]
    pub fn nested(&self, spec: &FieldSpec) -> Self {
        let prefix = if spec.flatten {
            self.prefix.clone()
        } else {
            self.path(spec)
        };

        Self {
            prefix,
            env_prefix: self.env_prefix.clone(),
            templates: self.templates,
        }
    }
}

struct Collector<'s, 't> {
    scope: &'s Scope<'t>,
    bindings: &'s mut Vec<FieldBinding>,
}

impl FieldVisitor for Collector<'_, '_> {
    fn visit_field(&mut self, spec: &'static FieldSpec, slot: Slot<'_>) -> Result<(), Error> {
        match slot {
            Slot::Leaf(mut leaf) => {
                let mut binding = self.scope.resolve(spec, leaf.kind());

                if let Some(raw) = &binding.default {
                    leaf.apply_default(&binding.path, raw)?;
                }

                binding.shown_default = (!leaf.is_zero()).then(|| leaf.render());
                self.bindings.push(binding);
                Ok(())
            }

            Slot::Nested(inner) => {
                let child = self.scope.nested(spec);
                inner.visit_fields(&mut Collector {
                    scope: &child,
                    bindings: &mut *self.bindings,
                })
            }

            Slot::Unsupported(reason) => Err(reason.error(spec)),
        }
    }
}

/// Resolves every leaf of `schema` and applies its textual default.
///
/// Unset `Option` fields are filled with zero values on the way, so nested
/// optional schemas are `Some` afterwards.
///
/// # Errors
///
/// Schema errors (unsupported types, malformed integer-list defaults).
pub fn collect<S: Schema + ?Sized>(schema: &mut S, scope: &Scope<'_>) -> Result<Vec<FieldBinding>, Error> {
    let mut bindings = Vec::new();

    schema.visit_fields(&mut Collector {
        scope,
        bindings: &mut bindings,
    })?;

    Ok(bindings)
}

struct Leaves<'f> {
    index: usize,
    each: &'f mut dyn FnMut(usize, Leaf<'_>) -> Result<(), Error>,
}

impl FieldVisitor for Leaves<'_> {
    fn visit_field(&mut self, spec: &'static FieldSpec, slot: Slot<'_>) -> Result<(), Error> {
        match slot {
            Slot::Leaf(leaf) => {
                let index = self.index;
                self.index += 1;
                (self.each)(index, leaf)
            }
            Slot::Nested(inner) => inner.visit_fields(self),
            Slot::Unsupported(reason) => Err(reason.error(spec)),
        }
    }
}

/// Calls `each` with the position and handle of every leaf, in the same
/// order as [`collect`] returns bindings.
///
/// # Errors
///
/// The first error returned by `each`.
pub fn for_each_leaf<S, F>(schema: &mut S, mut each: F) -> Result<(), Error>
where
    S: Schema + ?Sized,
    F: FnMut(usize, Leaf<'_>) -> Result<(), Error>,
{
    schema.visit_fields(&mut Leaves {
        index: 0,
        each: &mut each,
    })
}
