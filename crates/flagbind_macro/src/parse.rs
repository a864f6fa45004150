//! Attribute parsing for `#[flag(name = "x", short = 'x', env = "X", ...)]`.
//!
//! Options are accumulated by [`Parser::parse_meta()`] and validated together
//! by [`Parser::build_config()`]. A field may carry several `#[flag(...)]`
//! attributes; they share one parser, so an option repeated across them is
//! still a duplicate.
//!
//! # Supported Syntax
//!
//! ```ignore
//! #[flag(name = "data-root")]            // Flag name override
//! #[flag(name = "-")]                    // Skip the field
//! #[flag(short = 'p', default = "8080")] // Shorthand and default
//! #[flag(help = "listen port")]          // Help text (else the doc comment)
//! #[flag(env = "LISTEN_PORT")]           // Env variable override
//! #[flag(env = "-")]                     // No env lookup
//! #[flag(flatten)]                       // Nested struct, no path segment
//! #[flag(skip)]                          // Skip the field
//! ```

use std::collections::HashSet;

use syn::meta::ParseNestedMeta;
use syn::{Error as SynError, Expr, ExprLit, Field, Lit, LitChar, LitStr, Meta, Result as SynResult};

/// Joins the field's doc comment lines with single spaces.
pub fn extract_doc_comment(field: &Field) -> Option<String> {
    let mut result = String::new();

    for attr in &field.attrs {
        if !attr.path().is_ident("doc") {
            continue;
        }

        if let Meta::NameValue(meta) = &attr.meta
            && let Expr::Lit(ExprLit {
                lit: Lit::Str(lit_str),
                ..
            }) = &meta.value
        {
            let line = lit_str.value();
            let line = line.trim();

            if line.is_empty() {
                continue;
            }

            if !result.is_empty() {
                result.push(' ');
            }

            result.push_str(line);
        }
    }

    (!result.is_empty()).then_some(result)
}

/// Env variable declaration of a field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum EnvAttr {
    /// Derived from the flag path at run time.
    #[default]
    Derived,

    /// `env = "NAME"`.
    Explicit(String),

    /// `env = "-"`.
    Suppressed,
}

/// Options of a bound field.
#[derive(Clone, Debug, Default)]
pub struct FlagAttr {
    pub name: Option<String>,
    pub short: Option<char>,
    pub help: Option<String>,
    pub env: EnvAttr,
    pub default: Option<String>,
    pub flatten: bool,
}

/// Result of parsing a field's attributes.
pub enum FieldConfig {
    /// `skip` or `name = "-"`.
    Skip,

    /// The field is bound.
    Bind(FlagAttr),
}

/// Accumulates `#[flag(...)]` options for one field.
#[derive(Default)]
pub struct Parser {
    name: Option<String>,
    short: Option<char>,
    help: Option<String>,
    env: Option<String>,
    default: Option<String>,
    flatten: bool,
    skip: bool,

    /// Options seen so far, for duplicate detection.
    seen: HashSet<&'static str>,
}

impl Parser {
    fn parse_meta(&mut self, meta: ParseNestedMeta) -> SynResult<()> {
        let ident = meta
            .path
            .get_ident()
            .ok_or_else(|| meta.error("Expected Identifier"))?;
        let name = ident.to_string();

        let key: &'static str = match name.as_str() {
            "name" => "name",
            "short" => "short",
            "help" => "help",
            "env" => "env",
            "default" => "default",
            "flatten" => "flatten",
            "skip" => "skip",
            _ => return Err(meta.error(format!("Unknown option `{name}`"))),
        };

        if !self.seen.insert(key) {
            return Err(meta.error(format!("Duplicate option: `{key}`")));
        }

        match key {
            "name" => {
                let lit_str: LitStr = meta.value()?.parse()?;
                self.name = Some(lit_str.value());
            }

            "short" => {
                let lit_char: LitChar = meta.value()?.parse()?;
                let short = lit_char.value();

                if short == '-' || short.is_whitespace() {
                    return Err(SynError::new_spanned(
                        lit_char,
                        format!("`{short:?}` cannot be used as a shorthand"),
                    ));
                }

                self.short = Some(short);
            }

            "help" => {
                let lit_str: LitStr = meta.value()?.parse()?;
                self.help = Some(lit_str.value());
            }

            "env" => {
                let lit_str: LitStr = meta.value()?.parse()?;
                self.env = Some(lit_str.value());
            }

            "default" => {
                let lit_str: LitStr = meta.value()?.parse()?;
                self.default = Some(lit_str.value());
            }

            "flatten" => {
                self.flatten = true;
            }

            "skip" => {
                self.skip = true;
            }

            _ => unreachable!(),
        }

        Ok(())
    }

    /// Parses every `#[flag(...)]` attribute of the field.
    pub fn parse_field_config(field: &Field) -> SynResult<FieldConfig> {
        let mut builder = Self::default();
        let mut last = None;

        for attr in &field.attrs {
            if !attr.path().is_ident("flag") {
                continue;
            }

            attr.parse_nested_meta(|meta: ParseNestedMeta<'_>| builder.parse_meta(meta))?;
            last = Some(attr);
        }

        match last {
            Some(attr) => builder.build_config(field, attr),
            None => builder.build_config(field, field),
        }
    }

    fn build_config(self, field: &Field, span: impl quote::ToTokens) -> SynResult<FieldConfig> {
        if self.skip {
            let incompatible: Vec<&str> = [
                self.name.is_some().then_some("name"),
                self.short.is_some().then_some("short"),
                self.help.is_some().then_some("help"),
                self.env.is_some().then_some("env"),
                self.default.is_some().then_some("default"),
                self.flatten.then_some("flatten"),
            ]
            .into_iter()
            .flatten()
            .collect();

            if !incompatible.is_empty() {
                return Err(SynError::new_spanned(
                    span,
                    format!("Cannot use `{}` with `skip`", incompatible.join("`, `")),
                ));
            }

            return Ok(FieldConfig::Skip);
        }

        if self.name.as_deref() == Some("-") {
            return Ok(FieldConfig::Skip);
        }

        if self.flatten {
            let incompatible: Vec<&str> = [
                self.name.is_some().then_some("name"),
                self.short.is_some().then_some("short"),
                self.default.is_some().then_some("default"),
                self.env.is_some().then_some("env"),
            ]
            .into_iter()
            .flatten()
            .collect();

            if !incompatible.is_empty() {
                return Err(SynError::new_spanned(
                    span,
                    format!("Cannot use `{}` with `flatten`", incompatible.join("`, `")),
                ));
            }
        }

        let env = match self.env.as_deref() {
            None | Some("") => EnvAttr::Derived,
            Some("-") => EnvAttr::Suppressed,
            Some(name) => EnvAttr::Explicit(name.to_string()),
        };

        Ok(FieldConfig::Bind(FlagAttr {
            name: self.name,
            short: self.short,
            help: self.help.or_else(|| extract_doc_comment(field)),
            env,
            default: self.default,
            flatten: self.flatten,
        }))
    }
}
