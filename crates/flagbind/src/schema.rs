//! The field-walking contract generated by `#[derive(Schema)]`.
//!
//! A schema hands each of its visible fields to a [`FieldVisitor`] together
//! with the field's static [`FieldSpec`] and a [`Slot`], a typed mutable
//! handle into the field's storage. The engine walks a schema several times
//! per invocation (defaults, config load, flag and env resolution) and relies
//! on the visiting order being the same every time.

use crate::error::Error;
use crate::slot::Slot;

/// Environment variable naming for one field, as declared by `env = "..."`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum EnvName {
    /// Derived from the flag path (`tls.ca-cert` → `TLS_CA_CERT`).
    #[default]
    Derived,

    /// Explicit name from the attribute.
    Explicit(&'static str),

    /// `env = "-"`: the environment is never consulted for this field.
    Suppressed,
}

/// Compile-time metadata of one schema field.
///
/// Produced by the derive macro from the field's identifier, type,
/// `#[flag(...)]` attribute and doc comment.
#[derive(Clone, Copy, Debug)]
pub struct FieldSpec {
    /// Field identifier, without any `r#` prefix.
    pub ident: &'static str,

    /// Declared type as written in the source.
    pub ty: &'static str,

    /// `name = "..."`: replaces the case-converted identifier.
    pub name: Option<&'static str>,

    /// `short = 'x'`.
    pub short: Option<char>,

    /// `help = "..."`, or the field's doc comment.
    pub help: Option<&'static str>,

    /// `env = "..."`.
    pub env: EnvName,

    /// `default = "..."`.
    pub default: Option<&'static str>,

    /// `flatten`: the nested schema adds no path segment.
    pub flatten: bool,
}

impl FieldSpec {
    /// A spec with no attribute options set.
    #[must_use]
    pub const fn new(ident: &'static str, ty: &'static str) -> Self {
        Self {
            ident,
            ty,
            name: None,
            short: None,
            help: None,
            env: EnvName::Derived,
            default: None,
            flatten: false,
        }
    }
}

/// A struct whose fields can be bound to flags, env vars and config files.
///
/// Implemented by `#[derive(Schema)]`; hand-written implementations must
/// visit fields in a fixed order.
pub trait Schema {
    /// Visits every bindable field in declaration order.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by the visitor.
    fn visit_fields(&mut self, visitor: &mut dyn FieldVisitor) -> Result<(), Error>;
}

impl<S: Schema + ?Sized> Schema for Box<S> {
    fn visit_fields(&mut self, visitor: &mut dyn FieldVisitor) -> Result<(), Error> {
        (**self).visit_fields(visitor)
    }
}

/// Receives the fields of a [`Schema`].
pub trait FieldVisitor {
    /// Called once per field.
    ///
    /// # Errors
    ///
    /// Returning an error stops the walk.
    fn visit_field(&mut self, spec: &'static FieldSpec, slot: Slot<'_>) -> Result<(), Error>;
}

impl<F> FieldVisitor for F
where
    F: FnMut(&'static FieldSpec, Slot<'_>) -> Result<(), Error>,
{
    fn visit_field(&mut self, spec: &'static FieldSpec, slot: Slot<'_>) -> Result<(), Error> {
        self(spec, slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::{Bindable, Slot};

    struct Manual {
        host: String,
        port: u32,
    }

    static HOST: FieldSpec = FieldSpec::new("host", "String");
    static PORT: FieldSpec = FieldSpec {
        short: Some('p'),
        default: Some("8080"),
        ..FieldSpec::new("port", "u32")
    };

    impl Schema for Manual {
        fn visit_fields(&mut self, visitor: &mut dyn FieldVisitor) -> Result<(), Error> {
            visitor.visit_field(&HOST, self.host.slot())?;
            visitor.visit_field(&PORT, self.port.slot())?;
            Ok(())
        }
    }

    #[test]
    fn test_visit_order() {
        let mut manual = Manual {
            host: "localhost".into(),
            port: 0,
        };

        let mut seen = Vec::new();
        let mut visitor = |spec: &'static FieldSpec, slot: Slot<'_>| -> Result<(), Error> {
            assert!(matches!(slot, Slot::Leaf(_)));
            seen.push(spec.ident);
            Ok(())
        };

        manual.visit_fields(&mut visitor).unwrap();
        assert_eq!(seen, ["host", "port"]);
    }

    #[test]
    fn test_slot_writes_through() {
        let mut manual = Manual {
            host: String::new(),
            port: 0,
        };

        let mut visitor = |spec: &'static FieldSpec, slot: Slot<'_>| -> Result<(), Error> {
            if let Slot::Leaf(mut leaf) = slot
                && let Some(raw) = spec.default
            {
                leaf.apply_default(spec.ident, raw)?;
            }
            Ok(())
        };

        manual.visit_fields(&mut visitor).unwrap();
        assert_eq!(manual.port, 8080);
    }

    #[test]
    fn test_boxed_schema_delegates() {
        let mut boxed: Box<Manual> = Box::new(Manual {
            host: "a".into(),
            port: 1,
        });

        let mut count = 0;
        let mut visitor = |_: &'static FieldSpec, _: Slot<'_>| -> Result<(), Error> {
            count += 1;
            Ok(())
        };

        boxed.visit_fields(&mut visitor).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_spec_defaults() {
        let spec = FieldSpec::new("version", "String");
        assert_eq!(spec.env, EnvName::Derived);
        assert!(spec.name.is_none());
        assert!(!spec.flatten);
    }
}
