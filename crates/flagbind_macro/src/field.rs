//! Field type classification and slot generation.
//!
//! The derive decides from the declared type alone how a field is handed to
//! the visitor:
//!
//! | Declared type | Slot |
//! |---------------|------|
//! | `String`, `bool`, `i32`, `i64`, `u32`, `u64`, `f64`, `Duration`, `IpAddr` | leaf |
//! | `Vec<String>`, `Vec<i32>`, `Vec<IpAddr>`, `HashMap<String, String>` | leaf |
//! | `Vec<_>` of anything else | unsupported element |
//! | any other map | unsupported map value |
//! | other std types, tuples, arrays, references | unsupported type |
//! | `Option<T>`, `Box<T>` | same as `T`, after allocating an unset option |
//! | any other path | nested schema |

use proc_macro2::TokenStream as QuoteStream;
use quote::{ToTokens, quote};
use syn::ext::IdentExt;
use syn::{Error as SynError, Field, GenericArgument, Ident, LitStr, PathArguments, Result as SynResult, Type};

use crate::parse::{EnvAttr, FlagAttr};

const LEAF_TYPES: &[&str] = &[
    "String", "bool", "i32", "i64", "u32", "u64", "f64", "Duration", "IpAddr",
];

const LIST_ELEMENTS: &[&str] = &["String", "i32", "IpAddr"];

const MAP_TYPES: &[&str] = &["HashMap", "BTreeMap", "IndexMap"];

/// Std and primitive types with no flag representation.
const UNSUPPORTED_TYPES: &[&str] = &[
    "u8", "u16", "u128", "usize", "i8", "i16", "i128", "isize", "f32", "char", "str",
    "PathBuf", "Path", "OsString", "OsStr", "Ipv4Addr", "Ipv6Addr", "SocketAddr", "SystemTime",
    "Instant", "HashSet", "BTreeSet", "VecDeque", "LinkedList", "BinaryHeap", "Rc", "Arc",
    "Cell", "RefCell", "Mutex", "RwLock", "Cow",
];

/// Shape of a declared type.
#[derive(Clone, Copy)]
enum Shape<'a> {
    Leaf,
    Nested,
    Unsupported(&'static str),
    Optional(&'a Type),
    Boxed(&'a Type),
}

fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    let Type::Path(type_path) = ty else {
        return None;
    };

    if type_path.qself.is_some() {
        return None;
    }

    type_path.path.segments.last()
}

fn type_args(segment: &syn::PathSegment) -> Vec<&Type> {
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return Vec::new();
    };

    args.args
        .iter()
        .filter_map(|arg| match arg {
            GenericArgument::Type(ty) => Some(ty),
            _ => None,
        })
        .collect()
}

fn is_named(ty: &Type, names: &[&str]) -> bool {
    last_segment(ty).is_some_and(|segment| {
        matches!(segment.arguments, PathArguments::None)
            && names.iter().any(|name| segment.ident == name)
    })
}

fn shape(ty: &Type) -> Shape<'_> {
    if let Type::Group(group) = ty {
        return shape(&group.elem);
    }

    let Some(segment) = last_segment(ty) else {
        return Shape::Unsupported("Type");
    };

    let ident = segment.ident.to_string();
    let args = type_args(segment);

    match (ident.as_str(), args.as_slice()) {
        ("Option", [inner]) => Shape::Optional(*inner),

        ("Box", [inner]) => Shape::Boxed(*inner),

        ("Vec", [element]) if is_named(element, LIST_ELEMENTS) => Shape::Leaf,

        ("Vec", _) => Shape::Unsupported("Element"),

        ("HashMap", [key, value]) if is_named(key, &["String"]) && is_named(value, &["String"]) => {
            Shape::Leaf
        }

        (map, _) if MAP_TYPES.contains(&map) => Shape::Unsupported("MapValue"),

        (leaf, []) if LEAF_TYPES.contains(&leaf) => Shape::Leaf,

        (other, _) if UNSUPPORTED_TYPES.contains(&other) || LEAF_TYPES.contains(&other) => {
            Shape::Unsupported("Type")
        }

        _ => Shape::Nested,
    }
}

/// Shape after removing `Option` and `Box` wrappers.
fn innermost(ty: &Type) -> Shape<'_> {
    match shape(ty) {
        Shape::Optional(inner) | Shape::Boxed(inner) => innermost(inner),
        other => other,
    }
}

/// Expression producing the value an unset `Option<ty>` is filled with.
fn zero(ty: &Type) -> QuoteStream {
    match shape(ty) {
        Shape::Leaf => quote! { <#ty as ::flagbind::Bindable>::zero() },
        Shape::Optional(_) => quote! { ::core::option::Option::None },
        Shape::Boxed(inner) => {
            let inner = zero(inner);
            quote! { ::std::boxed::Box::new(#inner) }
        }
        Shape::Nested | Shape::Unsupported(_) => quote! { <#ty as ::core::default::Default>::default() },
    }
}

/// Slot expression for the place `place` of type `ty`.
fn slot(ty: &Type, place: &QuoteStream) -> QuoteStream {
    match shape(ty) {
        Shape::Leaf => quote! { ::flagbind::Bindable::slot(&mut #place) },

        Shape::Nested => quote! { ::flagbind::Slot::Nested(&mut #place) },

        Shape::Unsupported(reason) => {
            let reason = Ident::new(reason, proc_macro2::Span::call_site());
            quote! { ::flagbind::Slot::Unsupported(::flagbind::Unsupported::#reason) }
        }

        Shape::Optional(inner) => {
            if let Shape::Unsupported(_) = innermost(inner) {
                return slot(inner, place);
            }

            let zero = zero(inner);
            let place = quote! { (*#place.get_or_insert_with(|| #zero)) };
            slot(inner, &place)
        }

        Shape::Boxed(inner) => {
            let place = quote! { (*#place) };
            slot(inner, &place)
        }
    }
}

/// Declared type as source text, e.g. `Option<String>`.
pub fn type_string(ty: &Type) -> String {
    ty.to_token_stream()
        .to_string()
        .replace(" <", "<")
        .replace("< ", "<")
        .replace(" >", ">")
        .replace(" ::", "::")
        .replace(":: ", "::")
        .replace(" ,", ",")
}

/// A bound field, ready for expansion.
pub struct BoundField {
    ident: Ident,
    ty: Type,
    attr: FlagAttr,
}

impl BoundField {
    /// Checks the field's type against its options.
    pub fn new(field: &Field, attr: FlagAttr) -> SynResult<Self> {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| SynError::new_spanned(field, "Schema requires named fields"))?;

        if attr.flatten && !matches!(innermost(&field.ty), Shape::Nested) {
            return Err(SynError::new_spanned(
                &field.ty,
                "`flatten` can only be used on nested struct fields",
            ));
        }

        Ok(Self {
            ident,
            ty: field.ty.clone(),
            attr,
        })
    }

    /// The field's `static` metadata initializer.
    fn spec(&self) -> QuoteStream {
        let ident = LitStr::new(&self.ident.unraw().to_string(), self.ident.span());
        let ty = type_string(&self.ty);
        let name = option_str(self.attr.name.as_deref());
        let help = option_str(self.attr.help.as_deref());
        let default = option_str(self.attr.default.as_deref());
        let flatten = self.attr.flatten;

        let short = match self.attr.short {
            Some(c) => quote! { ::core::option::Option::Some(#c) },
            None => quote! { ::core::option::Option::None },
        };

        let env = match &self.attr.env {
            EnvAttr::Derived => quote! { ::flagbind::EnvName::Derived },
            EnvAttr::Explicit(name) => quote! { ::flagbind::EnvName::Explicit(#name) },
            EnvAttr::Suppressed => quote! { ::flagbind::EnvName::Suppressed },
        };

        quote! {
            ::flagbind::FieldSpec {
                ident: #ident,
                ty: #ty,
                name: #name,
                short: #short,
                help: #help,
                env: #env,
                default: #default,
                flatten: #flatten,
            }
        }
    }

    /// One visitor call for this field.
    pub fn generate_visit(&self) -> QuoteStream {
        let spec = self.spec();
        let field = &self.ident;
        let slot = slot(&self.ty, &quote! { self.#field });

        quote! {
            {
                static __FLAGBIND_SPEC: ::flagbind::FieldSpec = #spec;
                visitor.visit_field(&__FLAGBIND_SPEC, #slot)?;
            }
        }
    }
}

fn option_str(value: Option<&str>) -> QuoteStream {
    match value {
        Some(value) => quote! { ::core::option::Option::Some(#value) },
        None => quote! { ::core::option::Option::None },
    }
}
