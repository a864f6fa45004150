//! Code generation orchestration for the `Schema` derive macro.
//!
//! This module:
//! 1. Validates that the input is a struct with named fields
//! 2. Parses each field's `#[flag(...)]` attributes
//! 3. Generates `Schema::visit_fields`, visiting bound fields in
//!    declaration order
//!
//! Private fields are not visited, and neither are fields marked `skip` or
//! `name = "-"`. Their attributes are still parsed so mistakes are reported.

use proc_macro::TokenStream;
use syn::punctuated::Punctuated;
use syn::token::Comma;
use syn::{Data, DeriveInput, Error as SynError, Field, Fields, Result as SynResult, Visibility};

use quote::quote;

use crate::field::BoundField;
use crate::parse::{FieldConfig, Parser};

/// The main orchestrator for macro expansion.
pub struct Expander;

impl Expander {
    /// Main entry point for expanding the derive macro.
    ///
    /// # Errors
    ///
    /// Returns a `syn::Error` if:
    /// - The input is not a struct (enums and unions are not supported)
    /// - The struct has unnamed fields (tuple structs) or no fields (unit structs)
    /// - Any attribute has invalid syntax or conflicting options
    /// - `flatten` is used on a field that is not a nested struct
    pub fn expand(input: DeriveInput) -> SynResult<TokenStream> {
        let struct_name = &input.ident;
        let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

        let fields = Self::extract_struct_fields(&input)?;

        let mut bound = Vec::new();

        for field in fields {
            let config = Parser::parse_field_config(field)?;

            if !Self::is_visible(field) {
                continue;
            }

            if let FieldConfig::Bind(attr) = config {
                bound.push(BoundField::new(field, attr)?);
            }
        }

        let visits = bound.iter().map(BoundField::generate_visit);

        let expanded = quote! {
            impl #impl_generics ::flagbind::Schema for #struct_name #ty_generics #where_clause {
                #[allow(unused_variables)]
                fn visit_fields(
                    &mut self,
                    visitor: &mut dyn ::flagbind::FieldVisitor,
                ) -> ::core::result::Result<(), ::flagbind::Error> {
                    #(#visits)*
                    ::core::result::Result::Ok(())
                }
            }
        };

        Ok(expanded.into())
    }

    /// Any `pub` form counts as visible.
    const fn is_visible(field: &Field) -> bool {
        matches!(field.vis, Visibility::Public(_) | Visibility::Restricted(_))
    }

    /// Extract named fields from the struct, rejecting invalid types.
    fn extract_struct_fields(input: &DeriveInput) -> SynResult<&Punctuated<Field, Comma>> {
        match &input.data {
            Data::Struct(data_struct) => match &data_struct.fields {
                Fields::Named(fields_named) => Ok(&fields_named.named),

                Fields::Unnamed(_) => Err(SynError::new_spanned(
                    input,
                    "Schema does not support tuple structs",
                )),

                Fields::Unit => Err(SynError::new_spanned(
                    input,
                    "Schema does not support unit structs",
                )),
            },

            Data::Enum(_) => Err(SynError::new_spanned(
                input,
                "Schema can only be derived for structs, not enums",
            )),

            Data::Union(_) => Err(SynError::new_spanned(
                input,
                "Schema can only be derived for structs, not unions",
            )),
        }
    }
}
