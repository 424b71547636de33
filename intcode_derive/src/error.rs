//! Derive macro for error types.
//!
//! Generates `std::fmt::Display` and `std::error::Error` implementations.
//!
//! # Usage
//!
//! ```ignore
//! use intcode_derive::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum VMError {
//!     #[error("unrecognized operation {opcode} at ip {ip}")]
//!     UnknownOpcode { opcode: i64, ip: usize },
//!
//!     #[error("failed to read {path}: {source}")]
//!     Io {
//!         path: String,
//!         #[source]
//!         source: std::io::Error,
//!     },
//!
//!     #[error("machine has faulted")]
//!     Faulted,
//! }
//! ```
//!
//! # Supported Features
//!
//! - Unit variants: `#[error("message")]`
//! - Tuple variants with positional args: `#[error("error: {0}")]`
//! - Struct variants with named args: `#[error("expected {expected}")]`
//! - A field marked `#[source]` is returned from `Error::source`

use proc_macro::TokenStream;
use quote::{ToTokens, quote};
use syn::{Data, DeriveInput, Fields, Lit, Meta, parse_macro_input};

/// Derives `Display` and `Error` for an enum or struct.
///
/// Each variant must have an `#[error("...")]` attribute specifying
/// the display message. Supports field interpolation using `{0}`, `{1}`
/// for tuple fields or `{field_name}` for struct fields.
pub fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_error_derive(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_error_derive(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let (display_body, source_body) = match &input.data {
        Data::Enum(data_enum) => {
            let mut display_arms = Vec::with_capacity(data_enum.variants.len());
            let mut source_arms = Vec::new();

            for variant in &data_enum.variants {
                let variant_name = &variant.ident;
                let error_msg = extract_error_message(variant)?;

                match &variant.fields {
                    Fields::Unit => {
                        display_arms.push(quote! {
                            Self::#variant_name => write!(f, #error_msg),
                        });
                    }
                    Fields::Unnamed(fields) => {
                        let field_names: Vec<_> = (0..fields.unnamed.len())
                            .map(|i| quote::format_ident!("f{}", i))
                            .collect();
                        let format_str =
                            convert_positional_to_named(&error_msg, fields.unnamed.len());
                        display_arms.push(quote! {
                            Self::#variant_name(#(#field_names),*) => write!(f, #format_str, #(#field_names = #field_names),*),
                        });
                        if let Some(index) = fields.unnamed.iter().position(has_source_attr) {
                            let bindings = (0..fields.unnamed.len()).map(|i| {
                                if i == index {
                                    quote! { source }
                                } else {
                                    quote! { _ }
                                }
                            });
                            source_arms.push(quote! {
                                Self::#variant_name(#(#bindings),*) => Some(source as &(dyn ::std::error::Error + 'static)),
                            });
                        }
                    }
                    Fields::Named(fields) => {
                        let field_names: Vec<_> = fields.named.iter().map(|f| &f.ident).collect();
                        display_arms.push(quote! {
                            Self::#variant_name { #(#field_names),* } => write!(f, #error_msg, #(#field_names = #field_names),*),
                        });
                        if let Some(field) = fields.named.iter().find(|f| has_source_attr(f)) {
                            let ident = &field.ident;
                            source_arms.push(quote! {
                                Self::#variant_name { #ident, .. } => Some(#ident as &(dyn ::std::error::Error + 'static)),
                            });
                        }
                    }
                }
            }

            let source_body = if source_arms.is_empty() {
                None
            } else {
                Some(quote! {
                    match self {
                        #(#source_arms)*
                        _ => None,
                    }
                })
            };

            (
                quote! {
                    match self {
                        #(#display_arms)*
                    }
                },
                source_body,
            )
        }
        Data::Struct(data_struct) => {
            let error_msg = extract_error_message_from_attrs(
                &input.attrs,
                &input.ident,
                &format!("type `{}`", input.ident),
            )?;

            let display_body = match &data_struct.fields {
                Fields::Unit => quote! { write!(f, #error_msg) },
                Fields::Named(fields) => {
                    let field_names: Vec<_> = fields.named.iter().map(|f| &f.ident).collect();
                    quote! {
                        write!(f, #error_msg, #(#field_names = self.#field_names),*)
                    }
                }
                Fields::Unnamed(fields) => {
                    let field_idents: Vec<_> = (0..fields.unnamed.len())
                        .map(|i| quote::format_ident!("f{}", i))
                        .collect();
                    let field_indices: Vec<_> = (0..fields.unnamed.len())
                        .map(syn::Index::from)
                        .collect();
                    let format_str = convert_positional_to_named(&error_msg, fields.unnamed.len());
                    quote! {
                        write!(f, #format_str, #(#field_idents = self.#field_indices),*)
                    }
                }
            };

            let source_body = match &data_struct.fields {
                Fields::Named(fields) => fields
                    .named
                    .iter()
                    .find(|f| has_source_attr(f))
                    .map(|field| {
                        let ident = &field.ident;
                        quote! { Some(&self.#ident as &(dyn ::std::error::Error + 'static)) }
                    }),
                Fields::Unnamed(fields) => {
                    fields.unnamed.iter().position(has_source_attr).map(|i| {
                        let index = syn::Index::from(i);
                        quote! { Some(&self.#index as &(dyn ::std::error::Error + 'static)) }
                    })
                }
                Fields::Unit => None,
            };

            (display_body, source_body)
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Error derive does not support unions",
            ));
        }
    };

    let source_fn = source_body.map(|body| {
        quote! {
            fn source(&self) -> ::std::option::Option<&(dyn ::std::error::Error + 'static)> {
                #body
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                #display_body
            }
        }

        impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {
            #source_fn
        }
    })
}

/// Returns true when the field is annotated with `#[source]`.
fn has_source_attr(field: &syn::Field) -> bool {
    field.attrs.iter().any(|attr| attr.path().is_ident("source"))
}

/// Extracts the error message from a variant's `#[error("...")]` attribute.
fn extract_error_message(variant: &syn::Variant) -> syn::Result<String> {
    extract_error_message_from_attrs(
        &variant.attrs,
        &variant.ident,
        &format!("variant `{}`", variant.ident),
    )
}

/// Extracts the error message from attributes.
fn extract_error_message_from_attrs<T: ToTokens>(
    attrs: &[syn::Attribute],
    target: &T,
    target_desc: &str,
) -> syn::Result<String> {
    for attr in attrs {
        if !attr.path().is_ident("error") {
            continue;
        }
        let Meta::List(meta_list) = &attr.meta else {
            return Err(syn::Error::new_spanned(
                &attr.meta,
                "invalid #[error] attribute; use #[error(\"message\")] to describe the error",
            ));
        };
        let lit = syn::parse2::<Lit>(meta_list.tokens.clone()).map_err(|_| {
            syn::Error::new_spanned(
                &attr.meta,
                "failed to parse #[error] attribute; expected a string literal like #[error(\"bad mode {mode}\")]",
            )
        })?;
        return match lit {
            Lit::Str(lit_str) => Ok(lit_str.value()),
            _ => Err(syn::Error::new_spanned(
                &attr.meta,
                "invalid #[error] attribute: message must be a string literal",
            )),
        };
    }

    Err(syn::Error::new_spanned(
        target,
        format!(
            "missing #[error(\"...\")] attribute on {}; every error variant must declare a display message",
            target_desc
        ),
    ))
}

/// Converts positional format args `{0}`, `{1}` to named args `{f0}`, `{f1}`.
///
/// Format specs survive the rewrite, so `{0:?}` becomes `{f0:?}`.
fn convert_positional_to_named(format_str: &str, field_count: usize) -> String {
    let mut result = format_str.to_string();
    for i in (0..field_count).rev() {
        result = result
            .replace(&format!("{{{}}}", i), &format!("{{f{}}}", i))
            .replace(&format!("{{{}:", i), &format!("{{f{}:", i));
    }
    result
}
