//! Derive macros for the intcode crate.
//!
//! Provides:
//! - `#[derive(Error)]` - `Display` and `std::error::Error` boilerplate for error enums

mod error;

use proc_macro::TokenStream;

/// Automatically implements `Display` and `Error` traits for error types.
///
/// Fields annotated with `#[source]` are exposed through `Error::source`.
#[proc_macro_derive(Error, attributes(error, source))]
pub fn derive_error(input: TokenStream) -> TokenStream {
    error::derive_error(input)
}
