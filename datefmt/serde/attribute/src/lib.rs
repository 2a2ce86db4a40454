mod date_time;

use proc_macro::TokenStream;
use syn::DeriveInput;

///
/// Binds `#[date_time(format = "...")]` fields to a format-bound date/time codec.
///
/// It replaces each field annotation with:
///
/// * `with = "::datefmt_serde::FormatWith::<...>"`: The type argument is a generated marker type
///   that implements `DateTimeFormat` with the field's format.
///
/// * `default`: Added to `Option<T>` fields only.  Using `with = "..."` disables Serde's built-in
///   handling of missing optional fields, so an explicit `default` annotation is required.
///
/// The format is validated at compile time.
///
#[proc_macro_attribute]
pub fn date_time(_: TokenStream, input: TokenStream) -> TokenStream {
    date_time::date_time(syn::parse_macro_input!(input as DeriveInput))
        .unwrap_or_else(|error| error.to_compile_error())
        .into()
}
