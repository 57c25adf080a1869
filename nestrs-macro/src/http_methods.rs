use proc_macro::TokenStream;
use quote::quote;
use syn::parse_macro_input;

/// Outside of a `#[routes]` block the method attributes only check that they
/// sit on a method; `#[routes]` consumes them.
pub fn http_method_attribute(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as syn::ImplItemFn);

    TokenStream::from(quote! {
        #input
    })
}
