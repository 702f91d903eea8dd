use proc_macro2::TokenStream;
use quote::quote;
use syn::{Fields, ItemEnum, LitStr};

use crate::to_snake_case;

pub fn api_enum_impl(attr: TokenStream, item: TokenStream) -> darling::Result<TokenStream> {
    if !attr.is_empty() {
        return Err(darling::Error::custom("#[api_enum] takes no arguments").with_span(&attr));
    }

    let mut input = syn::parse2::<ItemEnum>(item)?;
    let name = &input.ident;
    let name_str = name.to_string();

    if !input.generics.params.is_empty() {
        return Err(
            darling::Error::custom("#[api_enum] types cannot be generic").with_span(&input.generics),
        );
    }

    let mut errors = darling::Error::accumulator();
    let mut entries = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for variant in &mut input.variants {
        if !matches!(variant.fields, Fields::Unit) {
            errors.push(
                darling::Error::custom("#[api_enum] variants cannot carry data")
                    .with_span(&variant.fields),
            );
            continue;
        }

        let mut wire = to_snake_case(&variant.ident.to_string());
        let mut kept = Vec::with_capacity(variant.attrs.len());
        for attr in variant.attrs.drain(..) {
            if !attr.path().is_ident("wire") {
                kept.push(attr);
                continue;
            }
            let parsed = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    wire = meta.value()?.parse::<LitStr>()?.value();
                    Ok(())
                } else {
                    Err(meta.error("unsupported wire attribute, expected `rename = \"...\"`"))
                }
            });
            if let Err(err) = parsed {
                errors.push(err.into());
            }
        }
        variant.attrs = kept;

        if !seen.insert(wire.clone()) {
            errors.push(
                darling::Error::custom(format!("wire value `{wire}` is used more than once"))
                    .with_span(&variant.ident),
            );
        }

        let ident = &variant.ident;
        entries.push(quote! { (#wire, Self::#ident) });
    }
    errors.finish()?;

    Ok(quote! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #input

        impl ::anthropic_types::core::open_enum::KnownValue for #name {
            const NAME: &'static str = #name_str;

            const VALUES: &'static [(&'static str, Self)] = &[#(#entries),*];
        }

        impl ::core::fmt::Display for #name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(::anthropic_types::core::open_enum::KnownValue::as_str(self))
            }
        }
    })
}
