use std::collections::HashSet;

use darling::{FromMeta, ast::NestedMeta};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Fields, Ident, ItemEnum, LitStr, Type};

use crate::to_snake_case;

#[derive(Debug, Default, FromMeta)]
struct UnionArgs {
    #[darling(default)]
    open: bool,
    #[darling(default)]
    closed: bool,
    #[darling(default)]
    ordered: bool,
    #[darling(default)]
    discriminator: Option<String>,
}

#[derive(Clone, Copy, PartialEq)]
enum Policy {
    Open,
    Closed,
    Ordered,
}

struct Member {
    ident: Ident,
    ty: Type,
    tag: Option<String>,
}

pub fn union_impl(attr: TokenStream, item: TokenStream) -> darling::Result<TokenStream> {
    let args = UnionArgs::from_list(&NestedMeta::parse_meta_list(attr)?)?;
    let policy = match (args.open, args.closed, args.ordered) {
        (true, false, false) => Policy::Open,
        (false, true, false) => Policy::Closed,
        (false, false, true) => Policy::Ordered,
        _ => {
            return Err(darling::Error::custom(
                "#[union] needs exactly one of `open`, `closed` or `ordered`",
            ));
        }
    };
    if policy == Policy::Ordered && args.discriminator.is_some() {
        return Err(darling::Error::custom(
            "ordered unions have no discriminator",
        ));
    }
    let discriminator = args.discriminator.unwrap_or_else(|| "type".to_string());

    let mut input = syn::parse2::<ItemEnum>(item)?;
    if !input.generics.params.is_empty() {
        return Err(
            darling::Error::custom("#[union] types cannot be generic").with_span(&input.generics),
        );
    }

    let mut errors = darling::Error::accumulator();
    let mut members = Vec::new();
    let mut unknown: Option<Ident> = None;
    let mut tags = HashSet::new();

    for variant in &mut input.variants {
        let ty = match &variant.fields {
            Fields::Unnamed(fields) if fields.unnamed.len() == 1 => fields.unnamed[0].ty.clone(),
            _ => {
                errors.push(
                    darling::Error::custom("union variants must wrap exactly one type")
                        .with_span(&variant.ident),
                );
                continue;
            }
        };

        let mut tag = None;
        let mut is_unknown = false;
        let mut kept = Vec::with_capacity(variant.attrs.len());
        for attr in variant.attrs.drain(..) {
            if !attr.path().is_ident("variant") {
                kept.push(attr);
                continue;
            }
            let parsed = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("tag") {
                    tag = Some(meta.value()?.parse::<LitStr>()?.value());
                    Ok(())
                } else if meta.path.is_ident("unknown") {
                    is_unknown = true;
                    Ok(())
                } else {
                    Err(meta.error("expected `tag = \"...\"` or `unknown`"))
                }
            });
            if let Err(err) = parsed {
                errors.push(err.into());
            }
        }
        variant.attrs = kept;

        if is_unknown {
            if policy != Policy::Open {
                errors.push(
                    darling::Error::custom("only open unions have an unknown variant")
                        .with_span(&variant.ident),
                );
            } else if unknown.is_some() {
                errors.push(
                    darling::Error::custom("an open union has exactly one unknown variant")
                        .with_span(&variant.ident),
                );
            } else {
                unknown = Some(variant.ident.clone());
            }
            continue;
        }

        match (policy, &tag) {
            (Policy::Ordered, Some(_)) => errors.push(
                darling::Error::custom("ordered union variants take no tag")
                    .with_span(&variant.ident),
            ),
            (Policy::Open | Policy::Closed, None) => errors.push(
                darling::Error::custom("tagged union variants need `#[variant(tag = \"...\")]`")
                    .with_span(&variant.ident),
            ),
            (_, Some(tag)) if !tags.insert(tag.clone()) => errors.push(
                darling::Error::custom(format!("tag `{tag}` is used more than once"))
                    .with_span(&variant.ident),
            ),
            _ => {}
        }

        members.push(Member {
            ident: variant.ident.clone(),
            ty,
            tag,
        });
    }

    if policy == Policy::Open && unknown.is_none() {
        errors.push(
            darling::Error::custom(
                "open unions need a `#[variant(unknown)] Unknown(serde_json::Value)` variant",
            )
            .with_span(&input.ident),
        );
    }
    errors.finish()?;

    let name = &input.ident;
    let common = common_items(name, &members, unknown.as_ref(), &discriminator);
    let engine = match policy {
        Policy::Ordered => ordered_items(name, &members),
        Policy::Closed => tagged_items(name, &members, None, &discriminator),
        Policy::Open => tagged_items(name, &members, unknown.as_ref(), &discriminator),
    };

    Ok(quote! {
        #[derive(Debug, Clone, PartialEq)]
        #input

        #common

        #engine
    })
}

/// Items every union gets regardless of policy.
fn common_items(
    name: &Ident,
    members: &[Member],
    unknown: Option<&Ident>,
    discriminator: &str,
) -> TokenStream {
    let name_str = name.to_string();
    let idents: Vec<&Ident> = members.iter().map(|m| &m.ident).collect();

    let accessors = members.iter().map(|member| {
        let ident = &member.ident;
        let ty = &member.ty;
        let snake = to_snake_case(&ident.to_string());
        let as_fn = format_ident!("as_{}", snake);
        let is_fn = format_ident!("is_{}", snake);
        quote! {
            pub fn #as_fn(&self) -> ::core::option::Option<&#ty> {
                match self {
                    Self::#ident(inner) => ::core::option::Option::Some(inner),
                    #[allow(unreachable_patterns)]
                    _ => ::core::option::Option::None,
                }
            }

            pub fn #is_fn(&self) -> bool {
                ::core::matches!(self, Self::#ident(_))
            }
        }
    });

    // A wrapped type that appears under several variants would make `From`
    // ambiguous, so those variants are only built by name.
    let type_keys: Vec<String> = members
        .iter()
        .map(|m| {
            let ty = &m.ty;
            quote!(#ty).to_string()
        })
        .collect();
    let from_impls = members.iter().zip(&type_keys).filter_map(|(member, key)| {
        if type_keys.iter().filter(|k| *k == key).count() > 1 {
            return None;
        }
        let ident = &member.ident;
        let ty = &member.ty;
        Some(quote! {
            impl ::core::convert::From<#ty> for #name {
                fn from(value: #ty) -> Self {
                    Self::#ident(value)
                }
            }
        })
    });

    let (unknown_items, unknown_serialize, unknown_validate, unknown_check) = match unknown {
        Some(unknown) => (
            quote! {
                pub fn is_unknown(&self) -> bool {
                    ::core::matches!(self, Self::#unknown(_))
                }

                /// The raw JSON of a member this build does not recognise.
                pub fn as_unknown(&self) -> ::core::option::Option<&::anthropic_types::__private::serde_json::Value> {
                    match self {
                        Self::#unknown(value) => ::core::option::Option::Some(value),
                        _ => ::core::option::Option::None,
                    }
                }
            },
            quote! {
                Self::#unknown(value) => ::anthropic_types::__private::serde::Serialize::serialize(value, serializer),
            },
            quote! {
                Self::#unknown(value) => ::core::result::Result::Err(
                    ::anthropic_types::core::union::reject_unknown(#name_str, #discriminator, value),
                ),
            },
            quote! {
                Self::#unknown(_) => ::core::result::Result::Ok(()),
            },
        ),
        None => (quote! {}, quote! {}, quote! {}, quote! {}),
    };

    quote! {
        impl #name {
            #(#accessors)*

            #unknown_items
        }

        #(#from_impls)*

        impl ::anthropic_types::__private::serde::Serialize for #name {
            fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: ::anthropic_types::__private::serde::Serializer,
            {
                match self {
                    #( Self::#idents(inner) => ::anthropic_types::__private::serde::Serialize::serialize(inner, serializer), )*
                    #unknown_serialize
                }
            }
        }

        impl ::anthropic_types::core::record::Validate for #name {
            fn validate(&self) -> ::core::result::Result<(), ::anthropic_types::core::error::DataError> {
                match self {
                    #( Self::#idents(inner) => ::anthropic_types::core::record::Validate::validate(inner), )*
                    #unknown_validate
                }
            }

            fn check_shape(&self) -> ::core::result::Result<(), ::anthropic_types::core::error::DataError> {
                match self {
                    #( Self::#idents(inner) => ::anthropic_types::core::record::Validate::check_shape(inner), )*
                    #unknown_check
                }
            }
        }
    }
}

fn tagged_items(
    name: &Ident,
    members: &[Member],
    unknown: Option<&Ident>,
    discriminator: &str,
) -> TokenStream {
    let name_str = name.to_string();
    let tags: Vec<&str> = members.iter().filter_map(|m| m.tag.as_deref()).collect();

    let arms = members.iter().map(|member| {
        let ident = &member.ident;
        let ident_str = ident.to_string();
        let ty = &member.ty;
        let tag = member.tag.as_deref().unwrap_or_default();
        quote! {
            #tag => ::core::option::Option::Some((
                #ident_str,
                ::anthropic_types::core::union::try_shape::<#ty>(value).map(Self::#ident),
            )),
        }
    });

    let tag_arms = members.iter().map(|member| {
        let ident = &member.ident;
        let tag = member.tag.as_deref().unwrap_or_default();
        quote! { Self::#ident(_) => ::core::option::Option::Some(#tag), }
    });

    let field_value = field_value_impl(name, unknown.is_some());

    let (policy_items, unknown_tag_arm, decode_fn, deserialize_body) = match unknown {
        Some(unknown) => (
            quote! {
                impl ::anthropic_types::core::union::OpenUnion for #name {
                    fn unknown(value: ::anthropic_types::__private::serde_json::Value) -> Self {
                        Self::#unknown(value)
                    }
                }
            },
            quote! {
                Self::#unknown(value) => ::anthropic_types::core::union::discriminator(value, #discriminator),
            },
            quote! {
                /// Decode with the permissive policy; never fails.
                pub fn decode(value: ::anthropic_types::__private::serde_json::Value) -> Self {
                    ::anthropic_types::core::union::decode_open::<Self>(value)
                }
            },
            quote! {
                ::core::result::Result::Ok(::anthropic_types::core::union::decode_open::<Self>(value))
            },
        ),
        None => (
            quote! {},
            quote! {},
            quote! {
                /// Decode with the strict policy.
                pub fn decode(
                    value: ::anthropic_types::__private::serde_json::Value,
                ) -> ::core::result::Result<Self, ::anthropic_types::core::error::DataError> {
                    ::anthropic_types::core::union::decode_closed::<Self>(value)
                }
            },
            quote! {
                ::anthropic_types::core::union::decode_closed::<Self>(value)
                    .map_err(<D::Error as ::anthropic_types::__private::serde::de::Error>::custom)
            },
        ),
    };

    quote! {
        impl ::anthropic_types::core::union::DiscriminatedUnion for #name {
            const NAME: &'static str = #name_str;

            const DISCRIMINATOR: &'static str = #discriminator;

            const TAGS: &'static [&'static str] = &[#(#tags),*];

            fn dispatch(
                tag: &str,
                value: &::anthropic_types::__private::serde_json::Value,
            ) -> ::core::option::Option<(&'static str, ::core::result::Result<Self, ::anthropic_types::core::error::DataError>)> {
                match tag {
                    #(#arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        #policy_items

        #field_value

        impl #name {
            #decode_fn

            /// The discriminator value this union was decoded from.
            pub fn discriminator(&self) -> ::core::option::Option<&str> {
                match self {
                    #(#tag_arms)*
                    #unknown_tag_arm
                }
            }
        }

        impl<'de> ::anthropic_types::__private::serde::Deserialize<'de> for #name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::anthropic_types::__private::serde::Deserializer<'de>,
            {
                let value = <::anthropic_types::__private::serde_json::Value as ::anthropic_types::__private::serde::Deserialize>::deserialize(deserializer)?;
                #deserialize_body
            }
        }
    }
}

fn ordered_items(name: &Ident, members: &[Member]) -> TokenStream {
    let name_str = name.to_string();
    let candidates = members.iter().map(|member| {
        let ident = &member.ident;
        let ident_str = ident.to_string();
        let ty = &member.ty;
        quote! { .candidate::<#ty, _>(#ident_str, Self::#ident) }
    });

    let field_value = field_value_impl(name, false);

    quote! {
        #field_value

        impl #name {
            /// Try each candidate in declaration order and keep the first that fits.
            pub fn decode(
                value: ::anthropic_types::__private::serde_json::Value,
            ) -> ::core::result::Result<Self, ::anthropic_types::core::error::DataError> {
                ::anthropic_types::core::union::OrderedTrial::new(#name_str, &value)
                    #(#candidates)*
                    .finish()
            }
        }

        impl<'de> ::anthropic_types::__private::serde::Deserialize<'de> for #name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::anthropic_types::__private::serde::Deserializer<'de>,
            {
                let value = <::anthropic_types::__private::serde_json::Value as ::anthropic_types::__private::serde::Deserialize>::deserialize(deserializer)?;
                Self::decode(value)
                    .map_err(<D::Error as ::anthropic_types::__private::serde::de::Error>::custom)
            }
        }
    }
}

/// Field reads go through `decode`, so a failed strict or ordered decode
/// reaches the caller as the structured error.
fn field_value_impl(name: &Ident, infallible: bool) -> TokenStream {
    let body = if infallible {
        quote! { ::core::result::Result::Ok(Self::decode(::core::clone::Clone::clone(value))) }
    } else {
        quote! { Self::decode(::core::clone::Clone::clone(value)) }
    };
    quote! {
        impl ::anthropic_types::core::record::FieldValue for #name {
            fn from_field(
                value: &::anthropic_types::__private::serde_json::Value,
            ) -> ::core::result::Result<Self, ::anthropic_types::core::error::DataError> {
                #body
            }
        }
    }
}
