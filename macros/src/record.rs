use darling::{FromField, FromMeta, ast::NestedMeta};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Attribute, Fields, Ident, ItemStruct, Type, Visibility};

#[derive(Debug, Default, FromMeta)]
struct RecordArgs {
    #[darling(default)]
    tag: Option<String>,
}

#[derive(Debug, FromField)]
#[darling(attributes(field), forward_attrs(doc))]
struct FieldOpts {
    ident: Option<Ident>,
    vis: Visibility,
    ty: Type,
    attrs: Vec<Attribute>,
    #[darling(default)]
    rename: Option<String>,
    #[darling(default)]
    nullable: bool,
}

enum Access {
    Required,
    Optional,
    Nullable,
}

struct Field {
    ident: Ident,
    vis: Visibility,
    docs: Vec<Attribute>,
    key: String,
    /// The declared type with any outer `Option` removed
    value_ty: Type,
    access: Access,
}

pub fn record_impl(attr: TokenStream, item: TokenStream) -> darling::Result<TokenStream> {
    let args = RecordArgs::from_list(&NestedMeta::parse_meta_list(attr)?)?;
    let input = syn::parse2::<ItemStruct>(item)?;

    if !input.generics.params.is_empty() {
        return Err(darling::Error::custom("#[record] types cannot be generic")
            .with_span(&input.generics));
    }

    let named = match &input.fields {
        Fields::Named(named) => named,
        Fields::Unit => {
            return Err(darling::Error::custom(
                "#[record] needs a struct with named fields; use `{}` for a record with no declared fields",
            )
            .with_span(&input.ident));
        }
        Fields::Unnamed(_) => {
            return Err(
                darling::Error::custom("#[record] does not support tuple structs")
                    .with_span(&input.fields),
            );
        }
    };

    let mut errors = darling::Error::accumulator();
    let fields: Vec<Field> = named
        .named
        .iter()
        .filter_map(|field| errors.handle(FieldOpts::from_field(field).and_then(parse_field)))
        .collect();
    errors.finish()?;

    let name = &input.ident;
    let vis = &input.vis;
    let attrs = &input.attrs;

    let accessors = fields.iter().map(generate_accessors);
    let field_getters: Vec<&Ident> = fields.iter().map(|f| &f.ident).collect();

    let (tag_items, default_impl, tag_check) = match &args.tag {
        Some(tag) => tagged_items(name, tag),
        None => (
            quote! {},
            quote! {
                impl ::core::default::Default for #name {
                    fn default() -> Self {
                        Self { record: ::anthropic_types::core::record::RawRecord::new() }
                    }
                }
            },
            quote! {},
        ),
    };

    Ok(quote! {
        #(#attrs)*
        #[derive(Debug, Clone, PartialEq)]
        #vis struct #name {
            record: ::anthropic_types::core::record::RawRecord,
        }

        impl #name {
            #tag_items

            #(#accessors)*
        }

        #default_impl

        impl ::anthropic_types::core::record::Record for #name {
            fn from_record(record: ::anthropic_types::core::record::RawRecord) -> Self {
                Self { record }
            }

            fn record(&self) -> &::anthropic_types::core::record::RawRecord {
                &self.record
            }

            fn record_mut(&mut self) -> &mut ::anthropic_types::core::record::RawRecord {
                &mut self.record
            }

            fn into_record(self) -> ::anthropic_types::core::record::RawRecord {
                self.record
            }
        }

        impl ::anthropic_types::core::record::FieldValue for #name {
            fn from_field(
                value: &::anthropic_types::__private::serde_json::Value,
            ) -> ::core::result::Result<Self, ::anthropic_types::core::error::DataError> {
                ::anthropic_types::core::record::from_serde::<Self>(value)
            }
        }

        impl ::anthropic_types::core::record::Validate for #name {
            fn check_shape(&self) -> ::core::result::Result<(), ::anthropic_types::core::error::DataError> {
                #tag_check
                #( self.#field_getters()?; )*
                ::core::result::Result::Ok(())
            }

            fn validate(&self) -> ::core::result::Result<(), ::anthropic_types::core::error::DataError> {
                #tag_check
                #( ::anthropic_types::core::record::Validate::validate(&self.#field_getters()?)?; )*
                ::core::result::Result::Ok(())
            }
        }

        impl ::anthropic_types::__private::serde::Serialize for #name {
            fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: ::anthropic_types::__private::serde::Serializer,
            {
                ::anthropic_types::__private::serde::Serialize::serialize(&self.record, serializer)
            }
        }

        impl<'de> ::anthropic_types::__private::serde::Deserialize<'de> for #name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::anthropic_types::__private::serde::Deserializer<'de>,
            {
                <::anthropic_types::core::record::RawRecord as ::anthropic_types::__private::serde::Deserialize>::deserialize(deserializer)
                    .map(|record| Self { record })
            }
        }
    })
}

fn parse_field(opts: FieldOpts) -> darling::Result<Field> {
    let ident = opts
        .ident
        .ok_or_else(|| darling::Error::custom("record fields must be named"))?;
    let key = opts.rename.unwrap_or_else(|| {
        let name = ident.to_string();
        name.strip_prefix("r#").map(str::to_string).unwrap_or(name)
    });

    let (value_ty, access) = match option_inner(&opts.ty) {
        Some(inner) if opts.nullable => (inner.clone(), Access::Nullable),
        Some(inner) => (inner.clone(), Access::Optional),
        None if opts.nullable => {
            return Err(
                darling::Error::custom("#[field(nullable)] requires an `Option<T>` field")
                    .with_span(&opts.ty),
            );
        }
        None => (opts.ty.clone(), Access::Required),
    };

    Ok(Field {
        ident,
        vis: opts.vis,
        docs: opts.attrs,
        key,
        value_ty,
        access,
    })
}

/// Extract `T` from `Option<T>`
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        syn::GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

fn generate_accessors(field: &Field) -> TokenStream {
    let Field {
        ident,
        vis,
        docs,
        key,
        value_ty,
        access,
    } = field;
    let bare = ident.to_string();
    let bare = bare.strip_prefix("r#").unwrap_or(&bare);
    let setter = format_ident!("set_{}", bare);
    let clearer = format_ident!("clear_{}", bare);

    match access {
        Access::Required => quote! {
            #(#docs)*
            #vis fn #ident(&self) -> ::core::result::Result<#value_ty, ::anthropic_types::core::error::DataError> {
                self.record.require::<#value_ty>(#key)
            }

            #vis fn #setter(
                &mut self,
                value: impl ::core::convert::Into<#value_ty>,
            ) -> ::core::result::Result<(), ::anthropic_types::core::error::DataError> {
                self.record.set(#key, value.into())
            }
        },
        Access::Optional => quote! {
            #(#docs)*
            #vis fn #ident(&self) -> ::core::result::Result<::core::option::Option<#value_ty>, ::anthropic_types::core::error::DataError> {
                self.record.optional::<#value_ty>(#key)
            }

            #vis fn #setter(
                &mut self,
                value: impl ::core::convert::Into<#value_ty>,
            ) -> ::core::result::Result<(), ::anthropic_types::core::error::DataError> {
                self.record.set(#key, value.into())
            }

            #vis fn #clearer(&mut self) {
                self.record.remove(#key);
            }
        },
        Access::Nullable => quote! {
            #(#docs)*
            #vis fn #ident(&self) -> ::core::result::Result<::core::option::Option<#value_ty>, ::anthropic_types::core::error::DataError> {
                self.record.require_nullable::<#value_ty>(#key)
            }

            #vis fn #setter(
                &mut self,
                value: ::core::option::Option<#value_ty>,
            ) -> ::core::result::Result<(), ::anthropic_types::core::error::DataError> {
                self.record.set(#key, value)
            }
        },
    }
}

fn tagged_items(name: &Ident, tag: &str) -> (TokenStream, TokenStream, TokenStream) {
    let items = quote! {
        /// Discriminator value this record carries in its `type` property.
        pub const TYPE: &'static str = #tag;

        /// The raw `type` property, if it is a string.
        pub fn kind(&self) -> ::core::option::Option<&str> {
            self.record.get("type").and_then(::anthropic_types::__private::serde_json::Value::as_str)
        }
    };

    let default_impl = quote! {
        impl ::core::default::Default for #name {
            fn default() -> Self {
                let mut record = ::anthropic_types::core::record::RawRecord::new();
                record.insert_raw(
                    "type",
                    ::anthropic_types::__private::serde_json::Value::String(#tag.to_string()),
                );
                Self { record }
            }
        }
    };

    let check = quote! {
        ::anthropic_types::core::record::check_tag(&self.record, #tag)?;
    };

    (items, default_impl, check)
}
