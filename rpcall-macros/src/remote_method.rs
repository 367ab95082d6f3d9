//! `#[derive(RemoteMethod)]` implementation
//!
//! # Macro Expansion Process
//!
//! 1. **Parse**: Parse the struct with `syn::DeriveInput`
//! 2. **Attributes**: Read the container-level `#[rpc(...)]` options and any
//!    per-field `#[rpc(rename = "...")]`
//! 3. **Params**: Serialize each field to a `serde_json::Value`, collected into
//!    an array (default) or a keyed object (`by_name`)
//! 4. **Quote**: Emit the `RemoteMethod` impl
//!
//! # Code Generation Example
//!
//! Input:
//! ```ignore
//! #[derive(RemoteMethod)]
//! #[rpc(result = f64)]
//! struct Wait {
//!     seconds: f64,
//! }
//! ```
//!
//! Generated output:
//! ```ignore
//! impl ::rpcall_core::RemoteMethod for Wait {
//!     const NAME: &'static str = "wait";
//!     type Output = f64;
//!
//!     fn params(&self) -> ::rpcall_core::Result<Option<::rpcall_core::Params>> {
//!         let values = vec![to_value(&self.seconds).map_err(...)?];
//!         Ok(Some(::rpcall_core::Params::Positional(values)))
//!     }
//! }
//! ```

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{Data, DeriveInput, Fields, Index, LitStr, Path, Type};

/// Container-level options
struct Options {
    name: Option<LitStr>,
    prefix: Option<LitStr>,
    result: Option<Type>,
    by_name: bool,
    krate: Option<Path>,
}

impl Options {
    fn parse(input: &DeriveInput) -> syn::Result<Self> {
        let mut options = Options {
            name: None,
            prefix: None,
            result: None,
            by_name: false,
            krate: None,
        };

        for attr in input.attrs.iter().filter(|a| a.path().is_ident("rpc")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    options.name = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("prefix") {
                    options.prefix = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("result") {
                    options.result = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("by_name") {
                    options.by_name = true;
                } else if meta.path.is_ident("crate") {
                    let lit: LitStr = meta.value()?.parse()?;
                    options.krate = Some(lit.parse()?);
                } else {
                    return Err(meta.error("expected `name`, `prefix`, `result`, `by_name` or `crate`"));
                }
                Ok(())
            })?;
        }

        Ok(options)
    }
}

/// Wire key for a named field, honoring `#[rpc(rename = "...")]`
fn field_key(field: &syn::Field) -> syn::Result<LitStr> {
    let mut key = None;

    for attr in field.attrs.iter().filter(|a| a.path().is_ident("rpc")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                key = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("expected `rename`"))
            }
        })?;
    }

    Ok(match key {
        Some(key) => key,
        None => {
            let ident = field.ident.as_ref().map(|i| i.to_string()).unwrap_or_default();
            LitStr::new(&ident, Span::call_site())
        }
    })
}

/// `FetchUserById` -> `fetch_user_by_id`
fn snake_case(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len() + 4);
    let chars: Vec<char> = ident.chars().collect();

    for (i, c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let after_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let acronym_end = i > 0
                && chars[i - 1].is_uppercase()
                && chars.get(i + 1).map_or(false, |n| n.is_lowercase());
            if after_lower || acronym_end {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(*c);
        }
    }

    out
}

pub fn derive_remote_method(input: DeriveInput) -> syn::Result<TokenStream> {
    let options = Options::parse(&input)?;

    let data = match &input.data {
        Data::Struct(data) => data,
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "RemoteMethod can only be derived for structs",
            ))
        }
    };

    let krate = options
        .krate
        .clone()
        .map(|path| quote! { #path })
        .unwrap_or_else(|| quote! { ::rpcall_core });

    let ident = &input.ident;
    let base = options
        .name
        .as_ref()
        .map(LitStr::value)
        .unwrap_or_else(|| snake_case(&ident.to_string()));
    let name = match &options.prefix {
        Some(prefix) => LitStr::new(&format!("{}{}", prefix.value(), base), prefix.span()),
        None => LitStr::new(&base, ident.span()),
    };
    let output = options
        .result
        .clone()
        .map(|ty| quote! { #ty })
        .unwrap_or_else(|| quote! { #krate::serde_json::Value });

    let to_value = |access: TokenStream, label: String| {
        quote! {
            #krate::serde_json::to_value(&self.#access).map_err(|e| {
                #krate::Error::Serialization(format!(
                    "parameter '{}' of '{}': {}",
                    #label,
                    <Self as #krate::RemoteMethod>::NAME,
                    e
                ))
            })?
        }
    };

    let body = match &data.fields {
        Fields::Unit => quote! { Ok(None) },
        Fields::Named(fields) if fields.named.is_empty() => quote! { Ok(None) },
        Fields::Unnamed(fields) if fields.unnamed.is_empty() => quote! { Ok(None) },

        Fields::Named(fields) if options.by_name => {
            let mut inserts = Vec::new();
            for field in &fields.named {
                let field_ident = field.ident.clone();
                let key = field_key(field)?;
                let value = to_value(quote! { #field_ident }, key.value());
                inserts.push(quote! { map.insert(#key.to_string(), #value); });
            }
            quote! {
                let mut map = #krate::serde_json::Map::new();
                #(#inserts)*
                Ok(Some(#krate::Params::Named(map)))
            }
        }

        Fields::Named(fields) => {
            let mut values = Vec::new();
            for field in &fields.named {
                let field_ident = field.ident.clone();
                let label = field_ident.as_ref().map(|i| i.to_string()).unwrap_or_default();
                values.push(to_value(quote! { #field_ident }, label));
            }
            quote! {
                let values = vec![#(#values),*];
                Ok(Some(#krate::Params::Positional(values)))
            }
        }

        Fields::Unnamed(fields) => {
            if options.by_name {
                return Err(syn::Error::new_spanned(
                    ident,
                    "`by_name` needs named fields",
                ));
            }
            let values = (0..fields.unnamed.len()).map(|i| {
                let index = Index::from(i);
                to_value(quote! { #index }, i.to_string())
            });
            quote! {
                let values = vec![#(#values),*];
                Ok(Some(#krate::Params::Positional(values)))
            }
        }
    };

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #krate::RemoteMethod for #ident #ty_generics #where_clause {
            const NAME: &'static str = #name;
            type Output = #output;

            fn params(&self) -> #krate::Result<::core::option::Option<#krate::Params>> {
                #body
            }
        }
    })
}
