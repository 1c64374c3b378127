use proc_macro::TokenStream;
use quote::quote;
use std::collections::HashMap;
use syn::{Attribute, Data, DeriveInput, Fields, Meta, Token, Type, parse_macro_input};

/// Helper enum for parsed attribute values
enum MetaValue {
    Str(syn::LitStr),
    Expr(syn::Expr),
    Flag,
}

/// Check if the struct has #[allow(missing_docs)] attribute
fn is_allow_missing_docs(attr: &Attribute) -> bool {
    attr.path().is_ident("allow")
        && attr
            .parse_args::<syn::Ident>()
            .map(|ident| ident == "missing_docs")
            .unwrap_or(false)
}

/// Define a configuration struct loaded from environment variables
///
/// Every field takes a `#[field(...)]` attribute:
///
/// * `env = "KEY"` - environment variable to read (required)
/// * `doc = "..."` - field documentation (required unless the struct has
///   `#[allow(missing_docs)]`)
/// * `default = value` - fallback used when the variable is absent and
///   defaults are allowed; any expression implementing `ToString`
/// * `optional` - resolve an absent variable to `Default::default()`
/// * `split = ";"` - separator for `Vec<T>` fields
///
/// `Vec<T>` fields are parsed as separated lists and `Option<T>` fields are
/// `None` when an optional variable is absent. Other field types must
/// implement `Default`. The generated struct implements `genv::Load`.
#[proc_macro]
pub fn define_config(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generate_config(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn generate_config(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let struct_name = &input.ident;
    let vis = &input.vis;
    let struct_attrs = &input.attrs;

    let allow_missing_docs = struct_attrs.iter().any(is_allow_missing_docs);

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "define_config! only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "define_config! only supports structs",
            ));
        }
    };

    let mut field_defs = Vec::new();
    let mut locals = Vec::new();
    let mut bindings = Vec::new();
    let mut names = Vec::new();

    for field in fields {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
        let field_vis = &field.vis;
        let field_type = &field.ty;

        let config = parse_field_config(field, allow_missing_docs)?;

        // Keep everything except our own #[field(...)]
        let kept_attrs: Vec<&Attribute> = field
            .attrs
            .iter()
            .filter(|attr| !attr.path().is_ident("field"))
            .collect();
        let doc_attr = config.description.as_ref().map(|doc| quote! { #[doc = #doc] });

        field_defs.push(quote! {
            #doc_attr
            #(#kept_attrs)*
            #field_vis #field_name: #field_type
        });

        locals.push(quote! {
            let mut #field_name: #field_type = ::std::default::Default::default();
        });

        let env_var = &config.env_var;
        let mut binding = match wrapper_type(field_type) {
            Some("Vec") => quote! { ::genv::bind_many(#env_var, &mut #field_name) },
            Some("Option") if config.split.is_none() => {
                quote! { ::genv::bind_opt(#env_var, &mut #field_name) }
            }
            _ if config.split.is_some() => {
                return Err(syn::Error::new_spanned(
                    field,
                    "split is only supported on Vec<T> fields",
                ));
            }
            _ => quote! { ::genv::bind(#env_var, &mut #field_name) },
        };
        if let Some(split) = &config.split {
            binding = quote! { #binding.split_key(#split) };
        }
        if config.optional {
            binding = quote! { #binding.optional() };
        }
        if let Some(default) = &config.default {
            binding = quote! {
                #binding.default(::std::string::ToString::to_string(&(#default)))
            };
        }
        bindings.push(quote! { #binding.into() });

        names.push(field_name);
    }

    // Filter out allow(missing_docs) from the struct definition
    let filtered_attrs: Vec<&Attribute> = struct_attrs
        .iter()
        .filter(|attr| !is_allow_missing_docs(attr))
        .collect();

    let struct_def = quote! {
        #(#filtered_attrs)*
        #vis struct #struct_name {
            #(#field_defs),*
        }
    };

    let load_impl = quote! {
        impl ::genv::Load for #struct_name {
            fn load_from(genv: &mut ::genv::Genv) -> ::std::result::Result<Self, ::genv::Error> {
                #(#locals)*

                ::genv::parse(genv, ::std::vec![#(#bindings),*])?;

                ::std::result::Result::Ok(Self {
                    #(#names),*
                })
            }
        }
    };

    Ok(quote! {
        #struct_def
        #load_impl
    })
}

#[derive(Debug)]
struct FieldConfig {
    env_var: syn::LitStr,
    description: Option<String>,
    default: Option<syn::Expr>,
    optional: bool,
    split: Option<syn::LitStr>,
}

/// Parse #[field(env = "X", doc = "Y", default = val)] syntax
fn parse_field_list(meta_list: &syn::MetaList) -> syn::Result<HashMap<String, MetaValue>> {
    let mut values = HashMap::new();

    meta_list.parse_nested_meta(|meta| {
        let key = meta
            .path
            .get_ident()
            .ok_or_else(|| meta.error("expected identifier"))?
            .to_string();

        match key.as_str() {
            "env" | "doc" | "split" | "default" | "optional" => {}
            _ => return Err(meta.error(format!("unknown field option `{}`", key))),
        }

        if meta.input.peek(Token![=]) {
            meta.input.parse::<Token![=]>()?;

            if key == "env" || key == "doc" || key == "split" {
                let value: syn::LitStr = meta.input.parse()?;
                values.insert(key, MetaValue::Str(value));
            } else {
                let expr: syn::Expr = meta.input.parse()?;
                values.insert(key, MetaValue::Expr(expr));
            }
        } else {
            values.insert(key, MetaValue::Flag);
        }

        Ok(())
    })?;

    Ok(values)
}

fn parse_field_config(field: &syn::Field, allow_missing_docs: bool) -> syn::Result<FieldConfig> {
    let field_attr = field
        .attrs
        .iter()
        .find(|attr| attr.path().is_ident("field"))
        .ok_or_else(|| {
            syn::Error::new_spanned(
                field,
                "field must have #[field(...)] attribute with at least env = \"VAR_NAME\"",
            )
        })?;

    let parsed = match &field_attr.meta {
        Meta::List(list) => parse_field_list(list)?,
        _ => {
            return Err(syn::Error::new_spanned(
                field_attr,
                "field attribute must be a list: #[field(env = \"...\", ...)]",
            ));
        }
    };

    let env_var = match parsed.get("env") {
        Some(MetaValue::Str(s)) => s.clone(),
        _ => {
            return Err(syn::Error::new_spanned(
                field_attr,
                "field must have env = \"VAR_NAME\"",
            ));
        }
    };

    // doc is required unless the struct opts out
    let description = match parsed.get("doc") {
        Some(MetaValue::Str(s)) => Some(s.value().trim().to_string()),
        None if allow_missing_docs => None,
        None => {
            return Err(syn::Error::new_spanned(
                field_attr,
                "field must have doc = \"description\" (or use #[allow(missing_docs)] on struct)",
            ));
        }
        _ => {
            return Err(syn::Error::new_spanned(
                field_attr,
                "doc must be a string literal",
            ));
        }
    };

    let default = match parsed.get("default") {
        Some(MetaValue::Expr(e)) => Some(e.clone()),
        Some(_) => {
            return Err(syn::Error::new_spanned(
                field_attr,
                "default needs a value: default = ...",
            ));
        }
        None => None,
    };

    let split = match parsed.get("split") {
        Some(MetaValue::Str(s)) => Some(s.clone()),
        Some(_) => {
            return Err(syn::Error::new_spanned(
                field_attr,
                "split must be a string literal",
            ));
        }
        None => None,
    };

    Ok(FieldConfig {
        env_var,
        description,
        default,
        optional: matches!(parsed.get("optional"), Some(MetaValue::Flag)),
        split,
    })
}

/// Returns "Vec" or "Option" if the type is written as Vec<T> or Option<T>
fn wrapper_type(ty: &Type) -> Option<&'static str> {
    let segment = match ty {
        Type::Path(type_path) => type_path.path.segments.last()?,
        _ => return None,
    };
    if !matches!(segment.arguments, syn::PathArguments::AngleBracketed(_)) {
        return None;
    }
    if segment.ident == "Vec" {
        Some("Vec")
    } else if segment.ident == "Option" {
        Some("Option")
    } else {
        None
    }
}
