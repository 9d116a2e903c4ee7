use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote, quote_spanned, ToTokens};
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Field, Fields, Type};

/// Options parsed from `#[service_config(..)]` on a single field
#[derive(Debug, Default)]
struct FieldOptions {
    skip: bool,
    required: bool,
}

pub fn expand_derive_from_service_config(
    input: &DeriveInput,
) -> Result<TokenStream, Vec<syn::Error>> {
    let name = &input.ident;
    let fields = named_fields(input)?;

    let mut errors = Vec::new();
    let mut setters = Vec::new();
    let mut required = Vec::new();
    for field in fields {
        let opts = match field_options(field) {
            Ok(opts) => opts,
            Err(e) => {
                errors.push(e);
                continue;
            }
        };
        if opts.skip {
            continue;
        }
        match generate_setter(field) {
            Ok(setter) => setters.push(setter),
            Err(e) => errors.push(e),
        }
        if opts.required {
            required.push(generate_required_check(field));
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    if setters.is_empty() {
        setters.push(quote! { "" => continue });
    }

    let expanded = quote! {
        impl crate::config::FromServiceConfig for #name {
            fn from_config(
                config: &crate::config::ServiceConfig,
            ) -> ::std::result::Result<Self, crate::Error> {
                let mut base = <Self as ::std::default::Default>::default();
                #(#required)*
                for key in config.parameters() {
                    match key.as_str() {
                        #(#setters),*,
                        _ => log::warn!(
                            "unknown configuration parameter for {}: {}={:?}",
                            stringify!(#name),
                            key,
                            config.get_parameter(key)
                        ),
                    }
                }
                Ok(base)
            }
        }
    };

    Ok(expanded)
}

fn named_fields(input: &DeriveInput) -> Result<Vec<&Field>, Vec<syn::Error>> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(fields.named.iter().collect()),
            _ => Err(vec![syn::Error::new(
                input.span(),
                "FromServiceConfig only supports structs with named fields",
            )]),
        },
        _ => Err(vec![syn::Error::new(
            input.span(),
            "FromServiceConfig only supports structs",
        )]),
    }
}

fn field_options(field: &Field) -> syn::Result<FieldOptions> {
    let mut opts = FieldOptions::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("service_config") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                opts.skip = true;
                Ok(())
            } else if meta.path.is_ident("required") {
                opts.required = true;
                Ok(())
            } else {
                Err(meta.error("expected `skip` or `required`"))
            }
        })?;
    }
    if opts.skip && opts.required {
        return Err(syn::Error::new(
            field.span(),
            "a field cannot be both `skip` and `required`",
        ));
    }
    Ok(opts)
}

fn field_key(field: &Field) -> String {
    field
        .ident
        .as_ref()
        .map(|name| name.to_string())
        .unwrap_or_default()
}

/// Fail construction early when a credential or other mandatory key is absent
fn generate_required_check(field: &Field) -> TokenStream {
    let key = field_key(field);
    quote_spanned! {
        field.span() => if config.get_parameter(#key).is_none() {
            return Err(crate::Error::MissingConfigurationValue(format!(
                "{}.{}",
                config.handler(),
                #key
            )));
        }
    }
}

fn generate_setter(field: &Field) -> syn::Result<TokenStream> {
    let name = &field.ident;
    let key = field_key(field);
    let (get_fn, cast) = get_param_fn_ident(&field.ty)?;

    let assignment = if let Some(cast) = cast {
        quote_spanned! { field.span() => base.#name = val? as #cast }
    } else {
        quote_spanned! { field.span() => base.#name = val? }
    };

    Ok(quote_spanned! {
        field.span() => #key => {
            if let Some(val) = config.#get_fn(#key) {
                #assignment
            }
        }
    })
}

fn get_param_fn_ident(ty: &Type) -> syn::Result<(Ident, Option<&Type>)> {
    let type_str = ty.to_token_stream().to_string();
    match type_str.as_ref() {
        "String" => Ok((format_ident!("get_parameter_as_string"), None)),
        "f32" | "f64" => Ok((format_ident!("get_parameter_as_f64"), Some(ty))),
        "u8" | "u16" | "u32" | "u64" | "usize" | "i8" | "i16" | "i32" | "i64" | "isize" => {
            Ok((format_ident!("get_parameter_as_i64"), Some(ty)))
        }
        _ => Err(syn::Error::new(
            ty.span(),
            format!("FromServiceConfig doesn't support fields of type {}", type_str),
        )),
    }
}
