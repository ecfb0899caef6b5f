use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

mod approach_meta;
use approach_meta::{parse_approach_info, parse_params};

/// Registers a streaming approach in the crate-wide approach registry.
///
/// The type must implement `Default` and `crate::approach::Approach`.
#[proc_macro_derive(Approach, attributes(approach_meta, param))]
pub fn derive_approach(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let info = match parse_approach_info(&input) {
        Ok(info) => info,
        Err(e) => return e.write_errors().into(),
    };

    let params = match parse_params(&input) {
        Ok(params) => params,
        Err(e) => return e.write_errors().into(),
    };

    let struct_name = &input.ident;
    let approach_id = struct_name.to_string().to_lowercase();
    let approach_name = &info.name;
    let description = info.description.clone().unwrap_or_default();

    let param_schemas = params.iter().filter_map(|f| {
        let field_name = f.ident.as_ref()?.to_string();
        let default_val = f.default.as_deref().unwrap_or("null");
        let type_name = extract_type_name(&f.ty);

        let min = match f.min {
            Some(min) => quote! { Some(#min) },
            None => quote! { None },
        };
        let max = match f.max {
            Some(max) => quote! { Some(#max) },
            None => quote! { None },
        };

        Some(quote! {
            crate::registry::ParameterSchema {
                name: #field_name.to_string(),
                param_type: #type_name.to_string(),
                default: serde_json::from_str(#default_val)
                    .unwrap_or_else(|_| serde_json::Value::String(#default_val.to_string())),
                min: #min,
                max: #max,
            }
        })
    });

    let mod_name = syn::Ident::new(
        &format!("__approach_registration_{}", approach_id),
        struct_name.span(),
    );

    let factory_fn_name = syn::Ident::new(
        &format!("create_metadata_{}", approach_id),
        struct_name.span(),
    );

    let expanded = quote! {
        mod #mod_name {
            use super::*;

            fn #factory_fn_name() -> crate::registry::ApproachMetadata {
                crate::registry::ApproachMetadata {
                    id: #approach_id.to_string(),
                    name: #approach_name.to_string(),
                    description: #description.to_string(),
                    parameters: vec![#(#param_schemas),*],
                    factory: || Box::new(#struct_name::default()),
                }
            }

            ::inventory::submit! {
                crate::registry::ApproachMetadataFactoryWrapper(#factory_fn_name)
            }
        }
    };

    TokenStream::from(expanded)
}

fn extract_type_name(ty: &syn::Type) -> &'static str {
    let type_str = quote!(#ty).to_string();

    if type_str.contains("f64") || type_str.contains("f32") {
        "number"
    } else if type_str.contains("u32") || type_str.contains("i32")
        || type_str.contains("u64") || type_str.contains("i64")
        || type_str.contains("usize") || type_str.contains("isize") {
        "number"
    } else if type_str.contains("String") || type_str.contains("str") {
        "string"
    } else if type_str.contains("bool") {
        "boolean"
    } else {
        "unknown"
    }
}
