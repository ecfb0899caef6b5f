use darling::{FromAttributes, FromField};
use syn::{DeriveInput, Fields};

/// Parsed attributes from #[approach_meta(...)]
#[derive(Debug, FromAttributes)]
#[darling(attributes(approach_meta))]
pub struct ApproachMetaArgs {
    pub name: String,

    #[darling(default)]
    pub description: Option<String>,
}

/// Parsed attributes from #[param(...)]
#[derive(Debug, FromField)]
#[darling(attributes(param))]
pub struct ParamField {
    pub ident: Option<syn::Ident>,
    pub ty: syn::Type,

    #[darling(default)]
    pub default: Option<String>,

    #[darling(default)]
    pub min: Option<f64>,

    #[darling(default)]
    pub max: Option<f64>,
}

pub fn parse_approach_info(input: &DeriveInput) -> darling::Result<ApproachMetaArgs> {
    ApproachMetaArgs::from_attributes(&input.attrs)
}

pub fn parse_params(input: &DeriveInput) -> darling::Result<Vec<ParamField>> {
    let fields = match &input.data {
        syn::Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => return Ok(Vec::new()),
        },
        _ => return Ok(Vec::new()),
    };

    fields
        .iter()
        .filter(|f| f.attrs.iter().any(|attr| attr.path().is_ident("param")))
        .map(ParamField::from_field)
        .collect()
}
