//! Derive macros for configuration structs.
//!
//! Both derives read the field documentation. `DocDefault` takes each field's default value from a
//! `(Default: <expr>)` marker in the doc comment. `ConfigUpdate` generates a companion struct of
//! optional values that can be deserialized from TOML, merged and applied to a configuration.
extern crate proc_macro;

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{parse_quote, Attribute, Expr, Ident, Lit, LitStr, Meta, MetaNameValue};
use synstructure::decl_derive;

/// Collect the lines of all doc attributes of a field.
fn doc_lines(attrs: &[Attribute]) -> Vec<LitStr> {
    let mut lines = vec![];
    for attr in attrs.iter() {
        if let Ok(Meta::NameValue(MetaNameValue {
            ident,
            lit: Lit::Str(doc_str),
            ..
        })) = attr.parse_meta()
        {
            if ident == "doc" {
                lines.push(doc_str);
            }
        }
    }
    lines
}

/// Derives a default instance from the documentation.
fn derive_doc_default(s: synstructure::Structure) -> TokenStream {
    let variant = match s.variants() {
        [variant] => variant,
        _ => panic!("DocDefault requires a struct"),
    };

    let default_re = regex::Regex::new(r"\(Default: (.*)\)").unwrap();

    let body = variant.construct(|field, _| {
        let mut default_value: Expr = parse_quote!(Default::default());
        for doc_str in doc_lines(&field.attrs) {
            if let Some(default_str) = default_re.captures(&doc_str.value()) {
                let default_str = default_str.get(1).unwrap().as_str();
                let default_str = LitStr::new(default_str, doc_str.span());
                default_value = default_str
                    .parse()
                    .expect("error parsing default expression");
            }
        }
        default_value
    });

    s.gen_impl(quote! {
        gen impl Default for @Self {
            fn default() -> Self {
                #body
            }
        }
    })
}

/// Derives a `<Name>Update` struct holding an optional value per field.
///
/// The generated struct implements `serde::Deserialize` and has `new`, `merge` and `apply` methods.
/// The configuration struct itself gains a `help` function listing all options.
fn derive_config_update(s: synstructure::Structure) -> TokenStream {
    let variant = match s.variants() {
        [variant] => variant,
        _ => panic!("ConfigUpdate requires a struct"),
    };

    let ast = s.ast();
    let vis = &ast.vis;
    let name = &ast.ident;
    let update_name = Ident::new(&format!("{}Update", name), Span::call_site());

    let mut field_names = vec![];
    let mut field_types = vec![];
    let mut field_docs = vec![];

    let mut help = String::new();

    for binding in variant.bindings() {
        let field = binding.ast();
        let field_name = field
            .ident
            .clone()
            .expect("ConfigUpdate requires named fields");

        let lines: Vec<String> = doc_lines(&field.attrs)
            .iter()
            .map(|line| line.value().trim().to_owned())
            .collect();

        help.push_str(&format!("{}:\n", field_name));
        for line in lines.iter() {
            help.push_str(&format!("    {}\n", line));
        }

        field_docs.push(lines.join(" "));
        field_names.push(field_name);
        field_types.push(field.ty.clone());
    }

    let field_names_2 = field_names.clone();
    let field_names_3 = field_names.clone();
    let field_names_4 = field_names.clone();
    let field_names_5 = field_names.clone();
    let field_names_6 = field_names.clone();

    quote! {
        /// Partial update of a configuration.
        ///
        /// Unset fields leave the corresponding configuration value unchanged.
        #[derive(Default, Clone, Debug, serde::Deserialize)]
        #[serde(deny_unknown_fields)]
        #vis struct #update_name {
            #(
                #[doc = #field_docs]
                pub #field_names: Option<#field_types>,
            )*
        }

        impl #update_name {
            /// Create an empty update.
            pub fn new() -> #update_name {
                #update_name::default()
            }

            /// Overwrite this update with all values set in `other`.
            pub fn merge(&mut self, other: #update_name) {
                #(
                    if other.#field_names_2.is_some() {
                        self.#field_names_3 = other.#field_names_4;
                    }
                )*
            }

            /// Apply all set values to a configuration.
            pub fn apply(&self, config: &mut #name) {
                #(
                    if let Some(value) = &self.#field_names_5 {
                        config.#field_names_6 = value.clone();
                    }
                )*
            }
        }

        impl #name {
            /// Human readable list of all options and their documentation.
            pub fn help() -> &'static str {
                #help
            }
        }
    }
}

decl_derive!([DocDefault] => derive_doc_default);
decl_derive!([ConfigUpdate] => derive_config_update);
