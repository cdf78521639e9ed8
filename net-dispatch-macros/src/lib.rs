//! Procedural macros for net-dispatch

use darling::{FromDeriveInput, FromVariant};
use proc_macro::TokenStream;
use proc_macro2::Ident;
use quote::{format_ident, quote};
use syn::{parse_macro_input, DeriveInput};

/// Container-level attributes for #[derive(Action)]
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(action), supports(enum_any))]
struct ActionOpts {
    ident: syn::Ident,
    vis: syn::Visibility,
    data: darling::ast::Data<ActionVariant, ()>,

    /// Override the generated kind enum's name (defaults to `{Name}Kind`)
    #[darling(default)]
    kind_name: Option<String>,
}

/// Variant-level attributes
#[derive(Debug, FromVariant)]
#[darling(attributes(action))]
struct ActionVariant {
    ident: syn::Ident,
    fields: darling::ast::Fields<()>,
}

/// Derive macro for the Action trait
///
/// Generates a fieldless `{Name}Kind` enum mirroring the action enum, one
/// kind per variant, and implements `net_dispatch::Action` with:
/// - `type Kind = {Name}Kind`
/// - `kind()` mapping each variant to its kind
/// - `name()` returning the variant name as a static string
///
/// The kind enum derives `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, and
/// `Hash`, takes the action enum's visibility, and gets an `all()` constant
/// listing every kind. Use `#[action(kind_name = "...")]` to rename it.
///
/// # Example
/// ```ignore
/// #[derive(Action, Clone, Debug)]
/// enum LikesAction {
///     Like { site_id: u64, post_id: u64 },
///     DidLike { site_id: u64, post_id: u64, like_count: u64 },
/// }
///
/// let action = LikesAction::Like { site_id: 1, post_id: 2 };
/// assert_eq!(action.kind(), LikesActionKind::Like);
/// assert_eq!(action.name(), "Like");
/// ```
#[proc_macro_derive(Action, attributes(action))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match ActionOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors().into(),
    };

    let name = &opts.ident;
    let vis = &opts.vis;

    let variants = match &opts.data {
        darling::ast::Data::Enum(variants) => variants,
        _ => {
            return syn::Error::new_spanned(&input, "Action can only be derived for enums")
                .to_compile_error()
                .into();
        }
    };

    if variants.is_empty() {
        return syn::Error::new_spanned(&input, "Action requires at least one variant")
            .to_compile_error()
            .into();
    }

    let kind_name = match &opts.kind_name {
        Some(custom) => format_ident!("{}", custom),
        None => format_ident!("{}Kind", name),
    };

    let variant_idents: Vec<&Ident> = variants.iter().map(|v| &v.ident).collect();
    let variant_count = variant_idents.len();

    let kind_arms = variants.iter().map(|v| {
        let variant = &v.ident;
        match &v.fields.style {
            darling::ast::Style::Unit => quote! {
                #name::#variant => #kind_name::#variant
            },
            darling::ast::Style::Tuple => quote! {
                #name::#variant(..) => #kind_name::#variant
            },
            darling::ast::Style::Struct => quote! {
                #name::#variant { .. } => #kind_name::#variant
            },
        }
    });

    let name_arms = variants.iter().map(|v| {
        let variant = &v.ident;
        let variant_str = variant.to_string();
        match &v.fields.style {
            darling::ast::Style::Unit => quote! {
                #name::#variant => #variant_str
            },
            darling::ast::Style::Tuple => quote! {
                #name::#variant(..) => #variant_str
            },
            darling::ast::Style::Struct => quote! {
                #name::#variant { .. } => #variant_str
            },
        }
    });

    let kind_doc = format!("Action kinds for [`{name}`].");

    let expanded = quote! {
        #[doc = #kind_doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #vis enum #kind_name {
            #(#variant_idents),*
        }

        impl #kind_name {
            /// Every kind, in declaration order.
            pub const fn all() -> [#kind_name; #variant_count] {
                [#(#kind_name::#variant_idents),*]
            }
        }

        impl net_dispatch::Action for #name {
            type Kind = #kind_name;

            fn kind(&self) -> #kind_name {
                match self {
                    #(#kind_arms),*
                }
            }

            fn name(&self) -> &'static str {
                match self {
                    #(#name_arms),*
                }
            }
        }
    };

    expanded.into()
}
