use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{DeriveInput, LitStr, parse_macro_input};

use crate::attrs;

pub fn derive_cli_value_inner(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let enum_ident = &input.ident;
    let variants = attrs::unit_variants(input, "CliValue")?;

    let mut option_name = attrs::to_kebab_case(&enum_ident.to_string());
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("cli_value")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("option") {
                let lit: LitStr = meta.value()?.parse()?;
                option_name = lit.value();
                return Ok(());
            }
            Err(meta.error("unsupported cli_value attribute; expected option = \"...\""))
        })?;
    }

    let mut parse_arms = Vec::new();
    let mut display_arms = Vec::new();
    let mut canonical_names = Vec::new();
    let mut variant_idents = Vec::new();

    for variant in variants {
        let variant_ident = &variant.ident;
        let mut canonical = attrs::to_kebab_case(&variant_ident.to_string());
        let mut aliases: Vec<String> = Vec::new();

        for attr in variant.attrs.iter().filter(|a| a.path().is_ident("cli")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let lit: LitStr = meta.value()?.parse()?;
                    canonical = lit.value();
                    return Ok(());
                }
                if meta.path.is_ident("alias") {
                    let lit: LitStr = meta.value()?.parse()?;
                    aliases.push(lit.value());
                    return Ok(());
                }
                Err(meta.error("unsupported cli attribute; expected name/alias"))
            })?;
        }

        let canonical_lit = LitStr::new(&canonical, Span::call_site());
        let accepted = std::iter::once(canonical.as_str())
            .chain(aliases.iter().map(String::as_str))
            .map(|v| LitStr::new(v, Span::call_site()));

        parse_arms.push(quote! { #(#accepted)|* => Ok(Self::#variant_ident), });
        display_arms.push(quote! { Self::#variant_ident => #canonical_lit, });
        canonical_names.push(canonical);
        variant_idents.push(variant_ident);
    }

    let expected_lit = LitStr::new(&canonical_names.join("|"), Span::call_site());
    let option_lit = LitStr::new(&option_name, Span::call_site());

    Ok(quote! {
        impl #enum_ident {
            /// Every variant in declaration order.
            pub const ALL: &'static [Self] = &[#(Self::#variant_idents),*];

            pub fn parse(raw: &str) -> crate::Result<Self> {
                match raw.trim().to_ascii_lowercase().as_str() {
                    #(#parse_arms)*
                    _ => Err(crate::Error::invalid_input(format!(
                        "Invalid value for --{}: {} (expected {})",
                        #option_lit,
                        raw,
                        #expected_lit
                    ))),
                }
            }

            pub fn as_str(&self) -> &'static str {
                match self {
                    #(#display_arms)*
                }
            }
        }

        impl std::fmt::Display for #enum_ident {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    })
}
