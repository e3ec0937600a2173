use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{DeriveInput, LitStr, parse_macro_input};

use crate::attrs;

pub fn derive_tsplib_keyword_inner(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let enum_ident = &input.ident;
    let variants = attrs::unit_variants(input, "TsplibKeyword")?;

    let mut separator = String::from("_");
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("tsplib")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("separator") {
                let lit: LitStr = meta.value()?.parse()?;
                separator = lit.value();
                return Ok(());
            }
            Err(meta.error("unsupported tsplib attribute on enum; expected separator = \"...\""))
        })?;
    }

    let mut display_arms = Vec::new();
    let mut parse_arms = Vec::new();

    for variant in variants {
        let variant_ident = &variant.ident;
        let mut keyword: Option<String> = None;
        let mut aliases: Vec<String> = Vec::new();

        for attr in variant.attrs.iter().filter(|a| a.path().is_ident("tsplib")) {
            if let Ok(lit) = attr.parse_args::<LitStr>() {
                keyword = Some(lit.value());
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("alias") {
                    let lit: LitStr = meta.value()?.parse()?;
                    aliases.push(lit.value().to_ascii_uppercase());
                    return Ok(());
                }
                Err(meta.error("unsupported tsplib attribute; expected \"...\" or alias"))
            })?;
        }

        let keyword = keyword
            .unwrap_or_else(|| attrs::to_screaming_case(&variant_ident.to_string(), &separator));
        let keyword_lit = LitStr::new(&keyword, Span::call_site());
        let accepted = std::iter::once(keyword.to_ascii_uppercase())
            .chain(aliases)
            .map(|v| LitStr::new(&v, Span::call_site()));

        display_arms.push(quote! { Self::#variant_ident => #keyword_lit, });
        parse_arms.push(quote! { #(#accepted)|* => Some(Self::#variant_ident), });
    }

    Ok(quote! {
        impl #enum_ident {
            /// Matches a TSPLIB keyword, ignoring case and surrounding whitespace.
            pub fn from_keyword(raw: &str) -> Option<Self> {
                match raw.trim().to_ascii_uppercase().as_str() {
                    #(#parse_arms)*
                    _ => None,
                }
            }

            pub fn keyword(&self) -> &'static str {
                match self {
                    #(#display_arms)*
                }
            }
        }

        impl std::fmt::Display for #enum_ident {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.keyword())
            }
        }
    })
}
