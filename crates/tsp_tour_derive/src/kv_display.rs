use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{DeriveInput, LitStr, parse_macro_input, spanned::Spanned};

pub fn derive_kv_display_inner(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let struct_ident = &input.ident;
    let fields = crate::attrs::named_fields(input, "KvDisplay")?;

    let mut entries: Vec<(String, proc_macro2::TokenStream)> = Vec::new();

    for field in &fields.named {
        let Some(field_ident) = &field.ident else {
            continue;
        };
        let mut key = field_ident.to_string();
        let mut fmt_mode = String::from("display");
        let mut skip = false;

        for attr in field.attrs.iter().filter(|a| a.path().is_ident("kv")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let lit: LitStr = meta.value()?.parse()?;
                    key = lit.value();
                    return Ok(());
                }
                if meta.path.is_ident("fmt") {
                    let lit: LitStr = meta.value()?.parse()?;
                    fmt_mode = lit.value();
                    return Ok(());
                }
                if meta.path.is_ident("skip") {
                    skip = true;
                    return Ok(());
                }
                Err(meta.error("unsupported kv attribute; expected name/fmt/skip"))
            })?;
        }

        if skip {
            continue;
        }

        let value = match fmt_mode.as_str() {
            "display" => quote! { &self.#field_ident },
            "path" => quote! { &self.#field_ident.display() },
            "len" => quote! { &self.#field_ident.len() },
            "list" => quote! {
                &self.#field_ident
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            },
            other => {
                return Err(syn::Error::new(
                    field.span(),
                    format!("unsupported kv fmt mode: {other}"),
                ));
            }
        };
        entries.push((key, value));
    }

    let width = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let format_str: String = entries
        .iter()
        .map(|(key, _)| format!("\n\t{key:<width$} = {{}}"))
        .collect();
    let format_lit = LitStr::new(&format_str, Span::call_site());
    let values = entries.iter().map(|(_, value)| value);

    Ok(quote! {
        impl std::fmt::Display for #struct_ident {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, #format_lit, #(#values),*)
            }
        }
    })
}
