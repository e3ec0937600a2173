use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{DeriveInput, LitStr, Path, Type, parse_macro_input};

use crate::attrs;

/// How a single `#[cli(...)]` field is read from the command line.
enum FieldMode {
    /// `--name <value>` parsed with `FromStr` or a custom function.
    Value(Option<Path>),
    /// `--name[=<bool>]` plus a generated `--no-name`.
    Flag,
}

pub fn derive_cli_options_inner(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let struct_ident = &input.ident;
    let fields = attrs::named_fields(input, "CliOptions")?;

    let mut arms = Vec::new();

    for field in &fields.named {
        let Some(field_ident) = &field.ident else {
            continue;
        };

        let mut long_name: Option<String> = None;
        let mut mode = FieldMode::Value(None);

        for attr in field.attrs.iter().filter(|a| a.path().is_ident("cli")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("long") {
                    let lit: LitStr = meta.value()?.parse()?;
                    long_name = Some(lit.value());
                    return Ok(());
                }
                if meta.path.is_ident("parse_with") {
                    let lit: LitStr = meta.value()?.parse()?;
                    mode = FieldMode::Value(Some(syn::parse_str(&lit.value())?));
                    return Ok(());
                }
                if meta.path.is_ident("flag") {
                    mode = FieldMode::Flag;
                    return Ok(());
                }
                Err(meta.error("unsupported cli attribute; expected long/parse_with/flag"))
            })?;
        }

        let Some(long_name) = long_name else {
            continue;
        };
        let long_lit = LitStr::new(&long_name, Span::call_site());

        match mode {
            FieldMode::Value(parse_with) => {
                let parse_expr = value_parse_expr(&field.ty, parse_with.as_ref());
                arms.push(quote! {
                    #long_lit => {
                        let raw = value.ok_or_else(|| {
                            crate::Error::invalid_input(format!("Missing value for --{name}"))
                        })?;
                        self.#field_ident = #parse_expr;
                        Ok(true)
                    }
                });
            }
            FieldMode::Flag => {
                let negated_lit = LitStr::new(&format!("no-{long_name}"), Span::call_site());
                arms.push(quote! {
                    #long_lit => {
                        self.#field_ident = match value {
                            Some(raw) => Self::parse_flag_value(name, &raw)?,
                            None => true,
                        };
                        Ok(true)
                    }
                });
                arms.push(quote! {
                    #negated_lit => {
                        if value.is_some() {
                            return Err(crate::Error::invalid_input(format!(
                                "Flag --{name} does not take a value"
                            )));
                        }
                        self.#field_ident = false;
                        Ok(true)
                    }
                });
            }
        }
    }

    Ok(quote! {
        impl #struct_ident {
            fn split_arg(
                raw_name: &str,
                args: &mut std::iter::Peekable<impl Iterator<Item = String>>,
            ) -> (String, Option<String>) {
                if let Some((k, v)) = raw_name.split_once('=') {
                    return (k.to_string(), Some(v.to_string()));
                }

                let value = match args.peek() {
                    Some(next) if !next.starts_with("--") => args.next(),
                    _ => None,
                };

                (raw_name.to_string(), value)
            }

            fn parse_flag_value(name: &str, raw: &str) -> crate::Result<bool> {
                match raw.to_ascii_lowercase().as_str() {
                    "1" | "true" | "yes" | "on" => Ok(true),
                    "0" | "false" | "no" | "off" => Ok(false),
                    _ => Err(crate::Error::invalid_input(format!(
                        "Invalid boolean for --{name}: {raw} (expected true/false)"
                    ))),
                }
            }

            fn apply_cli_option(
                &mut self,
                name: &str,
                value: Option<String>,
            ) -> crate::Result<bool> {
                match name {
                    #(#arms,)*
                    _ => Ok(false),
                }
            }
        }
    })
}

fn value_parse_expr(ty: &Type, parse_with: Option<&Path>) -> proc_macro2::TokenStream {
    match parse_with {
        Some(parse_with) => quote! { #parse_with(&raw)? },
        None => quote! {
            raw.parse::<#ty>()
                .map_err(|e| crate::Error::invalid_input(format!(
                    "Invalid value for --{name}: {raw} ({e})"
                )))?
        },
    }
}
