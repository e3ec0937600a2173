use syn::{Data, DeriveInput, Fields, FieldsNamed, Variant, spanned::Spanned};

/// Named fields of a struct, or a spanned error naming the derive.
pub fn named_fields<'a>(input: &'a DeriveInput, derive: &str) -> syn::Result<&'a FieldsNamed> {
    let Data::Struct(data_struct) = &input.data else {
        return Err(syn::Error::new(
            input.span(),
            format!("{derive} can only be derived for structs"),
        ));
    };
    match &data_struct.fields {
        Fields::Named(fields) => Ok(fields),
        _ => Err(syn::Error::new(
            input.span(),
            format!("{derive} requires named fields"),
        )),
    }
}

/// Unit variants of an enum, or a spanned error naming the derive.
pub fn unit_variants<'a>(input: &'a DeriveInput, derive: &str) -> syn::Result<Vec<&'a Variant>> {
    let Data::Enum(data_enum) = &input.data else {
        return Err(syn::Error::new(
            input.span(),
            format!("{derive} can only be derived for enums"),
        ));
    };
    data_enum
        .variants
        .iter()
        .map(|variant| {
            if matches!(variant.fields, Fields::Unit) {
                Ok(variant)
            } else {
                Err(syn::Error::new(
                    variant.span(),
                    format!("{derive} only supports unit variants"),
                ))
            }
        })
        .collect()
}

pub fn to_kebab_case(s: &str) -> String {
    join_words(s, "-").to_ascii_lowercase()
}

pub fn to_screaming_case(s: &str, separator: &str) -> String {
    join_words(s, separator).to_ascii_uppercase()
}

/// Splits a PascalCase identifier on word boundaries. Digits stay attached to
/// the preceding word so `Euc2d` stays one word.
fn join_words(s: &str, separator: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(chars.len() + 4);
    for (idx, &ch) in chars.iter().enumerate() {
        if idx > 0 && ch.is_ascii_uppercase() {
            let prev = chars[idx - 1];
            let next_lower = chars.get(idx + 1).is_some_and(|n| n.is_ascii_lowercase());
            if prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_lower)
            {
                out.push_str(separator);
            }
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::{named_fields, to_kebab_case, to_screaming_case, unit_variants};

    #[test]
    fn kebab_case_splits_pascal_words() {
        assert_eq!(to_kebab_case("LogLevel"), "log-level");
        assert_eq!(to_kebab_case("Christofides"), "christofides");
        assert_eq!(to_kebab_case("X"), "x");
    }

    #[test]
    fn screaming_case_uses_separator_and_keeps_digits_in_word() {
        assert_eq!(to_screaming_case("FullMatrix", "_"), "FULL_MATRIX");
        assert_eq!(to_screaming_case("UpperDiagRow", "_"), "UPPER_DIAG_ROW");
        assert_eq!(to_screaming_case("Euc2d", "_"), "EUC2D");
        assert_eq!(to_screaming_case("Atsp", "_"), "ATSP");
    }

    #[test]
    fn named_fields_rejects_enums_and_tuple_structs() {
        let input: syn::DeriveInput = parse_quote!(
            enum Mode {
                A,
            }
        );
        let err = named_fields(&input, "KvDisplay").expect_err("enum should fail");
        assert!(err.to_string().contains("KvDisplay can only be derived for structs"));

        let input: syn::DeriveInput = parse_quote!(
            struct Pair(u8, u8);
        );
        let err = named_fields(&input, "KvDisplay").expect_err("tuple struct should fail");
        assert!(err.to_string().contains("requires named fields"));
    }

    #[test]
    fn unit_variants_rejects_data_variants() {
        let input: syn::DeriveInput = parse_quote!(
            enum Mode {
                A,
                B(u8),
            }
        );
        let err = unit_variants(&input, "CliValue").expect_err("data variant should fail");
        assert!(err.to_string().contains("only supports unit variants"));
    }
}
