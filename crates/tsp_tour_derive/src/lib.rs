mod attrs;
mod cli_options;
mod cli_value;
mod kv_display;
mod tsplib_keyword;

use proc_macro::TokenStream;

#[proc_macro_derive(CliOptions, attributes(cli))]
pub fn derive_cli_options(item: TokenStream) -> TokenStream {
    cli_options::derive_cli_options_inner(item)
}

#[proc_macro_derive(CliValue, attributes(cli_value, cli))]
pub fn derive_cli_value(item: TokenStream) -> TokenStream {
    cli_value::derive_cli_value_inner(item)
}

#[proc_macro_derive(KvDisplay, attributes(kv))]
pub fn derive_kv_display(item: TokenStream) -> TokenStream {
    kv_display::derive_kv_display_inner(item)
}

#[proc_macro_derive(TsplibKeyword, attributes(tsplib))]
pub fn derive_tsplib_keyword(item: TokenStream) -> TokenStream {
    tsplib_keyword::derive_tsplib_keyword_inner(item)
}
