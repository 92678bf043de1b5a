//! `#[api]`: async function to API definition.

use crate::attr::AttrList;
use proc_macro::TokenStream;
use quote::quote;
use syn::{FnArg, ItemFn, parse_macro_input};

/// Implementation of the `#[api]` macro.
pub fn api_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attrs = parse_macro_input!(attr as AttrList);
    let input = parse_macro_input!(item as ItemFn);

    match expand(attrs, input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(attrs: AttrList, input: ItemFn) -> syn::Result<proc_macro2::TokenStream> {
    let fn_name = &input.sig.ident;
    let fn_vis = &input.vis;
    let fn_block = &input.block;
    let fn_inputs = &input.sig.inputs;
    let fn_output = &input.sig.output;

    if input.sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(
            input.sig.fn_token,
            "API function must be async",
        ));
    }
    if let Some(FnArg::Receiver(receiver)) = fn_inputs.first() {
        return Err(syn::Error::new_spanned(
            receiver,
            "API function cannot take self",
        ));
    }

    let invoke = match fn_inputs.len() {
        0 => quote! {{
            let _ = args;
            Self::__call().await
        }},
        1 => quote! { Self::__call(args).await },
        _ => {
            return Err(syn::Error::new_spanned(
                fn_inputs,
                "API function takes at most one argument: `args: CallArgs`",
            ));
        }
    };

    let mut api_name = fn_name.to_string();
    let mut settings = Vec::new();
    for pair in &attrs.pairs {
        let value = &pair.value;
        match pair.key.to_string().as_str() {
            "name" => api_name = pair.lit_str()?.value(),
            "soft_timeout" => settings.push(quote! { .soft_timeout((#value) as f64) }),
            "hard_timeout" => settings.push(quote! { .hard_timeout((#value) as f64) }),
            key => settings.push(quote! {
                .with(#key, ::takumi::serde_json::Value::from(#value))
            }),
        }
    }

    Ok(quote! {
        #[allow(non_camel_case_types)]
        #[derive(Clone, Copy, Debug, Default)]
        #[doc = concat!("API definition generated by `#[takumi::api]` on `", stringify!(#fn_name), "`")]
        #fn_vis struct #fn_name;

        impl #fn_name {
            #[doc(hidden)]
            async fn __call(#fn_inputs) #fn_output #fn_block
        }

        impl ::takumi::Handler for #fn_name {
            async fn call(
                &self,
                args: ::takumi::CallArgs,
            ) -> ::core::result::Result<::takumi::serde_json::Value, ::takumi::BoxError> {
                ::takumi::reply(#invoke)
            }
        }

        impl ::takumi::ApiDef for #fn_name {
            const NAME: &'static str = #api_name;
            const UNIT: &'static str = ::core::module_path!();

            #[allow(clippy::unnecessary_cast)]
            fn config() -> ::takumi::ApiConfig {
                ::takumi::ApiConfig::new() #(#settings)*
            }
        }
    })
}
