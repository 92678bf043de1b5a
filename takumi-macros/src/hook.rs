//! `#[hook]`: async function to hook bound to an event.

use crate::attr::AttrList;
use proc_macro::TokenStream;
use quote::quote;
use syn::{FnArg, ItemFn, parse_macro_input};

/// Implementation of the `#[hook]` macro.
pub fn hook_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attrs = parse_macro_input!(attr as AttrList);
    let input = parse_macro_input!(item as ItemFn);

    let fn_name = &input.sig.ident;
    let fn_vis = &input.vis;
    let fn_block = &input.block;
    let fn_inputs = &input.sig.inputs;
    let fn_output = &input.sig.output;

    if input.sig.asyncness.is_none() {
        return syn::Error::new_spanned(input.sig.fn_token, "Hook function must be async")
            .to_compile_error()
            .into();
    }
    if fn_inputs.len() != 1 || matches!(fn_inputs.first(), Some(FnArg::Receiver(_))) {
        return syn::Error::new_spanned(
            &input.sig,
            "Hook function must take one argument: `args: &HookArgs<'_>`",
        )
        .to_compile_error()
        .into();
    }

    let mut event = fn_name.to_string();
    for pair in &attrs.pairs {
        match pair.key.to_string().as_str() {
            "event" => match pair.lit_str() {
                Ok(lit) => event = lit.value(),
                Err(err) => return err.to_compile_error().into(),
            },
            other => {
                return syn::Error::new(pair.key.span(), format!("unknown attribute: {}", other))
                    .to_compile_error()
                    .into();
            }
        }
    }

    let expanded = quote! {
        #[allow(non_camel_case_types)]
        #[derive(Clone, Copy, Debug, Default)]
        #[doc = concat!("Hook generated by `#[takumi::hook]` on `", stringify!(#fn_name), "`")]
        #fn_vis struct #fn_name;

        impl #fn_name {
            #[doc(hidden)]
            async fn __on_event(#fn_inputs) #fn_output #fn_block
        }

        impl ::takumi::Hook for #fn_name {
            async fn on_event(
                &self,
                args: &::takumi::HookArgs<'_>,
            ) -> ::core::result::Result<::takumi::serde_json::Value, ::takumi::BoxError> {
                Self::__on_event(args).await
            }
        }

        impl ::takumi::HookDef for #fn_name {
            const EVENT: &'static str = #event;
        }
    };

    TokenStream::from(expanded)
}
