//! Attribute macros for Takumi.
//!
//! - `#[api]` turns an async function into an API definition
//! - `#[hook]` turns an async function into a hook bound to its event
//!
//! Generated code refers to items through the `::takumi` facade.

use proc_macro::TokenStream;

mod api;
mod attr;
mod hook;

/// Turn an async function into an API definition.
///
/// The function takes either nothing or a single `CallArgs`, and returns
/// `Result<T, E>` where `T: Serialize` and `E: Into<BoxError>`. It becomes a
/// unit struct of the same name implementing `Handler` and `ApiDef`, ready
/// for `ServiceModule::api`.
///
/// # Attributes
///
/// - `name = "..."`: API name, defaults to the function name
/// - `soft_timeout = <seconds>`, `hard_timeout = <seconds>`
/// - any other `key = <literal>`: an extra option for hooks
///
/// # Example
///
/// ```rust,ignore
/// #[takumi::api(soft_timeout = 1, auth = true)]
/// async fn hello(args: CallArgs) -> Result<String, BoxError> {
///     let name: String = args.param(0, "name")?;
///     Ok(format!("Hello {name}"))
/// }
///
/// app.api(hello);
/// ```
#[proc_macro_attribute]
pub fn api(attr: TokenStream, item: TokenStream) -> TokenStream {
    api::api_impl(attr, item)
}

/// Turn an async function into a hook.
///
/// The function takes `&HookArgs<'_>` and returns `Result<Value, BoxError>`.
/// It becomes a unit struct implementing `Hook` and `HookDef`, ready for
/// `HookRegistry::register_def`.
///
/// # Attributes
///
/// - `event = "..."`: the event to listen on, defaults to the function name
///
/// # Example
///
/// ```rust,ignore
/// #[takumi::hook(event = "api_called")]
/// async fn audit(args: &HookArgs<'_>) -> Result<Value, BoxError> {
///     let ctx = args.ctx()?;
///     println!("{} done", ctx.api_name()?);
///     Ok(Value::Null)
/// }
/// ```
#[proc_macro_attribute]
pub fn hook(attr: TokenStream, item: TokenStream) -> TokenStream {
    hook::hook_impl(attr, item)
}
