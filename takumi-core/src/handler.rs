//! # Handlers
//!
//! A handler implements one API operation. It receives the decoded
//! [`CallArgs`] and resolves to a `serde_json::Value` or an error.
//!
//! # Usage Patterns
//!
//! 1. **Direct closure**: `|args: CallArgs| async move { Ok::<_, BoxError>("pong") }`
//! 2. **Struct implementation**: `impl Handler for MyHandler`
//! 3. **Attribute**: `#[takumi::api] async fn ping() -> Result<&'static str, BoxError>`
//!
//! Closures may return any `Result<T: Serialize, E: Into<BoxError>>`; the
//! value is converted with [`reply`].

use crate::{args::CallArgs, config::ApiConfig, error::BoxError};
use serde::Serialize;
use serde_json::Value;
use std::{future::Future, pin::Pin};

/// The terminal endpoint of a call.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an API handler",
    label = "missing `Handler` implementation",
    note = "Handlers are `Fn(CallArgs) -> impl Future<Output = Result<T, E>>` or implement `Handler::call`."
)]
pub trait Handler: Send + Sync + 'static {
    /// Execute the operation.
    fn call(&self, args: CallArgs) -> impl Future<Output = Result<Value, BoxError>> + Send;
}

impl<F, Fut, T, E> Handler for F
where
    F: Fn(CallArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send,
    T: Serialize,
    E: Into<BoxError>,
{
    fn call(&self, args: CallArgs) -> impl Future<Output = Result<Value, BoxError>> + Send {
        let fut = (self)(args);
        async move { reply(fut.await) }
    }
}

/// Dynamic object-safe version of [`Handler`].
pub trait DynHandler: Send + Sync + 'static {
    /// Execute the operation (dynamic dispatch version).
    fn call_dyn(
        &self,
        args: CallArgs,
    ) -> Pin<Box<dyn Future<Output = Result<Value, BoxError>> + Send + '_>>;
}

impl<T: Handler> DynHandler for T {
    fn call_dyn(
        &self,
        args: CallArgs,
    ) -> Pin<Box<dyn Future<Output = Result<Value, BoxError>> + Send + '_>> {
        Box::pin(self.call(args))
    }
}

/// A handler that carries its own registration data.
///
/// Implemented by `#[takumi::api]`.
pub trait ApiDef: Handler {
    /// API name; defaults to the function name.
    const NAME: &'static str;
    /// Module path of the defining unit, used to name the call's logger.
    const UNIT: &'static str;

    /// Per-API overrides layered on the registry defaults.
    fn config() -> ApiConfig {
        ApiConfig::new()
    }
}

/// Convert a handler's typed result into the dynamic reply value.
pub fn reply<T, E>(result: Result<T, E>) -> Result<Value, BoxError>
where
    T: Serialize,
    E: Into<BoxError>,
{
    let value = result.map_err(Into::into)?;
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Pong;

    impl Handler for Pong {
        async fn call(&self, _args: CallArgs) -> Result<Value, BoxError> {
            Ok(json!("pong"))
        }
    }

    #[tokio::test]
    async fn test_closure_handler_serializes_output() {
        let handler = |args: CallArgs| async move {
            let name: String = args.get(0)?;
            Ok::<_, BoxError>(format!("Hello {name}"))
        };
        let out = handler.call(CallArgs::new().arg("world")).await.unwrap();
        assert_eq!(out, json!("Hello world"));
    }

    #[tokio::test]
    async fn test_closure_handler_error() {
        let handler = |_args: CallArgs| async move { Err::<(), _>(std::io::Error::other("nope")) };
        let err = handler.call(CallArgs::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "nope");
    }

    #[tokio::test]
    async fn test_dyn_handler() {
        let handler: Box<dyn DynHandler> = Box::new(Pong);
        assert_eq!(handler.call_dyn(CallArgs::new()).await.unwrap(), json!("pong"));
    }
}
