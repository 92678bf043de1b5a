//! The dispatch table.
//!
//! An [`ApiMap`] turns an API name and its arguments into a handler
//! invocation. Every call runs through the same pipeline:
//!
//! 1. reset the context, keeping only `env`
//! 2. fill in the call's fields (name, arguments, logger, timeouts)
//! 3. fire `before_api_call`
//! 4. run the handler under its hard timeout
//! 5. record the outcome and the end time
//! 6. fire `api_called`
//!
//! The soft timeout never interrupts anything; it only changes how the
//! default `api_called` hook reports the call.

use crate::{
    api::{ApiHandler, ApiTable},
    hooks::{API_CALLED, BEFORE_API_CALL, HookRegistry},
    logger::TracingLoggerFactory,
};
use futures::FutureExt;
use serde_json::Value;
use std::{any::Any, panic::AssertUnwindSafe, sync::Arc, time::Instant};
use takumi_core::{CallArgs, Context, DispatchError, Env, HookArgs, LoggerFactory};
use thiserror::Error;
use tokio::time::timeout;

/// A handler panicked instead of returning.
#[derive(Error, Debug, Clone)]
#[error("handler panicked: {0}")]
pub struct HandlerPanic(pub String);

impl HandlerPanic {
    fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(message) => (*message).to_string(),
                Err(_) => "non-string panic payload".to_string(),
            },
        };
        HandlerPanic(message)
    }
}

/// The callable API surface of one connection.
///
/// All tables of a service share the handler table and hook registry; each
/// owns its [`Context`]. Calls take `&mut self`, so calls on one table never
/// overlap.
///
/// # Example
///
/// ```rust,ignore
/// let mut api_map = ApiMap::new(apis, hooks, Env::new("127.0.0.1:4000"));
///
/// let pong = api_map.call("ping", CallArgs::new()).await?;
/// assert_eq!(api_map.context().api_name()?, "ping");
/// ```
pub struct ApiMap {
    apis: Arc<ApiTable>,
    hooks: Arc<HookRegistry>,
    loggers: Arc<dyn LoggerFactory>,
    ctx: Context,
}

impl ApiMap {
    /// Create a table whose context carries `env`.
    ///
    /// Per-call loggers come from a [`TracingLoggerFactory`].
    pub fn new(apis: Arc<ApiTable>, hooks: Arc<HookRegistry>, env: Env) -> Self {
        Self {
            apis,
            hooks,
            loggers: Arc::new(TracingLoggerFactory::new()),
            ctx: Context::with_env(env),
        }
    }

    /// Replace the logger factory.
    pub fn with_logger_factory(mut self, loggers: Arc<dyn LoggerFactory>) -> Self {
        self.loggers = loggers;
        self
    }

    /// A table for another connection, sharing handlers, hooks and loggers.
    pub fn fork(&self, env: Env) -> Self {
        Self {
            apis: Arc::clone(&self.apis),
            hooks: Arc::clone(&self.hooks),
            loggers: Arc::clone(&self.loggers),
            ctx: Context::with_env(env),
        }
    }

    /// The execution context as left by the last call.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Replace the connection metadata.
    pub fn set_env(&mut self, env: Env) {
        self.ctx.set_env(env);
    }

    /// Look up an API.
    pub fn get(&self, name: &str) -> Option<&ApiHandler> {
        self.apis.get(name)
    }

    /// Check if `name` resolves.
    pub fn contains(&self, name: &str) -> bool {
        self.apis.contains_key(name)
    }

    /// Names of the callable APIs.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.apis.keys().map(String::as_str)
    }

    /// Call `name` with `args`.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::UnknownApi`] if `name` is not registered; no hook fires
    /// - [`DispatchError::Hook`] if a `before_api_call` or `api_called` hook fails
    /// - [`DispatchError::HardTimeout`] if the handler was cancelled
    /// - [`DispatchError::Handler`] if the handler failed or panicked
    pub async fn call(&mut self, name: &str, args: CallArgs) -> Result<Value, DispatchError> {
        let apis = Arc::clone(&self.apis);
        let Some(handler) = apis.get(name) else {
            tracing::debug!(api = name, "unknown api");
            return Err(DispatchError::UnknownApi(name.to_string()));
        };

        let soft_timeout = handler.soft_timeout();
        let hard_timeout = handler.hard_timeout();
        let logger = self.loggers.get_logger(handler.unit());

        let ctx = &mut self.ctx;
        ctx.reset_preserving(&[Context::ENV]);
        ctx.set_args(args.args().to_vec());
        ctx.set_kwargs(args.kwargs().clone());
        ctx.set_api_name(name);
        ctx.set_start_at(now());
        ctx.set_logger(Arc::clone(&logger));
        ctx.set_soft_timeout(soft_timeout);
        ctx.set_hard_timeout(hard_timeout);

        if hard_timeout < soft_timeout {
            logger.warning(&format!(
                "Api soft timeout {}s greater than hard timeout {}s",
                handler.config().soft_timeout_secs(),
                handler.config().hard_timeout_secs()
            ));
        }

        ctx.set_exc(None);

        self.hooks
            .dispatch(BEFORE_API_CALL, &HookArgs::context(&self.ctx))
            .await?;

        let invocation = AssertUnwindSafe(handler.func().call_dyn(args)).catch_unwind();
        let outcome = match timeout(hard_timeout, invocation).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(err))) => Err(DispatchError::handler(err)),
            Ok(Err(payload)) => Err(DispatchError::handler(Box::new(
                HandlerPanic::from_payload(payload),
            ))),
            Err(_) => Err(DispatchError::HardTimeout(hard_timeout)),
        };

        match &outcome {
            Ok(value) => self.ctx.set_return_value(value.clone()),
            Err(err) => self.ctx.set_exc(Some(err.clone())),
        }
        self.ctx.set_end_at(now());

        self.hooks
            .dispatch(API_CALLED, &HookArgs::context(&self.ctx))
            .await?;

        outcome
    }
}

impl std::fmt::Debug for ApiMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiMap")
            .field("apis", &self.apis.len())
            .field("hooks", &self.hooks)
            .field("ctx", &self.ctx)
            .finish_non_exhaustive()
    }
}

// Follows tokio's clock so paused-time tests see consistent elapsed values.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}
