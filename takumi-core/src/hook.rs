//! # Hooks
//!
//! A hook is a callback registered against a named event. The dispatch
//! pipeline fires `before_api_call` and `api_called` with the execution
//! context; the service runtime fires `init_process` with the application
//! settings as keyword arguments. Any other event name is equally valid.
//!
//! Hooks hold no per-call state: everything they need arrives in
//! [`HookArgs`]. Their return values are collected by the registry in
//! registration order.
//!
//! # Static vs Dynamic Dispatch
//!
//! [`Hook`] uses `async fn` for static dispatch. The registry stores hooks as
//! [`DynHook`] trait objects; every `Hook` is a `DynHook` through a blanket
//! implementation.

use crate::{
    args::CallArgs,
    context::Context,
    error::{BoxError, ContextError},
};
use serde_json::{Map, Value};
use std::{future::Future, pin::Pin};

/// Arguments passed to every hook of one fan-out.
#[derive(Debug, Default)]
pub struct HookArgs<'a> {
    context: Option<&'a Context>,
    call: CallArgs,
}

impl<'a> HookArgs<'a> {
    /// No arguments at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Pass the execution context.
    pub fn context(ctx: &'a Context) -> Self {
        Self {
            context: Some(ctx),
            call: CallArgs::new(),
        }
    }

    /// Pass explicit positional/keyword values.
    pub fn values(call: CallArgs) -> Self {
        Self {
            context: None,
            call,
        }
    }

    /// The execution context, if this event carries one.
    pub fn ctx(&self) -> Result<&'a Context, ContextError> {
        self.context
            .ok_or_else(|| ContextError::MissingField("context".to_string()))
    }

    /// Positional values.
    pub fn args(&self) -> &[Value] {
        self.call.args()
    }

    /// Keyword values.
    pub fn kwargs(&self) -> &Map<String, Value> {
        self.call.kwargs()
    }

    /// Positional and keyword values together.
    pub fn call_args(&self) -> &CallArgs {
        &self.call
    }
}

/// A callback fired for a named event.
///
/// Returning an error aborts the remaining hooks of the fan-out and, when
/// fired by the dispatch table, the call itself.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `Hook`",
    label = "missing `Hook` implementation",
    note = "Hooks must implement `on_event`; plain closures can be registered with `register_fn`."
)]
pub trait Hook: Send + Sync + 'static {
    /// Called when the event is dispatched.
    fn on_event(
        &self,
        args: &HookArgs<'_>,
    ) -> impl Future<Output = Result<Value, BoxError>> + Send;
}

/// A hook bound to the event it listens on.
///
/// Implemented by `#[takumi::hook]`.
pub trait HookDef: Hook {
    /// The event name to register under.
    const EVENT: &'static str;
}

/// Dynamic object-safe version of [`Hook`].
pub trait DynHook: Send + Sync + 'static {
    /// Called when the event is dispatched (dynamic dispatch version).
    fn on_event_dyn<'a>(
        &'a self,
        args: &'a HookArgs<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<Value, BoxError>> + Send + 'a>>;
}

impl<T: Hook> DynHook for T {
    fn on_event_dyn<'a>(
        &'a self,
        args: &'a HookArgs<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<Value, BoxError>> + Send + 'a>> {
        Box::pin(self.on_event(args))
    }
}

/// Adapts a synchronous closure into a [`Hook`].
pub struct FnHook<F> {
    func: F,
}

impl<F> FnHook<F>
where
    F: Fn(&HookArgs<'_>) -> Result<Value, BoxError> + Send + Sync + 'static,
{
    /// Wrap `func`.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Hook for FnHook<F>
where
    F: Fn(&HookArgs<'_>) -> Result<Value, BoxError> + Send + Sync + 'static,
{
    async fn on_event(&self, args: &HookArgs<'_>) -> Result<Value, BoxError> {
        (self.func)(args)
    }
}
