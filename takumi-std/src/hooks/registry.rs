//! Hook registry.
//!
//! Maps event names to ordered hook lists. Registration happens during
//! startup through `&mut` access; once the registry is handed to a service
//! it is frozen behind an `Arc` and shared by every dispatch table.

use super::{API_CALLED, ApiCalledHook, INIT_PROCESS, LogSetupHook};
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};
use takumi_core::{BoxError, ContextError, DynHook, FnHook, Hook, HookArgs, HookDef, HookError};

/// Prefix of the capability spelling accepted by [`HookRegistry::on`].
pub const CAPABILITY_PREFIX: &str = "on_";

/// Event name to ordered hooks.
///
/// # Example
/// ```ignore
/// let mut registry = HookRegistry::new();
/// registry.register_fn_mut("api_called", |args| Ok(json!(args.ctx()?.api_name()?)));
///
/// let results = registry.dispatch("api_called", &HookArgs::context(&ctx)).await?;
/// ```
#[derive(Default, Clone)]
pub struct HookRegistry {
    hooks: HashMap<String, Vec<Arc<dyn DynHook>>>,
}

impl HookRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the default `api_called` logger and the
    /// `init_process` log setup.
    pub fn with_defaults() -> Self {
        Self::new()
            .register(API_CALLED, ApiCalledHook::new())
            .register(INIT_PROCESS, LogSetupHook)
    }

    /// Append a hook for `event`.
    pub fn register<H: Hook>(mut self, event: impl Into<String>, hook: H) -> Self {
        self.register_mut(event, hook);
        self
    }

    /// Append a hook for `event` (mutable version).
    ///
    /// Registering the same hook twice runs it twice.
    pub fn register_mut<H: Hook>(&mut self, event: impl Into<String>, hook: H) {
        self.register_shared_mut(event, Arc::new(hook));
    }

    /// Append an already shared hook.
    pub fn register_shared_mut(&mut self, event: impl Into<String>, hook: Arc<dyn DynHook>) {
        self.hooks.entry(event.into()).or_default().push(hook);
    }

    /// Append a hook that names its own event.
    pub fn register_def<H: HookDef>(self, hook: H) -> Self {
        self.register(H::EVENT, hook)
    }

    /// Append a hook that names its own event (mutable version).
    pub fn register_def_mut<H: HookDef>(&mut self, hook: H) {
        self.register_mut(H::EVENT, hook);
    }

    /// Append a synchronous closure.
    pub fn register_fn<F>(self, event: impl Into<String>, func: F) -> Self
    where
        F: Fn(&HookArgs<'_>) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.register(event, FnHook::new(func))
    }

    /// Append a synchronous closure (mutable version).
    pub fn register_fn_mut<F>(&mut self, event: impl Into<String>, func: F)
    where
        F: Fn(&HookArgs<'_>) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.register_mut(event, FnHook::new(func));
    }

    /// Append every hook of `other` after the ones already registered.
    pub fn extend(&mut self, other: HookRegistry) {
        for (event, hooks) in other.hooks {
            self.hooks.entry(event).or_default().extend(hooks);
        }
    }

    /// Number of hooks registered for `event`.
    pub fn count(&self, event: &str) -> usize {
        self.hooks.get(event).map_or(0, Vec::len)
    }

    /// Check if no hook is registered at all.
    pub fn is_empty(&self) -> bool {
        self.hooks.values().all(Vec::is_empty)
    }

    /// Names of the events that have hooks.
    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.hooks.keys().map(String::as_str)
    }

    /// Run every hook of `event` in registration order.
    ///
    /// Returns one value per hook. An event nobody listens to yields an empty
    /// vector. The first failing hook aborts the fan-out.
    pub async fn dispatch(&self, event: &str, args: &HookArgs<'_>) -> Result<Vec<Value>, HookError> {
        let Some(hooks) = self.hooks.get(event) else {
            return Ok(Vec::new());
        };

        let mut results = Vec::with_capacity(hooks.len());
        for hook in hooks {
            let value = hook
                .on_event_dyn(args)
                .await
                .map_err(|err| hook_error(event, err))?;
            results.push(value);
        }
        Ok(results)
    }

    /// Resolve an `on_<event>` capability.
    ///
    /// Any other spelling is rejected with [`HookError::UnknownCapability`],
    /// whether or not hooks exist under that name.
    pub fn on<'a>(&'a self, capability: &'a str) -> Result<Capability<'a>, HookError> {
        match capability.strip_prefix(CAPABILITY_PREFIX) {
            Some(event) if !event.is_empty() => Ok(Capability {
                registry: self,
                event,
            }),
            _ => Err(HookError::UnknownCapability(capability.to_string())),
        }
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (event, hooks) in &self.hooks {
            map.entry(event, &hooks.len());
        }
        map.finish()
    }
}

/// A resolved `on_<event>` accessor.
#[derive(Debug, Clone, Copy)]
pub struct Capability<'a> {
    registry: &'a HookRegistry,
    event: &'a str,
}

impl Capability<'_> {
    /// The event name with the prefix stripped.
    pub fn event(&self) -> &str {
        self.event
    }

    /// Dispatch the event.
    pub async fn call(&self, args: &HookArgs<'_>) -> Result<Vec<Value>, HookError> {
        self.registry.dispatch(self.event, args).await
    }
}

// Context misuse inside a hook stays a context error.
fn hook_error(event: &str, err: BoxError) -> HookError {
    match err.downcast::<ContextError>() {
        Ok(ctx_err) => HookError::Context(*ctx_err),
        Err(err) => HookError::failed(event, err),
    }
}
