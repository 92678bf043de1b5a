//! # Execution Context
//!
//! The per-call state bag threaded through dispatch and hooks.
//!
//! A [`Context`] belongs to exactly one dispatch table (and so to one
//! connection). It is reset in place at the start of every call instead of
//! being reallocated; only the long-lived `env` survives the reset.
//!
//! Reading a field that has not been set since the last reset is an error
//! ([`ContextError::MissingField`]), never a silent default.

use crate::{
    error::{ContextError, DispatchError},
    logger::Logger,
};
use serde_json::{Map, Value};
use std::{
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

/// Connection metadata that outlives individual calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Env {
    client_addr: String,
    meta: Map<String, Value>,
}

impl Env {
    /// Create an env for the client identified by `client_addr`.
    pub fn new(client_addr: impl Into<String>) -> Self {
        Self {
            client_addr: client_addr.into(),
            meta: Map::new(),
        }
    }

    /// Attach a metadata entry.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// The client identifier used in log lines.
    pub fn client_addr(&self) -> &str {
        &self.client_addr
    }

    /// Look up a metadata entry.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.meta.get(key)
    }
}

/// The execution context of one dispatch table.
#[derive(Clone, Default)]
pub struct Context {
    env: Option<Env>,
    api_name: Option<String>,
    args: Option<Vec<Value>>,
    kwargs: Option<Map<String, Value>>,
    start_at: Option<Instant>,
    end_at: Option<Instant>,
    logger: Option<Arc<dyn Logger>>,
    soft_timeout: Option<Duration>,
    hard_timeout: Option<Duration>,
    exc: Option<Option<DispatchError>>,
    return_value: Option<Value>,
    extras: Map<String, Value>,
}

fn missing(name: &str) -> ContextError {
    ContextError::MissingField(name.to_string())
}

impl Context {
    /// Long-lived connection metadata.
    pub const ENV: &'static str = "env";
    /// Name of the API being called.
    pub const API_NAME: &'static str = "api_name";
    /// Positional arguments.
    pub const ARGS: &'static str = "args";
    /// Keyword arguments.
    pub const KWARGS: &'static str = "kwargs";
    /// Call start timestamp.
    pub const START_AT: &'static str = "start_at";
    /// Call end timestamp.
    pub const END_AT: &'static str = "end_at";
    /// Logger of the handler's defining unit.
    pub const LOGGER: &'static str = "logger";
    /// Advisory budget.
    pub const SOFT_TIMEOUT: &'static str = "soft_timeout";
    /// Enforced budget.
    pub const HARD_TIMEOUT: &'static str = "hard_timeout";
    /// Error raised by the call, if any.
    pub const EXC: &'static str = "exc";
    /// Value returned by the handler.
    pub const RETURN_VALUE: &'static str = "return_value";

    /// An empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty context carrying `env`.
    pub fn with_env(env: Env) -> Self {
        Self {
            env: Some(env),
            ..Self::default()
        }
    }

    /// Clear every field except those named in `keep`.
    ///
    /// Applies to typed fields and extras alike.
    pub fn reset_preserving(&mut self, keep: &[&str]) {
        let keeps = |name: &str| keep.contains(&name);
        if !keeps(Self::ENV) {
            self.env = None;
        }
        if !keeps(Self::API_NAME) {
            self.api_name = None;
        }
        if !keeps(Self::ARGS) {
            self.args = None;
        }
        if !keeps(Self::KWARGS) {
            self.kwargs = None;
        }
        if !keeps(Self::START_AT) {
            self.start_at = None;
        }
        if !keeps(Self::END_AT) {
            self.end_at = None;
        }
        if !keeps(Self::LOGGER) {
            self.logger = None;
        }
        if !keeps(Self::SOFT_TIMEOUT) {
            self.soft_timeout = None;
        }
        if !keeps(Self::HARD_TIMEOUT) {
            self.hard_timeout = None;
        }
        if !keeps(Self::EXC) {
            self.exc = None;
        }
        if !keeps(Self::RETURN_VALUE) {
            self.return_value = None;
        }
        self.extras.retain(|key, _| keeps(key));
    }

    /// Clear every field, including `env`.
    pub fn clear(&mut self) {
        self.reset_preserving(&[]);
    }

    /// Names of the fields currently set, typed fields first.
    pub fn keys(&self) -> Vec<&str> {
        let typed = [
            (Self::ENV, self.env.is_some()),
            (Self::API_NAME, self.api_name.is_some()),
            (Self::ARGS, self.args.is_some()),
            (Self::KWARGS, self.kwargs.is_some()),
            (Self::START_AT, self.start_at.is_some()),
            (Self::END_AT, self.end_at.is_some()),
            (Self::LOGGER, self.logger.is_some()),
            (Self::SOFT_TIMEOUT, self.soft_timeout.is_some()),
            (Self::HARD_TIMEOUT, self.hard_timeout.is_some()),
            (Self::EXC, self.exc.is_some()),
            (Self::RETURN_VALUE, self.return_value.is_some()),
        ];
        typed
            .into_iter()
            .filter(|(_, set)| *set)
            .map(|(name, _)| name)
            .chain(self.extras.keys().map(String::as_str))
            .collect()
    }

    /// Whether the field `name` is set.
    pub fn contains(&self, name: &str) -> bool {
        self.keys().contains(&name)
    }

    /// Connection metadata.
    pub fn env(&self) -> Result<&Env, ContextError> {
        self.env.as_ref().ok_or_else(|| missing(Self::ENV))
    }

    /// Set the connection metadata.
    pub fn set_env(&mut self, env: Env) {
        self.env = Some(env);
    }

    /// Name of the API being called.
    pub fn api_name(&self) -> Result<&str, ContextError> {
        self.api_name.as_deref().ok_or_else(|| missing(Self::API_NAME))
    }

    /// Set the API name.
    pub fn set_api_name(&mut self, name: impl Into<String>) {
        self.api_name = Some(name.into());
    }

    /// Positional arguments of the call.
    pub fn args(&self) -> Result<&[Value], ContextError> {
        self.args.as_deref().ok_or_else(|| missing(Self::ARGS))
    }

    /// Set the positional arguments.
    pub fn set_args(&mut self, args: Vec<Value>) {
        self.args = Some(args);
    }

    /// Keyword arguments of the call.
    pub fn kwargs(&self) -> Result<&Map<String, Value>, ContextError> {
        self.kwargs.as_ref().ok_or_else(|| missing(Self::KWARGS))
    }

    /// Set the keyword arguments.
    pub fn set_kwargs(&mut self, kwargs: Map<String, Value>) {
        self.kwargs = Some(kwargs);
    }

    /// When the handler was invoked.
    pub fn start_at(&self) -> Result<Instant, ContextError> {
        self.start_at.ok_or_else(|| missing(Self::START_AT))
    }

    /// Record the start timestamp.
    pub fn set_start_at(&mut self, at: Instant) {
        self.start_at = Some(at);
    }

    /// When the handler finished or was cancelled.
    pub fn end_at(&self) -> Result<Instant, ContextError> {
        self.end_at.ok_or_else(|| missing(Self::END_AT))
    }

    /// Record the end timestamp.
    pub fn set_end_at(&mut self, at: Instant) {
        self.end_at = Some(at);
    }

    /// Time between `start_at` and `end_at`.
    pub fn elapsed(&self) -> Result<Duration, ContextError> {
        Ok(self.end_at()?.saturating_duration_since(self.start_at()?))
    }

    /// Logger of the unit that defined the handler.
    pub fn logger(&self) -> Result<&Arc<dyn Logger>, ContextError> {
        self.logger.as_ref().ok_or_else(|| missing(Self::LOGGER))
    }

    /// Set the call's logger.
    pub fn set_logger(&mut self, logger: Arc<dyn Logger>) {
        self.logger = Some(logger);
    }

    /// Advisory budget; exceeding it only raises the log level.
    pub fn soft_timeout(&self) -> Result<Duration, ContextError> {
        self.soft_timeout.ok_or_else(|| missing(Self::SOFT_TIMEOUT))
    }

    /// Set the advisory budget.
    pub fn set_soft_timeout(&mut self, timeout: Duration) {
        self.soft_timeout = Some(timeout);
    }

    /// Enforced budget after which the handler is cancelled.
    pub fn hard_timeout(&self) -> Result<Duration, ContextError> {
        self.hard_timeout.ok_or_else(|| missing(Self::HARD_TIMEOUT))
    }

    /// Set the enforced budget.
    pub fn set_hard_timeout(&mut self, timeout: Duration) {
        self.hard_timeout = Some(timeout);
    }

    /// The call's error; `Ok(None)` once cleared for a call that has not failed.
    pub fn exc(&self) -> Result<Option<&DispatchError>, ContextError> {
        self.exc
            .as_ref()
            .map(Option::as_ref)
            .ok_or_else(|| missing(Self::EXC))
    }

    /// Record the call's error, or `None` to clear it.
    pub fn set_exc(&mut self, exc: Option<DispatchError>) {
        self.exc = Some(exc);
    }

    /// Value returned by the handler.
    pub fn return_value(&self) -> Result<&Value, ContextError> {
        self.return_value
            .as_ref()
            .ok_or_else(|| missing(Self::RETURN_VALUE))
    }

    /// Record the handler's return value.
    pub fn set_return_value(&mut self, value: Value) {
        self.return_value = Some(value);
    }

    /// Read a hook-defined extra field.
    pub fn get(&self, key: &str) -> Result<&Value, ContextError> {
        self.extras.get(key).ok_or_else(|| missing(key))
    }

    /// Set a hook-defined extra field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.extras.insert(key.into(), value.into());
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("env", &self.env)
            .field("api_name", &self.api_name)
            .field("args", &self.args)
            .field("kwargs", &self.kwargs)
            .field("start_at", &self.start_at)
            .field("end_at", &self.end_at)
            .field("logger", &self.logger.as_ref().map(|l| l.name().to_string()))
            .field("soft_timeout", &self.soft_timeout)
            .field("hard_timeout", &self.hard_timeout)
            .field("exc", &self.exc)
            .field("return_value", &self.return_value)
            .field("extras", &self.extras)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reset_preserving_env() {
        let mut ctx = Context::with_env(Env::new("127.0.0.1"));
        ctx.insert("a", 1);
        ctx.insert("b", 2);
        assert_eq!(ctx.keys(), vec!["env", "a", "b"]);

        ctx.reset_preserving(&[Context::ENV]);
        assert_eq!(ctx.keys(), vec!["env"]);
        assert_eq!(ctx.env().unwrap().client_addr(), "127.0.0.1");
    }

    #[test]
    fn test_reset_preserving_named_extras() {
        let mut ctx = Context::new();
        ctx.insert("hello", 90);
        ctx.insert("world", "hello");
        ctx.insert("yes", "no");
        ctx.set_api_name("ping");

        ctx.reset_preserving(&["hello", "yes"]);
        assert_eq!(ctx.keys(), vec!["hello", "yes"]);
        assert_eq!(ctx.get("hello").unwrap(), &json!(90));
        assert_eq!(ctx.get("yes").unwrap(), &json!("no"));
    }

    #[test]
    fn test_missing_field_is_an_error() {
        let ctx = Context::new();
        assert_eq!(
            ctx.api_name().unwrap_err(),
            ContextError::MissingField("api_name".into())
        );
        assert!(ctx.exc().is_err());
        assert!(ctx.get("custom").is_err());
    }

    #[test]
    fn test_exc_cleared_is_distinct_from_unset() {
        let mut ctx = Context::new();
        ctx.set_exc(None);
        assert!(matches!(ctx.exc(), Ok(None)));

        ctx.set_exc(Some(DispatchError::UnknownApi("x".into())));
        assert!(ctx.exc().unwrap().unwrap().is_unknown_api());
    }

    #[test]
    fn test_elapsed() {
        let mut ctx = Context::new();
        let start = Instant::now();
        ctx.set_start_at(start);
        assert!(ctx.elapsed().is_err());
        ctx.set_end_at(start + Duration::from_millis(1500));
        assert_eq!(ctx.elapsed().unwrap(), Duration::from_millis(1500));
    }
}
