//! Error types for Takumi.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`DispatchError`] - Errors surfaced to the caller of an API
//! - [`HookError`] - Errors from the hook registry and hook callbacks
//! - [`ContextError`] - Reads of unset execution context fields
//! - [`ArgError`] - Typed argument extraction failures

use std::{sync::Arc, time::Duration};
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A reference-counted error, used where one error is both stored and returned.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while invoking an API through the dispatch table.
///
/// Cloning is cheap: handler and hook errors are shared behind an `Arc`, so
/// the value recorded in the context's `exc` field is the same one returned
/// to the caller.
#[derive(Error, Debug, Clone)]
pub enum DispatchError {
    /// The requested API is not registered.
    #[error("unknown api: {0}")]
    UnknownApi(String),

    /// The handler did not finish within its hard timeout and was cancelled.
    #[error("api call cancelled after hard timeout of {0:?}")]
    HardTimeout(Duration),

    /// The handler itself returned an error (or panicked).
    #[error(transparent)]
    Handler(SharedError),

    /// A hook callback failed and aborted the call.
    #[error(transparent)]
    Hook(#[from] HookError),
}

impl DispatchError {
    /// Wrap an error returned by a handler.
    pub fn handler(err: BoxError) -> Self {
        DispatchError::Handler(Arc::from(err))
    }

    /// Whether this error is the hard-timeout cancellation.
    pub fn is_hard_timeout(&self) -> bool {
        matches!(self, DispatchError::HardTimeout(_))
    }

    /// Whether the API name did not resolve.
    pub fn is_unknown_api(&self) -> bool {
        matches!(self, DispatchError::UnknownApi(_))
    }
}

/// Errors that can occur in the hook registry.
#[derive(Error, Debug, Clone)]
pub enum HookError {
    /// The accessor was called with a name outside the `on_<event>` convention.
    #[error("no such capability: {0}")]
    UnknownCapability(String),

    /// A hook registered for `event` returned an error.
    #[error("hook for `{event}` failed: {source}")]
    Failed {
        /// The event being dispatched.
        event: String,
        /// The hook's error.
        #[source]
        source: SharedError,
    },

    /// The hook read a context field that was not set.
    #[error(transparent)]
    Context(#[from] ContextError),
}

impl HookError {
    /// Build a [`HookError::Failed`] from a hook's boxed error.
    pub fn failed(event: impl Into<String>, err: BoxError) -> Self {
        HookError::Failed {
            event: event.into(),
            source: Arc::from(err),
        }
    }
}

/// Errors raised by [`Context`](crate::Context) accessors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// The field has not been set since the last reset.
    #[error("missing context field: {0}")]
    MissingField(String),
}

/// Errors raised when extracting typed arguments from [`CallArgs`](crate::CallArgs).
#[derive(Error, Debug)]
pub enum ArgError {
    /// No positional argument at this index.
    #[error("missing positional argument {0}")]
    MissingPositional(usize),

    /// No keyword argument with this name.
    #[error("missing keyword argument `{0}`")]
    MissingKeyword(String),

    /// The argument exists but does not deserialize into the requested type.
    #[error("invalid argument `{name}`: {source}")]
    Invalid {
        /// Index or keyword of the argument.
        name: String,
        /// The deserialization error.
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hard_timeout_is_distinguishable() {
        let err = DispatchError::HardTimeout(Duration::from_secs(2));
        assert!(err.is_hard_timeout());
        assert!(!err.is_unknown_api());
        assert!(err.to_string().contains("2s"));

        let err = DispatchError::handler("boom".into());
        assert!(!err.is_hard_timeout());
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_clone_shares_handler_error() {
        let err = DispatchError::handler("shared".into());
        let cloned = err.clone();
        match (&err, &cloned) {
            (DispatchError::Handler(a), DispatchError::Handler(b)) => assert!(Arc::ptr_eq(a, b)),
            _ => panic!("Expected handler errors"),
        }
    }

    #[test]
    fn test_hook_failure_keeps_source() {
        let err = HookError::failed("api_called", "bad hook".into());
        assert_eq!(err.to_string(), "hook for `api_called` failed: bad hook");
        assert!(std::error::Error::source(&err).is_some());
    }
}
