//! # takumi-core
//!
//! Core traits and types for the Takumi RPC dispatch pipeline.
//!
//! This crate has minimal dependencies and is meant to be imported by hook
//! and handler libraries that don't need the full `takumi-std` runtime.
//!
//! # Building Blocks
//!
//! - [`Handler`]: one API operation, `CallArgs -> Result<Value, BoxError>`
//! - [`Hook`]: a callback fired for a named event with [`HookArgs`]
//! - [`Context`]: the per-call state bag threaded through dispatch and hooks
//! - [`ApiConfig`]: layered per-API settings (timeouts plus hook options)
//! - [`Logger`] / [`LoggerFactory`]: the logger-by-name lookup
//!
//! # Error Types
//!
//! - [`DispatchError`] - What callers of an API observe
//! - [`HookError`] - Hook registry and hook callback errors
//! - [`ContextError`] - Unset context fields
//! - [`ArgError`] - Typed argument extraction

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod args;
mod config;
mod context;
mod error;
mod handler;
mod hook;
mod logger;

// Re-exports
pub use args::{CallArgs, DisplayArgs};
pub use config::{ApiConfig, DEFAULT_HARD_TIMEOUT, DEFAULT_SOFT_TIMEOUT, secs_to_duration};
pub use context::{Context, Env};
pub use error::{ArgError, BoxError, ContextError, DispatchError, HookError, SharedError};
pub use handler::{ApiDef, DynHandler, Handler, reply};
pub use hook::{DynHook, FnHook, Hook, HookArgs, HookDef};
pub use logger::{Level, Logger, LoggerFactory};
