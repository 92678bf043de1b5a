//! Hook registry and the standard hooks.
//!
//! Events fired by the pipeline:
//!
//! - [`BEFORE_API_CALL`] - with the context, just before the handler runs
//! - [`API_CALLED`] - with the context, after the handler finished or failed
//! - [`INIT_PROCESS`] - once per process, with the application settings

mod api;
mod log;
mod registry;

pub use api::{ApiCalledHook, HEALTH_CHECK_API, format_millis};
pub use log::{LogSettings, LogSetupHook, LogStyle, SyslogFormat};
pub use registry::{CAPABILITY_PREFIX, Capability, HookRegistry};

/// Fired with the context before the handler is invoked.
pub const BEFORE_API_CALL: &str = "before_api_call";

/// Fired with the context after the handler completed, failed or timed out.
pub const API_CALLED: &str = "api_called";

/// Fired once by the service runtime before serving begins.
pub const INIT_PROCESS: &str = "init_process";
