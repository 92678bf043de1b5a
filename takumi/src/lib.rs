//! # takumi - RPC dispatch pipeline
//!
//! `takumi` turns a set of named async handlers into a callable API surface.
//! Every call gets lifecycle tracking in an execution [`Context`], a soft
//! (advisory) and a hard (enforced) time budget, and `before_api_call` /
//! `api_called` hooks for cross-cutting concerns.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use takumi::prelude::*;
//!
//! #[takumi::api(soft_timeout = 1)]
//! async fn hello(args: CallArgs) -> Result<String, BoxError> {
//!     let name: String = args.param(0, "name")?;
//!     Ok(format!("Hello {name}"))
//! }
//!
//! let mut app = ServiceHandler::new("HelloService");
//! app.api(hello);
//!
//! let service = Arc::new(Service::new(app, &AppConfig::load()?));
//! service.init_process().await?;
//! service.spawn(codec, Env::new(peer_addr));
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use takumi_core::{
    // Registration data
    ApiConfig,
    ApiDef,
    // Errors
    ArgError,
    BoxError,
    // Arguments
    CallArgs,
    // Context
    Context,
    ContextError,
    DEFAULT_HARD_TIMEOUT,
    DEFAULT_SOFT_TIMEOUT,
    DispatchError,
    DisplayArgs,
    DynHandler,
    DynHook,
    Env,
    FnHook,
    // Handler
    Handler,
    // Hook
    Hook,
    HookArgs,
    HookDef,
    HookError,
    // Logging
    Level,
    Logger,
    LoggerFactory,
    SharedError,
    reply,
    secs_to_duration,
};

pub use takumi_std::{
    api::{ApiHandler, ApiTable, DEFAULT_UNIT, ServiceHandler, ServiceModule},
    config::{AppConfig, ConfigError},
    dispatch::{ApiMap, HandlerPanic},
    hooks::{API_CALLED, BEFORE_API_CALL, Capability, HookRegistry, INIT_PROCESS},
    logger::{TracingLogger, TracingLoggerFactory},
    service::{Call, Codec, ErrorKind, Reply, Service, ServiceDefinition, ServiceError},
};

/// Dynamic value type of arguments and return values.
pub use serde_json;

/// Standard hook implementations.
pub mod hooks {
    #![allow(clippy::wildcard_imports)]
    pub use takumi_std::hooks::*;
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use takumi_std::testing::*;
}

/// Prelude module - common imports for Takumi.
///
/// # Usage
///
/// ```rust,ignore
/// use takumi::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        ApiConfig, ApiMap, AppConfig, BoxError, CallArgs, Codec, Context, DispatchError, Env,
        Handler, Hook, HookArgs, HookRegistry, Reply, Service, ServiceHandler, ServiceModule,
    };
    pub use serde_json::{Value, json};
}

#[cfg(feature = "macros")]
pub use takumi_macros::{api, hook};
