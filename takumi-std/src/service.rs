//! Service runtime.
//!
//! A [`Service`] owns the frozen API table and hook registry of an
//! application and serves connections. Each connection gets its own
//! [`ApiMap`] and is driven through a [`Codec`], which hides framing,
//! encoding and socket I/O.
//!
//! # Example
//!
//! ```rust,ignore
//! let service = Arc::new(Service::from_env(app)?);
//! service.init_process().await?;
//!
//! loop {
//!     let (codec, peer) = accept().await?;
//!     service.spawn(codec, Env::new(peer.to_string()));
//! }
//! ```

use crate::{
    api::{ApiTable, ServiceHandler},
    config::{AppConfig, ConfigError},
    dispatch::ApiMap,
    hooks::{HookRegistry, INIT_PROCESS},
    logger::TracingLoggerFactory,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use takumi_core::{BoxError, CallArgs, DispatchError, Env, HookArgs, HookError, LoggerFactory};
use thiserror::Error;
use tokio::task::JoinHandle;

/// Suffix every service-definition module name carries.
pub const MODULE_SUFFIX: &str = "_thrift";

/// The service definition an application is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDefinition {
    path: PathBuf,
    module_name: String,
    service_name: String,
}

impl ServiceDefinition {
    /// Bind `service_name` in the definition file at `path`.
    ///
    /// The module is named after the file stem, with `_thrift` appended
    /// unless the stem already ends with it.
    pub fn resolve(path: impl AsRef<Path>, service_name: impl Into<String>) -> Self {
        let path = path.as_ref();
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let module_name = if stem.ends_with(MODULE_SUFFIX) {
            stem
        } else {
            format!("{stem}{MODULE_SUFFIX}")
        };
        Self {
            path: path.to_path_buf(),
            module_name,
            service_name: service_name.into(),
        }
    }

    /// Path of the definition file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Module name the definition is loaded under.
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Service within the module.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

/// One decoded inbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// API name.
    pub api: String,
    /// Decoded arguments.
    pub args: CallArgs,
}

impl Call {
    /// Create a call of `api`.
    pub fn new(api: impl Into<String>, args: CallArgs) -> Self {
        Self {
            api: api.into(),
            args,
        }
    }
}

/// Classification of an error reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The API is not registered.
    UnknownApi,
    /// The handler ran past its hard timeout.
    Timeout,
    /// The handler or a hook failed.
    Internal,
}

/// The outcome of a call, as handed to the codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reply {
    /// The handler's return value.
    Value(Value),
    /// The call failed.
    Error {
        /// What kind of failure.
        kind: ErrorKind,
        /// Display form of the error.
        message: String,
    },
}

impl Reply {
    /// Whether this is an error reply.
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error { .. })
    }
}

impl From<&DispatchError> for Reply {
    fn from(err: &DispatchError) -> Self {
        let kind = match err {
            DispatchError::UnknownApi(_) => ErrorKind::UnknownApi,
            DispatchError::HardTimeout(_) => ErrorKind::Timeout,
            _ => ErrorKind::Internal,
        };
        Reply::Error {
            kind,
            message: err.to_string(),
        }
    }
}

/// The wire boundary of one connection.
#[async_trait]
pub trait Codec: Send {
    /// Read the next call. `None` means the peer closed the connection.
    async fn read_call(&mut self) -> Result<Option<Call>, BoxError>;

    /// Write the reply to the call just read.
    async fn write_reply(&mut self, reply: Reply) -> Result<(), BoxError>;

    /// Release the connection. Called once when serving ends.
    async fn close(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Errors that end serving.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Reading, writing or closing the connection failed.
    #[error("codec failure: {0}")]
    Codec(#[source] BoxError),

    /// An `init_process` hook failed.
    #[error(transparent)]
    Hook(#[from] HookError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A runnable service.
///
/// Cheap to share behind an `Arc`; every connection borrows the same API
/// table and hook registry.
pub struct Service {
    definition: ServiceDefinition,
    config: AppConfig,
    apis: Arc<ApiTable>,
    hooks: Arc<HookRegistry>,
    loggers: Arc<dyn LoggerFactory>,
}

impl Service {
    /// Install `handler` with the default hooks.
    pub fn new(handler: ServiceHandler, config: &AppConfig) -> Self {
        Self::with_hooks(handler, config, HookRegistry::with_defaults())
    }

    /// Read settings from the TOML file at `path`, then [`new`](Self::new).
    pub fn from_config_file(
        handler: ServiceHandler,
        path: impl AsRef<Path>,
    ) -> Result<Self, ServiceError> {
        let config = AppConfig::from_file(path)?;
        Ok(Self::new(handler, &config))
    }

    /// Read settings from `$TAKUMI_CONFIG` (or `app.toml`), then [`new`](Self::new).
    pub fn from_env(handler: ServiceHandler) -> Result<Self, ServiceError> {
        let config = AppConfig::load()?;
        Ok(Self::new(handler, &config))
    }

    /// Install `handler` on top of `base` hooks.
    ///
    /// The handler's own hooks run after the base hooks.
    pub fn with_hooks(handler: ServiceHandler, config: &AppConfig, mut base: HookRegistry) -> Self {
        let definition = ServiceDefinition::resolve(&config.thrift_file, handler.service_name());
        let (_, apis, app_hooks) = handler.into_parts();
        base.extend(app_hooks);

        tracing::debug!(
            service = definition.service_name(),
            module = definition.module_name(),
            apis = apis.len(),
            "service installed"
        );

        Self {
            definition,
            config: config.clone(),
            apis: Arc::new(apis),
            hooks: Arc::new(base),
            loggers: Arc::new(TracingLoggerFactory::new()),
        }
    }

    /// Replace the logger factory used for per-call loggers.
    pub fn with_logger_factory(mut self, loggers: Arc<dyn LoggerFactory>) -> Self {
        self.loggers = loggers;
        self
    }

    /// The bound service definition.
    pub fn definition(&self) -> &ServiceDefinition {
        &self.definition
    }

    /// Application settings.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The installed hooks.
    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// The installed APIs.
    pub fn apis(&self) -> &ApiTable {
        &self.apis
    }

    /// Fire `init_process` with the application settings as keyword arguments.
    pub async fn init_process(&self) -> Result<Vec<Value>, ServiceError> {
        let args = HookArgs::values(self.config.log_args());
        Ok(self.hooks.dispatch(INIT_PROCESS, &args).await?)
    }

    /// A dispatch table for one connection.
    pub fn api_map(&self, env: Env) -> ApiMap {
        ApiMap::new(Arc::clone(&self.apis), Arc::clone(&self.hooks), env)
            .with_logger_factory(Arc::clone(&self.loggers))
    }

    /// Serve one connection until the peer closes it.
    ///
    /// Call errors are written back as error replies and serving goes on;
    /// codec errors end it. The codec is closed in every case.
    pub async fn serve<C: Codec>(&self, mut codec: C, env: Env) -> Result<(), ServiceError> {
        let client = env.client_addr().to_string();
        let mut api_map = self.api_map(env);

        let served = Self::run(&mut api_map, &mut codec).await;
        let closed = codec.close().await.map_err(ServiceError::Codec);

        match &served {
            Ok(()) => tracing::debug!(%client, "connection closed"),
            Err(err) => tracing::warn!(%client, error = %err, "connection aborted"),
        }
        served.and(closed)
    }

    async fn run<C: Codec>(api_map: &mut ApiMap, codec: &mut C) -> Result<(), ServiceError> {
        while let Some(call) = codec.read_call().await.map_err(ServiceError::Codec)? {
            let reply = match api_map.call(&call.api, call.args).await {
                Ok(value) => Reply::Value(value),
                Err(err) => Reply::from(&err),
            };
            codec.write_reply(reply).await.map_err(ServiceError::Codec)?;
        }
        Ok(())
    }

    /// Serve one connection on its own task.
    pub fn spawn<C>(self: &Arc<Self>, codec: C, env: Env) -> JoinHandle<Result<(), ServiceError>>
    where
        C: Codec + 'static,
    {
        let service = Arc::clone(self);
        tokio::spawn(async move { service.serve(codec, env).await })
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("definition", &self.definition)
            .field("apis", &self.apis.len())
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}
