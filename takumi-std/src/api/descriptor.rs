//! API descriptor.

use serde_json::Value;
use std::{borrow::Cow, fmt, sync::Arc, time::Duration};
use takumi_core::{ApiConfig, BoxError, CallArgs, DynHandler};

/// Unit name of handlers registered without one.
pub const DEFAULT_UNIT: &str = "takumi";

/// A handler together with its resolved configuration.
///
/// Cloning is cheap and keeps the same underlying handler, so
/// [`ApiHandler::same_func`] still holds after a module is merged into
/// another one.
#[derive(Clone)]
pub struct ApiHandler {
    func: Arc<dyn DynHandler>,
    config: ApiConfig,
    unit: Cow<'static, str>,
}

impl ApiHandler {
    /// Bind `func` to `config`.
    pub fn new(func: Arc<dyn DynHandler>, config: ApiConfig) -> Self {
        Self {
            func,
            config,
            unit: Cow::Borrowed(DEFAULT_UNIT),
        }
    }

    /// Name the unit the handler was defined in; the call's logger is looked
    /// up by this name.
    pub fn with_unit(mut self, unit: impl Into<Cow<'static, str>>) -> Self {
        self.unit = unit.into();
        self
    }

    /// The wrapped handler.
    pub fn func(&self) -> &Arc<dyn DynHandler> {
        &self.func
    }

    /// Check whether both descriptors wrap the identical handler.
    pub fn same_func(&self, other: &ApiHandler) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }

    /// Resolved configuration.
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Defining unit.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Resolved soft timeout.
    pub fn soft_timeout(&self) -> Duration {
        self.config.soft_timeout_duration()
    }

    /// Resolved hard timeout.
    pub fn hard_timeout(&self) -> Duration {
        self.config.hard_timeout_duration()
    }

    /// Invoke the handler directly, without timeouts or hooks.
    pub async fn call(&self, args: CallArgs) -> Result<Value, BoxError> {
        self.func.call_dyn(args).await
    }

    pub(crate) fn rebind(&self, config: ApiConfig) -> Self {
        Self {
            func: Arc::clone(&self.func),
            config,
            unit: self.unit.clone(),
        }
    }
}

impl fmt::Debug for ApiHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiHandler")
            .field("unit", &self.unit)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_call_delegates_to_func() {
        let func: Arc<dyn DynHandler> = Arc::new(|args: CallArgs| async move {
            let name: String = args.get(0)?;
            Ok::<_, BoxError>(format!("hi {name}"))
        });
        let handler = ApiHandler::new(func, ApiConfig::new().soft_timeout(1.5));

        assert_eq!(handler.call(CallArgs::new().arg("bob")).await.unwrap(), json!("hi bob"));
        assert_eq!(handler.soft_timeout(), Duration::from_millis(1500));
        assert_eq!(handler.hard_timeout(), Duration::from_secs(20));
    }

    #[test]
    fn test_rebind_keeps_identity() {
        let func: Arc<dyn DynHandler> =
            Arc::new(|_args: CallArgs| async move { Ok::<_, BoxError>("pong") });
        let a = ApiHandler::new(func, ApiConfig::new()).with_unit("app::ping");
        let b = a.rebind(ApiConfig::new().hard_timeout(5.0));

        assert!(a.same_func(&b));
        assert_eq!(b.unit(), "app::ping");
        assert_eq!(b.config().hard_timeout, Some(5.0));
    }
}
