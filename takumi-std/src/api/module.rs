//! API registries.

use super::{ApiHandler, ApiTable};
use crate::hooks::HookRegistry;
use std::{
    borrow::Cow,
    ops::{Deref, DerefMut},
    sync::Arc,
};
use takumi_core::{
    ApiConfig, ApiDef, DEFAULT_HARD_TIMEOUT, DEFAULT_SOFT_TIMEOUT, DynHandler, Handler, Hook,
};

/// A group of APIs sharing default settings.
///
/// Modules let an application split its APIs across source files and merge
/// them into the [`ServiceHandler`] with [`ServiceModule::extend`].
///
/// # Example
/// ```ignore
/// let mut users = ServiceModule::with_defaults(ApiConfig::new().soft_timeout(10.0));
/// users.api(get_user);
/// users.api_with("delete_user", ApiConfig::new().hard_timeout(5.0), delete_user);
///
/// let mut app = ServiceHandler::new("UserService");
/// app.extend(&users);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ServiceModule {
    defaults: ApiConfig,
    unit: Option<Cow<'static, str>>,
    apis: ApiTable,
}

impl ServiceModule {
    /// A module with no defaults of its own.
    pub fn new() -> Self {
        Self::default()
    }

    /// A module whose APIs inherit `defaults`.
    ///
    /// Only keys set here are inherited; unset keys stay unset so that the
    /// extending registry's values show through.
    pub fn with_defaults(defaults: ApiConfig) -> Self {
        Self {
            defaults,
            ..Self::default()
        }
    }

    /// Name the unit that closures registered through
    /// [`api_with`](Self::api_with) and [`add_api`](Self::add_api) belong to.
    pub fn unit(mut self, unit: impl Into<Cow<'static, str>>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Default settings of this registry.
    pub fn defaults(&self) -> &ApiConfig {
        &self.defaults
    }

    /// Register `func` under `name` with `config` taken as is.
    ///
    /// An existing API of the same name is replaced.
    pub fn add_api(
        &mut self,
        name: impl Into<String>,
        func: Arc<dyn DynHandler>,
        config: ApiConfig,
    ) -> &mut Self {
        let mut handler = ApiHandler::new(func, config);
        if let Some(unit) = &self.unit {
            handler = handler.with_unit(unit.clone());
        }
        self.apis.insert(name.into(), handler);
        self
    }

    /// Register an `#[api]` definition under its own name.
    ///
    /// The definition's settings are layered on the registry defaults.
    pub fn api<A: ApiDef>(&mut self, def: A) -> Arc<dyn DynHandler> {
        let func: Arc<dyn DynHandler> = Arc::new(def);
        let config = self.defaults.merged(&A::config());
        let handler = ApiHandler::new(Arc::clone(&func), config).with_unit(A::UNIT);
        self.apis.insert(A::NAME.to_string(), handler);
        func
    }

    /// Register `func` under `name` with `overrides` layered on the registry
    /// defaults. Returns the shared handler.
    pub fn api_with<H: Handler>(
        &mut self,
        name: impl Into<String>,
        overrides: ApiConfig,
        func: H,
    ) -> Arc<dyn DynHandler> {
        let func: Arc<dyn DynHandler> = Arc::new(func);
        let config = self.defaults.merged(&overrides);
        self.add_api(name, Arc::clone(&func), config);
        func
    }

    /// Copy every API of `other` into this registry.
    ///
    /// Each API's settings are re-resolved with this registry's defaults as
    /// the base and `other`'s per-API settings on top.
    pub fn extend(&mut self, other: &ServiceModule) -> &mut Self {
        for (name, handler) in &other.apis {
            let config = self.defaults.merged(handler.config());
            self.apis.insert(name.clone(), handler.rebind(config));
        }
        self
    }

    /// Look up an API.
    pub fn get(&self, name: &str) -> Option<&ApiHandler> {
        self.apis.get(name)
    }

    /// The registered APIs.
    pub fn apis(&self) -> &ApiTable {
        &self.apis
    }

    /// Number of registered APIs.
    pub fn len(&self) -> usize {
        self.apis.len()
    }

    /// Check if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.apis.is_empty()
    }

    pub(crate) fn into_table(self) -> ApiTable {
        self.apis
    }
}

/// The application: a service name, its APIs and its own hooks.
///
/// Dereferences to [`ServiceModule`] for registration.
#[derive(Debug, Clone)]
pub struct ServiceHandler {
    service_name: String,
    module: ServiceModule,
    hooks: HookRegistry,
}

impl ServiceHandler {
    /// An application with 3s soft and 20s hard timeouts.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self::with_defaults(service_name, ApiConfig::new())
    }

    /// An application whose defaults are `defaults` layered on 3s soft and
    /// 20s hard timeouts.
    pub fn with_defaults(service_name: impl Into<String>, defaults: ApiConfig) -> Self {
        let base = ApiConfig::new()
            .soft_timeout(DEFAULT_SOFT_TIMEOUT)
            .hard_timeout(DEFAULT_HARD_TIMEOUT);
        Self {
            service_name: service_name.into(),
            module: ServiceModule::with_defaults(base.merged(&defaults)),
            hooks: HookRegistry::new(),
        }
    }

    /// Name the unit closures registered on the application belong to.
    pub fn unit(mut self, unit: impl Into<Cow<'static, str>>) -> Self {
        self.module = self.module.unit(unit);
        self
    }

    /// Name of the service in the service definition.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Register an application hook for `event`.
    ///
    /// Application hooks run after the service's base hooks.
    pub fn use_hook<H: Hook>(&mut self, event: impl Into<String>, hook: H) -> &mut Self {
        self.hooks.register_mut(event, hook);
        self
    }

    /// The application hooks.
    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// Split into service name, API table and application hooks.
    pub fn into_parts(self) -> (String, ApiTable, HookRegistry) {
        (self.service_name, self.module.into_table(), self.hooks)
    }
}

impl Deref for ServiceHandler {
    type Target = ServiceModule;

    fn deref(&self) -> &Self::Target {
        &self.module
    }
}

impl DerefMut for ServiceHandler {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.module
    }
}
