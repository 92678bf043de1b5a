//! `tracing` backed loggers.

use std::{
    collections::HashMap,
    error::Error,
    sync::{Arc, RwLock},
};
use takumi_core::{Level, Logger, LoggerFactory};

/// A named logger that emits `tracing` events.
///
/// Every event carries a `logger` field with the name; errors are attached
/// as an `error` field holding the full source chain.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    name: Arc<str>,
}

impl TracingLogger {
    /// Create a logger called `name`.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self { name: name.into() }
    }
}

impl Logger for TracingLogger {
    fn name(&self) -> &str {
        &self.name
    }

    fn log(&self, level: Level, message: &str, error: Option<&(dyn Error + 'static)>) {
        let logger = &*self.name;
        match (level, error.map(error_chain)) {
            (Level::Debug, None) => tracing::debug!(logger, "{message}"),
            (Level::Debug, Some(error)) => tracing::debug!(logger, %error, "{message}"),
            (Level::Info, None) => tracing::info!(logger, "{message}"),
            (Level::Info, Some(error)) => tracing::info!(logger, %error, "{message}"),
            (Level::Warning, None) => tracing::warn!(logger, "{message}"),
            (Level::Warning, Some(error)) => tracing::warn!(logger, %error, "{message}"),
            (Level::Error, None) => tracing::error!(logger, "{message}"),
            (Level::Error, Some(error)) => tracing::error!(logger, %error, "{message}"),
        }
    }
}

/// Hands out one shared [`TracingLogger`] per name.
#[derive(Debug, Default)]
pub struct TracingLoggerFactory {
    loggers: RwLock<HashMap<String, Arc<TracingLogger>>>,
}

impl TracingLoggerFactory {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoggerFactory for TracingLoggerFactory {
    fn get_logger(&self, name: &str) -> Arc<dyn Logger> {
        if let Some(logger) = self
            .loggers
            .read()
            .ok()
            .and_then(|loggers| loggers.get(name).cloned())
        {
            return logger;
        }

        let logger = Arc::new(TracingLogger::new(name));
        match self.loggers.write() {
            Ok(mut loggers) => loggers.entry(name.to_string()).or_insert(logger).clone(),
            // A poisoned cache only costs the sharing.
            Err(_) => logger,
        }
    }
}

/// Render `error` and its sources as `outer: inner: root`.
pub fn error_chain(error: &(dyn Error + 'static)) -> String {
    let mut out = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        // transparent wrappers repeat their inner message
        if !out.ends_with(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use takumi_core::{DispatchError, HookError};

    #[test]
    fn test_factory_shares_loggers_by_name() {
        let factory = TracingLoggerFactory::new();
        let a = factory.get_logger("app::users");
        let b = factory.get_logger("app::users");
        let c = factory.get_logger("app::orders");

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(c.name(), "app::orders");
    }

    #[test]
    fn test_error_chain() {
        let err = HookError::failed("api_called", "disk full".into());
        assert_eq!(error_chain(&err), "hook for `api_called` failed: disk full");

        let err = DispatchError::from(err);
        assert_eq!(error_chain(&err), "hook for `api_called` failed: disk full");
    }

    #[test]
    fn test_log_without_subscriber_is_noop() {
        let logger = TracingLogger::new("tests");
        logger.info("hello");
        logger.exception("boom", &DispatchError::UnknownApi("nope".into()));
    }
}
