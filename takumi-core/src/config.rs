//! Per-API configuration.
//!
//! An [`ApiConfig`] is a layer of optional settings. Registries keep a
//! default layer and every API may carry an override layer; resolving merges
//! them key by key with the override winning.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Soft timeout applied when no layer sets one, in seconds.
pub const DEFAULT_SOFT_TIMEOUT: f64 = 3.0;

/// Hard timeout applied when no layer sets one, in seconds.
pub const DEFAULT_HARD_TIMEOUT: f64 = 20.0;

/// A layer of API settings.
///
/// Timeouts are seconds as `f64`. `extra` holds options the dispatch
/// pipeline does not interpret; hooks read them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Advisory duration budget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soft_timeout: Option<f64>,
    /// Enforced duration budget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hard_timeout: Option<f64>,
    /// Options consumed by hooks.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApiConfig {
    /// An empty layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the soft timeout in seconds.
    pub fn soft_timeout(mut self, seconds: f64) -> Self {
        self.soft_timeout = Some(seconds);
        self
    }

    /// Set the hard timeout in seconds.
    pub fn hard_timeout(mut self, seconds: f64) -> Self {
        self.hard_timeout = Some(seconds);
        self
    }

    /// Set an extra option.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Look up an extra option.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Layer `overrides` on top of `self`; every key set in `overrides` wins.
    pub fn merged(&self, overrides: &ApiConfig) -> ApiConfig {
        let mut out = self.clone();
        if overrides.soft_timeout.is_some() {
            out.soft_timeout = overrides.soft_timeout;
        }
        if overrides.hard_timeout.is_some() {
            out.hard_timeout = overrides.hard_timeout;
        }
        for (key, value) in &overrides.extra {
            out.extra.insert(key.clone(), value.clone());
        }
        out
    }

    /// Resolved soft timeout in seconds.
    pub fn soft_timeout_secs(&self) -> f64 {
        self.soft_timeout.unwrap_or(DEFAULT_SOFT_TIMEOUT)
    }

    /// Resolved hard timeout in seconds.
    pub fn hard_timeout_secs(&self) -> f64 {
        self.hard_timeout.unwrap_or(DEFAULT_HARD_TIMEOUT)
    }

    /// Resolved soft timeout as a [`Duration`].
    pub fn soft_timeout_duration(&self) -> Duration {
        secs_to_duration(self.soft_timeout_secs())
    }

    /// Resolved hard timeout as a [`Duration`].
    pub fn hard_timeout_duration(&self) -> Duration {
        secs_to_duration(self.hard_timeout_secs())
    }
}

/// Convert seconds to a `Duration`, saturating instead of panicking.
///
/// Negative and NaN values become zero; positive infinity never expires.
pub fn secs_to_duration(seconds: f64) -> Duration {
    if seconds.is_nan() || seconds <= 0.0 {
        Duration::ZERO
    } else {
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_override_wins_key_by_key() {
        let defaults = ApiConfig::new()
            .soft_timeout(10.0)
            .hard_timeout(30.0)
            .with("auth", true);
        let overrides = ApiConfig::new().soft_timeout(15.0).with("auth", false);

        let resolved = defaults.merged(&overrides);
        assert_eq!(resolved.soft_timeout, Some(15.0));
        assert_eq!(resolved.hard_timeout, Some(30.0));
        assert_eq!(resolved.get("auth"), Some(&json!(false)));
    }

    #[test]
    fn test_unset_keys_fall_back_to_defaults() {
        let cfg = ApiConfig::new();
        assert_eq!(cfg.soft_timeout_secs(), DEFAULT_SOFT_TIMEOUT);
        assert_eq!(cfg.hard_timeout_duration(), Duration::from_secs(20));
    }

    #[test]
    fn test_secs_to_duration_saturates() {
        assert_eq!(secs_to_duration(-1.0), Duration::ZERO);
        assert_eq!(secs_to_duration(f64::NAN), Duration::ZERO);
        assert_eq!(secs_to_duration(f64::INFINITY), Duration::MAX);
        assert_eq!(secs_to_duration(1.5), Duration::from_millis(1500));
    }

    #[test]
    fn test_deserialize_with_extras() {
        let cfg: ApiConfig =
            serde_json::from_value(json!({"soft_timeout": 1, "rate_limit": 5})).unwrap();
        assert_eq!(cfg.soft_timeout, Some(1.0));
        assert_eq!(cfg.hard_timeout, None);
        assert_eq!(cfg.get("rate_limit"), Some(&json!(5)));
    }
}
