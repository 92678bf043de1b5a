//! Default `api_called` hook: one log line per call.

use serde_json::Value;
use std::time::Duration;
use takumi_core::{BoxError, Context, ContextError, DisplayArgs, Hook, HookArgs};

/// Health-check API whose successful calls are not logged.
pub const HEALTH_CHECK_API: &str = "ping";

/// Logs every finished call through the context's logger.
///
/// The line reads `[<client>] <message?> <api>(<args>) <elapsed>ms`:
///
/// - success past the soft timeout: warning, `Soft timeout!`
/// - success within budget: info, unless the API is a quiet health check
/// - hard timeout: error, `Hard timeout!`
/// - any other error: error, `<error> =>`
pub struct ApiCalledHook {
    quiet: Vec<String>,
}

impl ApiCalledHook {
    /// Create the hook with `ping` as the only quiet API.
    pub fn new() -> Self {
        Self {
            quiet: vec![HEALTH_CHECK_API.to_string()],
        }
    }

    /// Also suppress success logs for `api`.
    pub fn quiet(mut self, api: impl Into<String>) -> Self {
        self.quiet.push(api.into());
        self
    }

    fn log_call(&self, ctx: &Context) -> Result<(), ContextError> {
        let logger = ctx.logger()?;
        let api_name = ctx.api_name()?;
        let elapsed = ctx.elapsed()?;

        let meta = format!("[{}]", ctx.env()?.client_addr());
        let func_info = format!(
            "{}({}) {}ms",
            api_name,
            DisplayArgs::new(ctx.args()?, ctx.kwargs()?),
            format_millis(elapsed)
        );
        let line = |msg: &str| {
            if msg.is_empty() {
                format!("{meta} {func_info}")
            } else {
                format!("{meta} {msg} {func_info}")
            }
        };

        match ctx.exc()? {
            None => {
                if elapsed > ctx.soft_timeout()? {
                    logger.warning(&line("Soft timeout!"));
                } else if !self.quiet.iter().any(|q| q == api_name) {
                    logger.info(&line(""));
                }
            }
            Some(err) if err.is_hard_timeout() => {
                logger.exception(&line("Hard timeout!"), err);
            }
            Some(err) => {
                logger.exception(&line(&format!("{err} =>")), err);
            }
        }
        Ok(())
    }
}

impl Default for ApiCalledHook {
    fn default() -> Self {
        Self::new()
    }
}

impl Hook for ApiCalledHook {
    async fn on_event(&self, args: &HookArgs<'_>) -> Result<Value, BoxError> {
        self.log_call(args.ctx()?)?;
        Ok(Value::Null)
    }
}

/// Milliseconds with at most six significant digits and no trailing zeros.
pub fn format_millis(elapsed: Duration) -> String {
    let ms = elapsed.as_secs_f64() * 1000.0;
    let int_digits = if ms >= 1.0 {
        ms.log10().floor() as i32 + 1
    } else {
        1
    };
    let decimals = (6 - int_digits).max(0) as usize;
    let text = format!("{ms:.decimals$}");
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingLogger;
    use serde_json::{Map, json};
    use std::{sync::Arc, time::Instant};
    use takumi_core::{DispatchError, Env, Level};

    fn finished_context(logger: &RecordingLogger, api: &str, elapsed: Duration) -> Context {
        let mut ctx = Context::with_env(Env::new("127.0.0.1"));
        let start = Instant::now();
        let mut kwargs = Map::new();
        kwargs.insert("name".into(), json!("sarah"));
        ctx.set_api_name(api);
        ctx.set_args(vec![json!(4), json!("hello")]);
        ctx.set_kwargs(kwargs);
        ctx.set_start_at(start);
        ctx.set_end_at(start + elapsed);
        ctx.set_logger(Arc::new(logger.clone()));
        ctx.set_soft_timeout(Duration::from_secs(3));
        ctx.set_hard_timeout(Duration::from_secs(6));
        ctx.set_exc(None);
        ctx
    }

    #[tokio::test]
    async fn test_soft_timeout_warns() {
        let logger = RecordingLogger::new("tests");
        let ctx = finished_context(&logger, "ping_api", Duration::from_secs(5));

        ApiCalledHook::new().on_event(&HookArgs::context(&ctx)).await.unwrap();

        let record = logger.last().unwrap();
        assert_eq!(record.level, Level::Warning);
        assert_eq!(
            record.message,
            r#"[127.0.0.1] Soft timeout! ping_api(4,"hello",name="sarah") 5000ms"#
        );
    }

    #[tokio::test]
    async fn test_within_budget_logs_info() {
        let logger = RecordingLogger::new("tests");
        let ctx = finished_context(&logger, "ping_api", Duration::from_secs(1));

        ApiCalledHook::new().on_event(&HookArgs::context(&ctx)).await.unwrap();

        let record = logger.last().unwrap();
        assert_eq!(record.level, Level::Info);
        assert_eq!(
            record.message,
            r#"[127.0.0.1] ping_api(4,"hello",name="sarah") 1000ms"#
        );
        assert!(!record.message.contains("Soft timeout!"));
    }

    #[tokio::test]
    async fn test_health_check_is_quiet() {
        let logger = RecordingLogger::new("tests");
        let ctx = finished_context(&logger, "ping", Duration::from_secs(1));

        ApiCalledHook::new().on_event(&HookArgs::context(&ctx)).await.unwrap();
        assert_eq!(logger.count(), 0);

        // Quiet only applies within budget.
        let ctx = finished_context(&logger, "ping", Duration::from_secs(4));
        ApiCalledHook::new().on_event(&HookArgs::context(&ctx)).await.unwrap();
        assert_eq!(logger.last().unwrap().level, Level::Warning);
    }

    #[tokio::test]
    async fn test_extra_quiet_api() {
        let logger = RecordingLogger::new("tests");
        let ctx = finished_context(&logger, "status", Duration::from_millis(10));
        ApiCalledHook::new()
            .quiet("status")
            .on_event(&HookArgs::context(&ctx))
            .await
            .unwrap();
        assert_eq!(logger.count(), 0);
    }

    #[tokio::test]
    async fn test_hard_timeout_logs_error() {
        let logger = RecordingLogger::new("tests");
        let mut ctx = finished_context(&logger, "ping_api", Duration::from_secs(5));
        ctx.set_exc(Some(DispatchError::HardTimeout(Duration::from_secs(20))));

        ApiCalledHook::new().on_event(&HookArgs::context(&ctx)).await.unwrap();

        let record = logger.last().unwrap();
        assert_eq!(record.level, Level::Error);
        assert_eq!(
            record.message,
            r#"[127.0.0.1] Hard timeout! ping_api(4,"hello",name="sarah") 5000ms"#
        );
        assert!(record.error.is_some());
    }

    #[tokio::test]
    async fn test_handler_error_logs_error_string() {
        let logger = RecordingLogger::new("tests");
        let mut ctx = finished_context(&logger, "ping_api", Duration::from_secs(5));
        ctx.set_exc(Some(DispatchError::handler("other error".into())));

        ApiCalledHook::new().on_event(&HookArgs::context(&ctx)).await.unwrap();

        let record = logger.last().unwrap();
        assert_eq!(record.level, Level::Error);
        assert_eq!(
            record.message,
            r#"[127.0.0.1] other error => ping_api(4,"hello",name="sarah") 5000ms"#
        );
        assert_eq!(record.error.as_deref(), Some("other error"));
    }

    #[tokio::test]
    async fn test_missing_field_fails_the_hook() {
        let ctx = Context::with_env(Env::new("127.0.0.1"));
        let err = ApiCalledHook::new()
            .on_event(&HookArgs::context(&ctx))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "missing context field: logger");
    }

    #[test]
    fn test_format_millis() {
        assert_eq!(format_millis(Duration::from_secs(5)), "5000");
        assert_eq!(format_millis(Duration::from_micros(500)), "0.5");
        assert_eq!(format_millis(Duration::from_nanos(12_345_678)), "12.3457");
        assert_eq!(format_millis(Duration::ZERO), "0");
        assert_eq!(format_millis(Duration::from_secs(3600)), "3600000");
    }
}
