//! Log setup on `init_process`.
//!
//! The hook reads the application settings from its keyword arguments and
//! installs a global `tracing` subscriber. The first install wins; later
//! attempts report `false`.

use serde_json::Value;
use std::fmt;
use takumi_core::{BoxError, Hook, HookArgs};
use tracing::{Event, Subscriber, level_filters::LevelFilter};
use tracing_subscriber::{
    EnvFilter,
    fmt::{FmtContext, FormatEvent, FormatFields, format::Writer},
    registry::LookupSpan,
};

/// Output style of the process-wide subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStyle {
    /// Timestamped, colored lines for local development.
    Console,
    /// `name[pid]: message` lines without timestamps, left to the system
    /// logger to stamp.
    Syslog,
}

/// Application settings that drive log setup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogSettings {
    /// Application name, used as the default log target.
    pub app_name: String,
    /// Deployment environment; `dev` logs to the console.
    pub env: String,
    /// Force console output outside `dev`.
    pub syslog_disabled: bool,
}

impl LogSettings {
    /// Read `app_name`, `env` and `syslog_disabled` from hook keyword arguments.
    ///
    /// Missing keys fall back to an empty name, `dev` and `false`.
    pub fn from_args(args: &HookArgs<'_>) -> Self {
        let kwargs = args.kwargs();
        let text = |key: &str| kwargs.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            app_name: text("app_name").unwrap_or_default(),
            env: text("env").unwrap_or_else(|| "dev".to_string()),
            syslog_disabled: kwargs
                .get("syslog_disabled")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }

    /// Pick the output style.
    pub fn style(&self) -> LogStyle {
        if self.env == "dev" || cfg!(target_os = "macos") || self.syslog_disabled {
            LogStyle::Console
        } else {
            LogStyle::Syslog
        }
    }

    /// Install the global subscriber. Returns `false` if one was already set.
    ///
    /// `RUST_LOG` overrides the default `info` level.
    pub fn install(&self) -> bool {
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .from_env_lossy();

        let installed = match self.style() {
            LogStyle::Console => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_ansi(true)
                .try_init(),
            LogStyle::Syslog => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .event_format(SyslogFormat::new(&self.app_name))
                .try_init(),
        }
        .is_ok();

        if installed {
            tracing::debug!(app = %self.app_name, style = ?self.style(), "log subscriber installed");
        }
        installed
    }
}

/// Event format of [`LogStyle::Syslog`]: `name[pid]: message`.
///
/// `name` is the application name, or the event target when the name is
/// empty.
#[derive(Debug, Clone)]
pub struct SyslogFormat {
    name: String,
    pid: u32,
}

impl SyslogFormat {
    /// Format lines for `name` in the current process.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pid: std::process::id(),
        }
    }
}

impl<S, N> FormatEvent<S, N> for SyslogFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let name = if self.name.is_empty() {
            event.metadata().target()
        } else {
            &self.name
        };
        write!(writer, "{}[{}]: ", name, self.pid)?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// The `init_process` hook that configures logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSetupHook;

impl Hook for LogSetupHook {
    async fn on_event(&self, args: &HookArgs<'_>) -> Result<Value, BoxError> {
        Ok(Value::Bool(LogSettings::from_args(args).install()))
    }
}
