//! Logger-by-name lookup.
//!
//! The dispatch pipeline never configures log destinations. It asks a
//! [`LoggerFactory`] for the logger of a handler's defining unit and stores
//! it in the context, where hooks use it.

use std::{error::Error, fmt, sync::Arc};

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Verbose diagnostics.
    Debug,
    /// Normal operation.
    Info,
    /// Something looks wrong but the call went on.
    Warning,
    /// The call failed.
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        })
    }
}

/// A named, leveled logger.
pub trait Logger: Send + Sync + 'static {
    /// Name of the unit this logger belongs to.
    fn name(&self) -> &str;

    /// Emit one entry. `error` carries the failure whose chain should be logged.
    fn log(&self, level: Level, message: &str, error: Option<&(dyn Error + 'static)>);

    /// Log at info level.
    fn info(&self, message: &str) {
        self.log(Level::Info, message, None);
    }

    /// Log at warning level.
    fn warning(&self, message: &str) {
        self.log(Level::Warning, message, None);
    }

    /// Log at error level together with the error and its source chain.
    fn exception(&self, message: &str, error: &(dyn Error + 'static)) {
        self.log(Level::Error, message, Some(error));
    }
}

/// Returns the logger for a unit name.
pub trait LoggerFactory: Send + Sync + 'static {
    /// Look up (or create) the logger called `name`.
    fn get_logger(&self, name: &str) -> Arc<dyn Logger>;
}

impl<F> LoggerFactory for F
where
    F: Fn(&str) -> Arc<dyn Logger> + Send + Sync + 'static,
{
    fn get_logger(&self, name: &str) -> Arc<dyn Logger> {
        (self)(name)
    }
}
