//! Testing utilities for Takumi.
//!
//! # Features
//!
//! - [`RecordingLogger`] / [`RecordingLoggerFactory`]: capture log lines
//! - [`RecordingHook`]: a hook that snapshots what it was fired with
//! - [`CountingHandler`]: a handler that counts its invocations
//! - [`memory_channel`]: an in-memory [`Codec`] and the client side driving it

use crate::service::{Call, Codec, Reply};
use async_trait::async_trait;
use serde_json::Value;
use std::{
    error::Error,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};
use takumi_core::{
    BoxError, CallArgs, Context, Handler, Hook, HookArgs, Level, Logger, LoggerFactory,
};
use tokio::sync::mpsc;

// ============================================================================
// Recording Logger
// ============================================================================

/// One captured log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Name of the logger that emitted it.
    pub logger: String,
    /// Severity.
    pub level: Level,
    /// The message.
    pub message: String,
    /// Display form of the attached error, if any.
    pub error: Option<String>,
}

/// A logger that keeps every entry in memory.
///
/// Clones share the same sink.
///
/// # Example
///
/// ```rust,ignore
/// let logger = RecordingLogger::new("tests");
/// ctx.set_logger(Arc::new(logger.clone()));
///
/// // run the hook...
///
/// assert_eq!(logger.last().unwrap().level, Level::Warning);
/// ```
#[derive(Debug, Clone)]
pub struct RecordingLogger {
    name: String,
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl RecordingLogger {
    /// Create a logger with an empty sink.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_sink(name, Arc::default())
    }

    fn with_sink(name: impl Into<String>, records: Arc<Mutex<Vec<LogRecord>>>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    /// Get a clone of the captured entries.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }

    /// The most recent entry.
    pub fn last(&self) -> Option<LogRecord> {
        self.records.lock().unwrap().last().cloned()
    }

    /// Number of captured entries.
    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Drop every captured entry.
    pub fn clear(&self) {
        self.records.lock().unwrap().clear();
    }
}

impl Logger for RecordingLogger {
    fn name(&self) -> &str {
        &self.name
    }

    fn log(&self, level: Level, message: &str, error: Option<&(dyn Error + 'static)>) {
        self.records.lock().unwrap().push(LogRecord {
            logger: self.name.clone(),
            level,
            message: message.to_string(),
            error: error.map(ToString::to_string),
        });
    }
}

/// A [`LoggerFactory`] whose loggers all write into one shared sink.
#[derive(Debug, Clone, Default)]
pub struct RecordingLoggerFactory {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl RecordingLoggerFactory {
    /// Create a factory with an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a clone of every captured entry, across loggers.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Entries at `level`.
    pub fn at(&self, level: Level) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|record| record.level == level)
            .collect()
    }

    /// The most recent entry.
    pub fn last(&self) -> Option<LogRecord> {
        self.records.lock().unwrap().last().cloned()
    }

    /// Number of captured entries.
    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

impl LoggerFactory for RecordingLoggerFactory {
    fn get_logger(&self, name: &str) -> Arc<dyn Logger> {
        Arc::new(RecordingLogger::with_sink(name, Arc::clone(&self.records)))
    }
}

// ============================================================================
// Recording Hook
// ============================================================================

/// What a [`RecordingHook`] was fired with.
#[derive(Debug, Clone)]
pub enum Fired {
    /// A snapshot of the execution context.
    Context(Box<Context>),
    /// Plain positional and keyword values.
    Values(CallArgs),
}

impl Fired {
    /// The context snapshot, if the event carried one.
    pub fn context(&self) -> Option<&Context> {
        match self {
            Fired::Context(ctx) => Some(ctx),
            Fired::Values(_) => None,
        }
    }
}

/// A hook that records every firing.
///
/// Clones share the same record, so keep one clone for inspection and
/// register the other.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = RecordingHook::new();
/// hooks.register_mut("api_called", recorder.clone());
///
/// api_map.call("ping", CallArgs::new()).await?;
///
/// let ctx = recorder.last_context().unwrap();
/// assert_eq!(ctx.api_name().unwrap(), "ping");
/// ```
#[derive(Debug, Clone)]
pub struct RecordingHook {
    fired: Arc<Mutex<Vec<Fired>>>,
    result: Value,
}

impl RecordingHook {
    /// Create a recording hook that returns `null`.
    pub fn new() -> Self {
        Self::with_result(Value::Null)
    }

    /// Create a recording hook that returns `result`.
    pub fn with_result(result: impl Into<Value>) -> Self {
        Self {
            fired: Arc::default(),
            result: result.into(),
        }
    }

    /// Get a clone of every firing.
    pub fn fired(&self) -> Vec<Fired> {
        self.fired.lock().unwrap().clone()
    }

    /// The context of the most recent firing that carried one.
    pub fn last_context(&self) -> Option<Context> {
        self.fired
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|fired| fired.context().cloned())
    }

    /// Number of firings.
    pub fn count(&self) -> usize {
        self.fired.lock().unwrap().len()
    }

    /// Forget every firing.
    pub fn clear(&self) {
        self.fired.lock().unwrap().clear();
    }
}

impl Default for RecordingHook {
    fn default() -> Self {
        Self::new()
    }
}

impl Hook for RecordingHook {
    async fn on_event(&self, args: &HookArgs<'_>) -> Result<Value, BoxError> {
        let fired = match args.ctx() {
            Ok(ctx) => Fired::Context(Box::new(ctx.clone())),
            Err(_) => Fired::Values(args.call_args().clone()),
        };
        self.fired.lock().unwrap().push(fired);
        Ok(self.result.clone())
    }
}

// ============================================================================
// Counting Handler
// ============================================================================

/// A handler that returns how many times it has been called, starting at 1.
#[derive(Debug, Clone, Default)]
pub struct CountingHandler {
    calls: Arc<AtomicUsize>,
}

impl CountingHandler {
    /// Create a handler that has not been called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed invocations.
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Handler for CountingHandler {
    async fn call(&self, _args: CallArgs) -> Result<Value, BoxError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Value::from(n))
    }
}

// ============================================================================
// Memory Channel
// ============================================================================

/// Create a connected in-memory codec and client.
///
/// Calls sent by the client are read by the codec; replies written by the
/// codec are received by the client.
pub fn memory_channel() -> (MemoryCodec, MemoryClient) {
    let (call_tx, call_rx) = mpsc::unbounded_channel();
    let (reply_tx, reply_rx) = mpsc::unbounded_channel();
    let closed = Arc::new(AtomicBool::new(false));
    (
        MemoryCodec {
            calls: call_rx,
            replies: reply_tx,
            closed: Arc::clone(&closed),
        },
        MemoryClient {
            calls: Some(call_tx),
            replies: reply_rx,
            closed,
        },
    )
}

/// Server side of [`memory_channel`].
#[derive(Debug)]
pub struct MemoryCodec {
    calls: mpsc::UnboundedReceiver<Call>,
    replies: mpsc::UnboundedSender<Reply>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl Codec for MemoryCodec {
    async fn read_call(&mut self) -> Result<Option<Call>, BoxError> {
        Ok(self.calls.recv().await)
    }

    async fn write_reply(&mut self, reply: Reply) -> Result<(), BoxError> {
        self.replies
            .send(reply)
            .map_err(|_| "memory client disconnected".into())
    }

    async fn close(&mut self) -> Result<(), BoxError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Client side of [`memory_channel`].
#[derive(Debug)]
pub struct MemoryClient {
    calls: Option<mpsc::UnboundedSender<Call>>,
    replies: mpsc::UnboundedReceiver<Reply>,
    closed: Arc<AtomicBool>,
}

impl MemoryClient {
    /// Send a call without waiting for its reply.
    pub fn send(&self, api: impl Into<String>, args: CallArgs) -> Result<(), BoxError> {
        let calls = self.calls.as_ref().ok_or("memory client hung up")?;
        calls
            .send(Call::new(api, args))
            .map_err(|_| "memory codec dropped".into())
    }

    /// Wait for the next reply. `None` once the codec is gone.
    pub async fn recv(&mut self) -> Option<Reply> {
        self.replies.recv().await
    }

    /// Send a call and wait for its reply.
    pub async fn call(&mut self, api: impl Into<String>, args: CallArgs) -> Option<Reply> {
        self.send(api, args).ok()?;
        self.recv().await
    }

    /// Stop sending; the codec reads end-of-stream after pending calls.
    pub fn hang_up(&mut self) {
        self.calls = None;
    }

    /// Whether the serving side closed the codec.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
