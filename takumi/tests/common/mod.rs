#![allow(dead_code)]

use std::{sync::Arc, time::Duration};
use takumi::{
    ApiConfig, ApiMap, BoxError, CallArgs, Env, HookRegistry, ServiceHandler,
    serde_json::Value,
    testing::{RecordingHook, RecordingLoggerFactory},
};

// ============================================================================
// Test Applications
// ============================================================================

/// `PingService`: `ping`, `echo`, `add`, `fail`, `sleep`.
pub fn ping_app() -> ServiceHandler {
    let mut app = ServiceHandler::new("PingService").unit("tests::ping");

    app.api_with("ping", ApiConfig::new(), |_args: CallArgs| async move {
        Ok::<_, BoxError>("pong")
    });
    app.api_with("echo", ApiConfig::new(), |args: CallArgs| async move {
        Ok::<_, BoxError>(args.get::<Value>(0)?)
    });
    app.api_with("add", ApiConfig::new(), |args: CallArgs| async move {
        let a: i64 = args.param(0, "a")?;
        let b: i64 = args.param(1, "b")?;
        Ok::<_, BoxError>(a + b)
    });
    app.api_with("fail", ApiConfig::new(), |_args: CallArgs| async move {
        Err::<(), BoxError>("other error".into())
    });
    app.api_with(
        "sleep",
        ApiConfig::new().soft_timeout(1.0).hard_timeout(3.0),
        |args: CallArgs| async move {
            let secs: u64 = args.get(0)?;
            tokio::time::sleep(Duration::from_secs(secs)).await;
            Ok::<_, BoxError>(secs)
        },
    );
    app
}

// ============================================================================
// Harness
// ============================================================================

/// A dispatch table with recorders on both pipeline events.
pub struct Harness {
    pub api_map: ApiMap,
    pub before: RecordingHook,
    pub after: RecordingHook,
    pub logs: RecordingLoggerFactory,
}

pub fn harness(app: ServiceHandler, mut hooks: HookRegistry) -> Harness {
    let before = RecordingHook::new();
    let after = RecordingHook::new();
    let logs = RecordingLoggerFactory::new();
    hooks.register_mut(takumi::BEFORE_API_CALL, before.clone());
    hooks.register_mut(takumi::API_CALLED, after.clone());

    let (_, apis, _) = app.into_parts();
    let api_map = ApiMap::new(Arc::new(apis), Arc::new(hooks), Env::new("127.0.0.1:4000"))
        .with_logger_factory(Arc::new(logs.clone()));

    Harness {
        api_map,
        before,
        after,
        logs,
    }
}
