//! Service runtime over the in-memory codec.

mod common;

use async_trait::async_trait;
use common::ping_app;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use takumi::{
    AppConfig, BoxError, Call, CallArgs, Codec, Env, ErrorKind, HookRegistry, INIT_PROCESS,
    Level, Reply, Service, ServiceError,
    serde_json::{Value, json},
    testing::{RecordingHook, RecordingLoggerFactory, memory_channel},
};

fn config() -> AppConfig {
    AppConfig::from_toml_str(
        r#"
        app_name = "ping"
        env = "dev"
        thrift_file = "idl/ping.thrift"
        port = 8010
        "#,
    )
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_serve_replies_and_keeps_going_after_errors() {
    let logs = RecordingLoggerFactory::new();
    let service = Arc::new(
        Service::new(ping_app(), &config()).with_logger_factory(Arc::new(logs.clone())),
    );
    let (codec, mut client) = memory_channel();
    let task = service.spawn(codec, Env::new("10.1.1.1:9000"));

    assert_eq!(
        client.call("add", CallArgs::new().kwarg("a", 40).kwarg("b", 2)).await,
        Some(Reply::Value(json!(42)))
    );
    assert_eq!(
        client.call("nope", CallArgs::new()).await,
        Some(Reply::Error {
            kind: ErrorKind::UnknownApi,
            message: "unknown api: nope".into(),
        })
    );
    assert!(matches!(
        client.call("sleep", CallArgs::new().arg(30)).await,
        Some(Reply::Error { kind: ErrorKind::Timeout, .. })
    ));
    assert_eq!(client.call("ping", CallArgs::new()).await, Some(Reply::Value(json!("pong"))));

    client.hang_up();
    task.await.unwrap().unwrap();
    assert!(client.is_closed());

    let levels: Vec<_> = logs.records().into_iter().map(|r| r.level).collect();
    assert_eq!(levels, vec![Level::Info, Level::Error]);
}

#[tokio::test]
async fn test_init_process_fires_with_settings() {
    let recorder = RecordingHook::with_result(true);
    let base = HookRegistry::new().register(INIT_PROCESS, recorder.clone());
    let mut app = ping_app();
    app.use_hook(INIT_PROCESS, RecordingHook::with_result("app"));
    let service = Service::with_hooks(app, &config(), base);

    let out = service.init_process().await.unwrap();
    assert_eq!(out, vec![json!(true), json!("app")]);

    let fired = recorder.fired();
    let takumi::testing::Fired::Values(args) = &fired[0] else {
        panic!("init_process carries values, not a context");
    };
    assert_eq!(args.kwargs()["app_name"], json!("ping"));
    assert_eq!(args.kwargs()["env"], json!("dev"));
    assert_eq!(args.kwargs()["port"], json!(8010));
}

#[tokio::test]
async fn test_init_process_hook_failure() {
    let base = HookRegistry::new().register_fn(INIT_PROCESS, |_| Err("no syslog".into()));
    let service = Service::with_hooks(ping_app(), &config(), base);

    let err = service.init_process().await.unwrap_err();
    assert!(matches!(err, ServiceError::Hook(_)));
}

#[test]
fn test_definition_resolved_from_config() {
    let service = Service::new(ping_app(), &config());
    let def = service.definition();
    assert_eq!(def.module_name(), "ping_thrift");
    assert_eq!(def.service_name(), "PingService");
    assert_eq!(def.path(), std::path::Path::new("idl/ping.thrift"));
    assert_eq!(service.config().get("port").and_then(|v| v.as_integer()), Some(8010));
}

/// Accepts one call and then fails to write.
struct BrokenPipe {
    sent: bool,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl Codec for BrokenPipe {
    async fn read_call(&mut self) -> Result<Option<Call>, BoxError> {
        if self.sent {
            return Ok(None);
        }
        self.sent = true;
        Ok(Some(Call::new("ping", CallArgs::new())))
    }

    async fn write_reply(&mut self, _reply: Reply) -> Result<(), BoxError> {
        Err("broken pipe".into())
    }

    async fn close(&mut self) -> Result<(), BoxError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_codec_failure_ends_serving_but_closes() {
    let closed = Arc::new(AtomicBool::new(false));
    let codec = BrokenPipe {
        sent: false,
        closed: closed.clone(),
    };
    let service = Service::new(ping_app(), &config());

    let err = service.serve(codec, Env::new("10.1.1.1:9000")).await.unwrap_err();
    assert_eq!(err.to_string(), "codec failure: broken pipe");
    assert!(closed.load(Ordering::SeqCst));
}

#[test]
fn test_reply_serializes_for_codecs() {
    let reply = Reply::Error {
        kind: ErrorKind::Timeout,
        message: "slow".into(),
    };
    let encoded = takumi::serde_json::to_value(&reply).unwrap();
    assert_eq!(encoded, json!({"error": {"kind": "timeout", "message": "slow"}}));
    assert_eq!(
        takumi::serde_json::to_value(Reply::Value(Value::Null)).unwrap(),
        json!({"value": null})
    );
}
