//! Integration tests for the takumi attribute macros.

#![cfg(feature = "macros")]

mod common;

use common::harness;
use takumi::{
    ApiDef, BoxError, CallArgs, Handler, Hook, HookArgs, HookDef, HookRegistry, ServiceHandler,
    serde_json::{Value, json},
};

#[takumi::api]
async fn ping() -> Result<&'static str, BoxError> {
    Ok("pong")
}

#[takumi::api(soft_timeout = 1, hard_timeout = 2.5)]
async fn hello(args: CallArgs) -> Result<String, BoxError> {
    let name: String = args.param(0, "name")?;
    Ok(format!("Hello {name}"))
}

#[takumi::api(name = "get_user", auth = true, rate = 10)]
async fn fetch_user(args: CallArgs) -> Result<Value, std::io::Error> {
    let id = args.args().first().cloned().unwrap_or(Value::Null);
    Ok(json!({"id": id}))
}

#[takumi::hook(event = "api_called")]
async fn audit(args: &HookArgs<'_>) -> Result<Value, BoxError> {
    let ctx = args.ctx()?;
    Ok(json!(format!("{} done", ctx.api_name()?)))
}

#[takumi::hook]
async fn custom_event(args: &HookArgs<'_>) -> Result<Value, BoxError> {
    Ok(json!(args.args().len()))
}

#[test]
fn test_api_definitions() {
    assert_eq!(ping::NAME, "ping");
    assert_eq!(fetch_user::NAME, "get_user");
    assert_eq!(hello::UNIT, module_path!());

    let config = hello::config();
    assert_eq!(config.soft_timeout, Some(1.0));
    assert_eq!(config.hard_timeout, Some(2.5));

    let config = fetch_user::config();
    assert_eq!(config.get("auth"), Some(&json!(true)));
    assert_eq!(config.get("rate"), Some(&json!(10)));
    assert_eq!(config.soft_timeout, None);
}

#[tokio::test]
async fn test_api_struct_is_a_handler() {
    assert_eq!(ping.call(CallArgs::new()).await.unwrap(), json!("pong"));
    assert_eq!(
        hello.call(CallArgs::new().kwarg("name", "sarah")).await.unwrap(),
        json!("Hello sarah")
    );
    assert!(hello.call(CallArgs::new()).await.is_err());
}

#[tokio::test]
async fn test_zero_argument_api_ignores_call_args() {
    let out = ping.call(CallArgs::new().arg(1).kwarg("k", "v")).await.unwrap();
    assert_eq!(out, json!("pong"));

    let mut app = ServiceHandler::new("PingService");
    app.api(ping);
    let mut h = harness(app, HookRegistry::new());
    assert_eq!(h.api_map.call("ping", CallArgs::new()).await.unwrap(), json!("pong"));
    assert_eq!(h.after.count(), 1);
}

#[tokio::test]
async fn test_registered_through_service_handler() {
    let mut app = ServiceHandler::new("MacroService");
    app.api(ping);
    app.api(hello);
    app.api(fetch_user);

    let hello_api = app.get("hello").unwrap();
    assert_eq!(hello_api.config().soft_timeout, Some(1.0));
    assert_eq!(hello_api.config().hard_timeout, Some(2.5));
    assert_eq!(hello_api.unit(), module_path!());
    assert_eq!(app.get("ping").unwrap().config().hard_timeout, Some(20.0));
    assert!(app.get("fetch_user").is_none());

    let hooks = HookRegistry::new().register_def(audit);
    let mut h = harness(app, hooks);

    let out = h.api_map.call("get_user", CallArgs::new().arg(7)).await.unwrap();
    assert_eq!(out, json!({"id": 7}));
    assert_eq!(h.after.last_context().unwrap().api_name().unwrap(), "get_user");
}

#[tokio::test]
async fn test_hook_definitions() {
    assert_eq!(audit::EVENT, "api_called");
    assert_eq!(custom_event::EVENT, "custom_event");

    let out = custom_event
        .on_event(&HookArgs::values(CallArgs::new().arg(1).arg(2)))
        .await
        .unwrap();
    assert_eq!(out, json!(2));

    let registry = HookRegistry::new().register_def(audit).register_def(custom_event);
    assert_eq!(registry.count("api_called"), 1);
    assert_eq!(registry.count("custom_event"), 1);

    let err = audit.on_event(&HookArgs::empty()).await.unwrap_err();
    assert_eq!(err.to_string(), "missing context field: context");
}
