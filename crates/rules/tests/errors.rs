//! Failures surface where they are realized and nowhere else.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use rulify_rules::{handler_fn, rulify, Data, EngineError, FnHandler, Rulify, Thunk, View};
use serde_json::json;

fn thrower(calls: Arc<AtomicUsize>) -> FnHandler {
    handler_fn(move |argument, api| {
        calls.fetch_add(1, Ordering::SeqCst);
        async move {
            let message = api.materialize(&argument).await?;
            Err(EngineError::handler(anyhow!("{message}")))
        }
    })
}

fn with_throw(source: serde_json::Value) -> (View, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let root = Rulify::new()
        .source(source)
        .handler("throw", thrower(calls.clone()))
        .build()
        .unwrap();
    (root, calls)
}

#[tokio::test]
async fn handler_errors_bubble_up_unchanged() {
    let (root, _) = with_throw(json!({ "err": { "$throw": "ERROR" } }));
    let err = root.get("err").materialize().await.unwrap_err();
    assert!(matches!(err, EngineError::Handler(_)));
    assert_eq!(err.to_string(), "ERROR");
}

#[tokio::test]
async fn root_handler_errors_bubble_up() {
    let (root, _) = with_throw(json!({ "$throw": "ERROR" }));
    let err = root.materialize().await.unwrap_err();
    assert_eq!(err.to_string(), "ERROR");
}

#[tokio::test]
async fn unreferenced_failures_are_invisible() {
    let (root, calls) = with_throw(json!({ "value": 1, "err": { "$throw": "ERROR" } }));
    assert_eq!(root.get("value").materialize().await.unwrap(), json!(1));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failures_are_memoized() {
    let (root, calls) = with_throw(json!({ "err": { "$throw": "ERROR" } }));
    assert!(root.get("err").materialize().await.is_err());
    assert!(root.get("err").materialize().await.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failures_inside_aggregates_fail_the_whole_value() {
    let (root, _) = with_throw(json!({ "list": [1, { "$throw": "inner" }, 3] }));
    assert_eq!(root.get("list").index(0).materialize().await.unwrap(), json!(1));
    let err = root.get("list").materialize().await.unwrap_err();
    assert_eq!(err.to_string(), "inner");
}

#[tokio::test]
async fn thunk_errors_propagate() {
    let failing = Thunk::from_async(|| async { Err(EngineError::handler(anyhow!("no data"))) });
    let root = rulify([Data::object([("value", Data::call(failing))])]).unwrap();
    let err = root.get("value").materialize().await.unwrap_err();
    assert_eq!(err.to_string(), "no data");
}

#[tokio::test]
async fn engine_errors_pass_through_handlers() {
    let root = Rulify::new()
        .source(json!({ "value": { "$wrap": "items[x]" } }))
        .handler(
            "wrap",
            handler_fn(|argument, api| async move {
                let path = api.materialize(&argument).await?;
                let target = api.get_ref(path.as_str().unwrap_or_default())?;
                Ok(Data::View(target))
            }),
        )
        .build()
        .unwrap();

    let err = root.get("value").materialize().await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidReference(_)), "{err:?}");
}

// ── Shape errors ────────────────────────────────────────────────────

#[tokio::test]
async fn fn_requires_a_function() {
    let root = rulify([json!({ "value": { "$fn": 3 } })]).unwrap();
    let err = root.get("value").materialize().await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument { .. }), "{err:?}");
}

#[tokio::test]
async fn regex_rejects_unknown_flags() {
    let root = rulify([json!({ "value": { "$regex": ["a", { "pattern": "a", "flags": "q" }] } })])
        .unwrap();
    assert!(root.get("value").materialize().await.is_err());

    let root = rulify([json!({ "value": { "$regex": ["a", "("] } })]).unwrap();
    let err = root.get("value").materialize().await.unwrap_err();
    assert!(matches!(err, EngineError::Regex(_)), "{err:?}");
}

#[tokio::test]
async fn unknown_operators_are_plain_data() {
    let root = rulify([json!({ "value": { "$nope": 1 } })]).unwrap();
    assert_eq!(root.get("value").materialize().await.unwrap(), json!({ "$nope": 1 }));
}

// ── Reserved names ──────────────────────────────────────────────────

#[tokio::test]
async fn reserved_names_cannot_be_registered() {
    for name in ["route", "$route", "handlers", "$handlers"] {
        let err = Rulify::new()
            .source(json!({}))
            .handler(name, handler_fn(|_, _| async { Ok(Data::Null) }))
            .build()
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidHandlerRedefinition(_)), "{name}");
    }
}

#[tokio::test]
async fn reserved_directives_fail_when_realized() {
    let root = rulify([json!({ "value": 1, "bad": { "$handlers": { "x": 1 } } })]).unwrap();
    assert_eq!(root.get("value").materialize().await.unwrap(), json!(1));

    let err = root.get("bad").materialize().await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidHandlerRedefinition(_)), "{err:?}");
}

#[tokio::test]
async fn custom_handlers_override_builtins() {
    let root = Rulify::new()
        .source(json!({ "value": { "$not": true } }))
        .handler("not", handler_fn(|_, _| async { Ok(Data::from("overridden")) }))
        .build()
        .unwrap();
    assert_eq!(root.get("value").materialize().await.unwrap(), json!("overridden"));
}
