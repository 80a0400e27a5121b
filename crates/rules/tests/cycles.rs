//! Cyclic data is fine to navigate but fails to realize.

use rulify_rules::{rulify, Arena, Data, EngineError, Rulify, View};
use serde_json::json;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `{ value: 1, hasCycle: <itself> }`
fn self_referencing() -> View {
    let arena = Arena::new();
    let obj = arena.alloc(json!({ "value": 1 }));
    arena.insert(obj, "hasCycle", obj).unwrap();
    Rulify::new().with_arena(arena).source(Data::Node(obj)).build().unwrap()
}

/// `{ $or: [<itself>; copies] }`
fn self_referencing_or(copies: usize) -> View {
    let arena = Arena::new();
    let obj = arena.alloc(json!({ "$or": [] }));
    let list = arena.child(obj, &"$or".into());
    for _ in 0..copies {
        arena.append(list, obj).unwrap();
    }
    Rulify::new().with_arena(arena).source(Data::Node(obj)).build().unwrap()
}

#[tokio::test]
async fn navigating_a_cycle_is_fine() {
    let root = self_referencing();
    let value = root.at(["hasCycle", "hasCycle", "value"]);
    assert_eq!(value.materialize().await.unwrap(), json!(1));
}

#[tokio::test]
async fn realizing_a_cycle_fails() {
    init_tracing();
    let root = self_referencing();
    let err = root.at(["hasCycle", "hasCycle"]).materialize().await.unwrap_err();
    assert!(matches!(err, EngineError::CycleDetected(_)));
}

#[tokio::test]
async fn cycle_through_a_handler_fails() {
    init_tracing();
    let root = self_referencing_or(1);
    let err = root.materialize().await.unwrap_err();
    assert!(err.is_cycle(), "{err}");
}

#[tokio::test]
async fn cycle_survives_cost_estimation() {
    init_tracing();
    let root = self_referencing_or(3);
    let err = root.materialize().await.unwrap_err();
    assert!(err.is_cycle(), "{err}");
}

#[tokio::test]
async fn references_to_each_other_fail() {
    init_tracing();
    let root = rulify([json!({
        "a": { "$ref": "b" },
        "b": { "$ref": "a" },
        "ok": 1,
    })])
    .unwrap();

    let err = root.get("a").materialize().await.unwrap_err();
    assert!(err.is_cycle(), "{err}");
    assert_eq!(root.get("ok").materialize().await.unwrap(), json!(1));
}

#[tokio::test]
async fn shared_subtrees_are_not_cycles() {
    let arena = Arena::new();
    let shared = arena.alloc(json!({ "x": 1 }));
    let root = arena.alloc(json!({}));
    arena.insert(root, "left", shared).unwrap();
    arena.insert(root, "right", shared).unwrap();
    let view = Rulify::new().with_arena(arena).source(Data::Node(root)).build().unwrap();

    assert_eq!(
        view.materialize().await.unwrap(),
        json!({ "left": { "x": 1 }, "right": { "x": 1 } })
    );
}
