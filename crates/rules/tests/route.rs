//! `$route`: a path function receives the keys navigated below it.

use rulify_rules::{rulify, Data, RouteFn, Thunk};
use serde_json::json;

fn echo_path() -> Data {
    Data::route(RouteFn::new(|path: Vec<String>| path))
}

#[tokio::test]
async fn root_route_gets_an_empty_path() {
    let root = rulify([echo_path()]).unwrap();
    assert_eq!(root.materialize().await.unwrap(), json!([]));
}

#[tokio::test]
async fn route_with_accessors() {
    let root = rulify([echo_path()]).unwrap();
    assert_eq!(root.get("a").materialize().await.unwrap(), json!(["a"]));
    assert_eq!(root.at(["a", "b", "c"]).materialize().await.unwrap(), json!(["a", "b", "c"]));
}

#[tokio::test]
async fn numeric_accessors_become_strings() {
    let root = rulify([echo_path()]).unwrap();
    assert_eq!(root.index(0).index(1).materialize().await.unwrap(), json!(["0", "1"]));
    assert_eq!(root.get("0").get("1").materialize().await.unwrap(), json!(["0", "1"]));
}

#[tokio::test]
async fn nested_route_starts_below_its_own_key() {
    let root = rulify([Data::object([("api", echo_path())])]).unwrap();
    assert_eq!(root.at(["api", "users", "7"]).materialize().await.unwrap(), json!(["users", "7"]));
}

#[tokio::test]
async fn route_results_are_resolved() {
    let lookup = RouteFn::from_async(|path: Vec<String>| async move {
        let name = path.join("/");
        Ok(Data::call(Thunk::new(move || json!({ "name": name.clone() }))))
    });
    let root = rulify([Data::object([("lookup", Data::route(lookup))])]).unwrap();

    assert_eq!(
        root.at(["lookup", "a", "b"]).materialize().await.unwrap(),
        json!({ "name": "a/b" })
    );
}

#[tokio::test]
async fn route_requires_a_path_function() {
    let root = rulify([json!({ "bad": { "$route": 5 } })]).unwrap();
    let err = root.get("bad").materialize().await.unwrap_err();
    assert!(err.to_string().contains("$route"));
}
