//! Owned input form of raw data.

use std::fmt;
use std::future::Future;

use futures::future::FutureExt;
use indexmap::IndexMap;
use regex::Regex;

use crate::error::Result;
use crate::view::View;

use super::function::{DataFuture, Function, RouteFn, Thunk};
use super::{NodeId, Value, DIRECTIVE_PREFIX};

/// Data handed to the engine: data sources, handler results, thunk results.
///
/// Allocating `Data` into an arena turns it into raw nodes. [`Data::Node`]
/// and [`Data::View`] refer to nodes that already exist, so returning them
/// from a handler keeps the referenced node's memoized resolution.
pub enum Data {
    Null,
    Undefined,
    Bool(bool),
    Number(f64),
    String(String),
    Regex(Regex),
    Array(Vec<Data>),
    Object(IndexMap<String, Data>),
    Function(Function),
    Pending(DataFuture),
    Verdict(bool),
    Node(NodeId),
    View(View),
}

impl Data {
    pub fn object<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Data>,
    {
        Data::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn array<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Data>,
    {
        Data::Array(items.into_iter().map(Into::into).collect())
    }

    /// A single-key directive `{ "$op": argument }`. The prefix is added if missing.
    pub fn directive(operator: &str, argument: impl Into<Data>) -> Self {
        let key = if operator.starts_with(DIRECTIVE_PREFIX) {
            operator.to_string()
        } else {
            format!("{DIRECTIVE_PREFIX}{operator}")
        };
        Data::Object(IndexMap::from([(key, argument.into())]))
    }

    pub fn thunk<F, D>(f: F) -> Self
    where
        F: Fn() -> D + Send + Sync + 'static,
        D: Into<Data>,
    {
        Data::Function(Function::Thunk(Thunk::new(f)))
    }

    /// `{ "$fn": thunk }`.
    pub fn call(thunk: Thunk) -> Self {
        Data::directive("$fn", Data::Function(Function::Thunk(thunk)))
    }

    pub fn pending<Fut>(fut: Fut) -> Self
    where
        Fut: Future<Output = Result<Data>> + Send + 'static,
    {
        Data::Pending(fut.boxed())
    }

    pub fn regex(pattern: &str) -> Result<Self> {
        Ok(Data::Regex(Regex::new(pattern)?))
    }

    /// `{ "$route": f }`.
    pub fn route(route: RouteFn) -> Self {
        Data::directive("$route", Data::Function(Function::Route(route)))
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Data::Null => f.write_str("Null"),
            Data::Undefined => f.write_str("Undefined"),
            Data::Bool(b) => write!(f, "Bool({b})"),
            Data::Number(n) => write!(f, "Number({n})"),
            Data::String(s) => write!(f, "String({s:?})"),
            Data::Regex(r) => write!(f, "Regex({})", r.as_str()),
            Data::Array(items) => f.debug_list().entries(items).finish(),
            Data::Object(map) => f.debug_map().entries(map).finish(),
            Data::Function(func) => write!(f, "{func:?}"),
            Data::Pending(_) => f.write_str("Pending"),
            Data::Verdict(b) => write!(f, "Verdict({b})"),
            Data::Node(id) => write!(f, "Node({id})"),
            Data::View(view) => write!(f, "{view:?}"),
        }
    }
}

// ── Conversions ─────────────────────────────────────────────────────

impl From<serde_json::Value> for Data {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Data::Null,
            serde_json::Value::Bool(b) => Data::Bool(b),
            serde_json::Value::Number(n) => Data::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Data::String(s),
            serde_json::Value::Array(items) => Data::array(items),
            serde_json::Value::Object(map) => Data::object(map),
        }
    }
}

impl From<Value> for Data {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Data::Null,
            Value::Bool(b) => Data::Bool(b),
            Value::Number(n) => Data::Number(n),
            Value::String(s) => Data::String(s),
            Value::Regex(r) => Data::Regex(r),
            Value::Array(items) => Data::array(items),
            Value::Object(map) => Data::object(map),
            Value::Function(func) => Data::Function(func),
        }
    }
}

impl From<bool> for Data {
    fn from(b: bool) -> Self {
        Data::Bool(b)
    }
}

impl From<f64> for Data {
    fn from(n: f64) -> Self {
        Data::Number(n)
    }
}

impl From<i64> for Data {
    fn from(n: i64) -> Self {
        Data::Number(n as f64)
    }
}

impl From<i32> for Data {
    fn from(n: i32) -> Self {
        Data::Number(n.into())
    }
}

impl From<u32> for Data {
    fn from(n: u32) -> Self {
        Data::Number(n.into())
    }
}

impl From<usize> for Data {
    fn from(n: usize) -> Self {
        Data::Number(n as f64)
    }
}

impl From<&str> for Data {
    fn from(s: &str) -> Self {
        Data::String(s.to_string())
    }
}

impl From<String> for Data {
    fn from(s: String) -> Self {
        Data::String(s)
    }
}

impl From<()> for Data {
    fn from(_: ()) -> Self {
        Data::Undefined
    }
}

impl<T: Into<Data>> From<Option<T>> for Data {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Data::Null)
    }
}

impl From<Vec<Data>> for Data {
    fn from(items: Vec<Data>) -> Self {
        Data::Array(items)
    }
}

impl From<Vec<String>> for Data {
    fn from(items: Vec<String>) -> Self {
        Data::array(items)
    }
}

impl From<Regex> for Data {
    fn from(re: Regex) -> Self {
        Data::Regex(re)
    }
}

impl From<NodeId> for Data {
    fn from(id: NodeId) -> Self {
        Data::Node(id)
    }
}

impl From<View> for Data {
    fn from(view: View) -> Self {
        Data::View(view)
    }
}

impl From<Thunk> for Data {
    fn from(thunk: Thunk) -> Self {
        Data::Function(Function::Thunk(thunk))
    }
}

impl From<RouteFn> for Data {
    fn from(route: RouteFn) -> Self {
        Data::Function(Function::Route(route))
    }
}
