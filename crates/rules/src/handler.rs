//! Operator handlers and the registry that maps directive keys to them.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};

use crate::api::EvalApi;
use crate::cost::CostInput;
use crate::error::{EngineError, Result};
use crate::node::{Data, DIRECTIVE_PREFIX};
use crate::view::View;

/// Operator that captures a navigation path instead of a value.
pub const ROUTE: &str = "$route";
/// Operator name reserved for handler declarations; never dispatchable.
pub const HANDLERS: &str = "$handlers";

/// An operator implementation.
///
/// `handle` receives its argument as a lazy [`View`] and returns new data,
/// which the engine resolves in turn. Handlers may return another directive,
/// a pending value or an existing view.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, argument: View, api: EvalApi) -> Result<Data>;

    /// Declared cost of dispatching this operator on `argument`, excluding
    /// the cost of the argument itself. `None` means the default handler cost.
    fn cost(&self, _argument: &CostInput<'_>) -> Option<f64> {
        None
    }
}

type HandleFn = dyn Fn(View, EvalApi) -> BoxFuture<'static, Result<Data>> + Send + Sync;
type CostFn = dyn Fn(&CostInput<'_>) -> f64 + Send + Sync;

/// A handler built from closures. See [`handler_fn`].
#[derive(Clone)]
pub struct FnHandler {
    handle: Arc<HandleFn>,
    cost: Option<Arc<CostFn>>,
}

/// Adapt an async closure into a [`Handler`].
pub fn handler_fn<F, Fut>(f: F) -> FnHandler
where
    F: Fn(View, EvalApi) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Data>> + Send + 'static,
{
    FnHandler {
        handle: Arc::new(move |argument, api| f(argument, api).boxed()),
        cost: None,
    }
}

impl FnHandler {
    pub fn with_cost<C>(mut self, cost: C) -> Self
    where
        C: Fn(&CostInput<'_>) -> f64 + Send + Sync + 'static,
    {
        self.cost = Some(Arc::new(cost));
        self
    }
}

#[async_trait]
impl Handler for FnHandler {
    async fn handle(&self, argument: View, api: EvalApi) -> Result<Data> {
        (self.handle)(argument, api).await
    }

    fn cost(&self, argument: &CostInput<'_>) -> Option<f64> {
        self.cost.as_ref().map(|cost| cost(argument))
    }
}

impl fmt::Debug for FnHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler")
            .field("has_cost", &self.cost.is_some())
            .finish()
    }
}

// ── Registry ────────────────────────────────────────────────────────

/// How the engine dispatches one operator name.
#[derive(Clone)]
pub(crate) enum Dispatch {
    Route,
    Reserved,
    Handler(Arc<dyn Handler>),
}

/// Operator name to handler mapping.
///
/// Names are normalized to carry the `$` prefix. Registering under an
/// existing overridable name replaces the previous handler; reserved names
/// cannot be registered.
#[derive(Clone)]
pub struct HandlerTable {
    entries: HashMap<String, Dispatch>,
}

impl HandlerTable {
    /// A table with only the reserved operators.
    pub fn empty() -> Self {
        let mut entries = HashMap::new();
        entries.insert(ROUTE.to_string(), Dispatch::Route);
        entries.insert(HANDLERS.to_string(), Dispatch::Reserved);
        Self { entries }
    }

    /// The reserved operators plus the standard operator library.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        crate::handlers::register_builtins(&mut table);
        table
    }

    /// `name` with the directive prefix, added if missing.
    pub fn normalize(name: &str) -> String {
        if name.starts_with(DIRECTIVE_PREFIX) {
            name.to_string()
        } else {
            format!("{DIRECTIVE_PREFIX}{name}")
        }
    }

    pub fn is_reserved(name: &str) -> bool {
        let name = Self::normalize(name);
        name == ROUTE || name == HANDLERS
    }

    pub fn register(&mut self, name: &str, handler: impl Handler + 'static) -> Result<()> {
        self.register_arc(name, Arc::new(handler))
    }

    pub fn register_arc(&mut self, name: &str, handler: Arc<dyn Handler>) -> Result<()> {
        let name = Self::normalize(name);
        if Self::is_reserved(&name) {
            return Err(EngineError::InvalidHandlerRedefinition(name));
        }
        self.entries.insert(name, Dispatch::Handler(handler));
        Ok(())
    }

    pub(crate) fn insert(&mut self, name: &str, handler: Arc<dyn Handler>) {
        self.entries
            .insert(Self::normalize(name), Dispatch::Handler(handler));
    }

    /// Copy every overridable entry of `other` into this table.
    pub fn extend_from(&mut self, other: &HandlerTable) {
        for (name, entry) in &other.entries {
            if let Dispatch::Handler(_) = entry {
                self.entries.insert(name.clone(), entry.clone());
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&Self::normalize(name))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Handler>> {
        match self.entries.get(&Self::normalize(name)) {
            Some(Dispatch::Handler(handler)) => Some(handler.clone()),
            _ => None,
        }
    }

    pub(crate) fn dispatch(&self, operator: &str) -> Option<&Dispatch> {
        self.entries.get(operator)
    }

    /// Registered operator names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for HandlerTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerTable")
            .field("operators", &self.names())
            .finish()
    }
}
