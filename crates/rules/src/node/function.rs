//! Callable raw nodes: zero-argument thunks and route path functions.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};

use crate::error::Result;

use super::Data;

/// Future returned by callables; its output is fed back into resolution.
pub type DataFuture = BoxFuture<'static, Result<Data>>;

/// A callable with no required arguments.
///
/// Plain thunks resolve to themselves; the `$fn` operator invokes them.
/// An optional cost marker tells the estimator how expensive a call is.
#[derive(Clone)]
pub struct Thunk {
    call: Arc<dyn Fn() -> DataFuture + Send + Sync>,
    cost: Option<f64>,
}

impl Thunk {
    pub fn new<F, D>(f: F) -> Self
    where
        F: Fn() -> D + Send + Sync + 'static,
        D: Into<Data>,
    {
        Self {
            call: Arc::new(move || future::ready(Ok(f().into())).boxed()),
            cost: None,
        }
    }

    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Data>> + Send + 'static,
    {
        Self {
            call: Arc::new(move || f().boxed()),
            cost: None,
        }
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn cost(&self) -> Option<f64> {
        self.cost
    }

    pub fn call(&self) -> DataFuture {
        (self.call)()
    }

    pub fn ptr_eq(&self, other: &Thunk) -> bool {
        Arc::ptr_eq(&self.call, &other.call)
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thunk").field("cost", &self.cost).finish()
    }
}

/// The function behind a `$route` directive, called with the navigated path.
#[derive(Clone)]
pub struct RouteFn(Arc<dyn Fn(Vec<String>) -> DataFuture + Send + Sync>);

impl RouteFn {
    pub fn new<F, D>(f: F) -> Self
    where
        F: Fn(Vec<String>) -> D + Send + Sync + 'static,
        D: Into<Data>,
    {
        Self(Arc::new(move |path| future::ready(Ok(f(path).into())).boxed()))
    }

    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(Vec<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Data>> + Send + 'static,
    {
        Self(Arc::new(move |path| f(path).boxed()))
    }

    pub fn call(&self, path: Vec<String>) -> DataFuture {
        (self.0)(path)
    }

    pub fn ptr_eq(&self, other: &RouteFn) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for RouteFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RouteFn")
    }
}

/// Any callable a raw node can hold. Opaque to materialization.
#[derive(Debug, Clone)]
pub enum Function {
    Thunk(Thunk),
    Route(RouteFn),
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Function::Thunk(a), Function::Thunk(b)) => a.ptr_eq(b),
            (Function::Route(a), Function::Route(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<Thunk> for Function {
    fn from(thunk: Thunk) -> Self {
        Function::Thunk(thunk)
    }
}

impl From<RouteFn> for Function {
    fn from(route: RouteFn) -> Self {
        Function::Route(route)
    }
}
