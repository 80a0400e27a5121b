//! Lazy declarative rule engine.
//!
//! This crate provides:
//! - Session construction that merges plain data sources (`rulify`)
//! - Lazy views that navigate without evaluating
//! - Directive dispatch with per-node memoization (each node resolves once)
//! - Cost-ordered short-circuiting for boolean and selection operators
//! - Deep materialization with cycle detection
//! - The standard operator library (`$and`, `$match`, `$ref`, `$str`, ...)
//!
//! ```ignore
//! let root = rulify([json!({ "name": { "$str": "${first} ${last}" }, "first": "Ada", "last": "L" })])?;
//! assert_eq!(root.get("name").materialize().await?, Value::from("Ada L"));
//! ```

pub mod api;
pub mod context;
pub mod cost;
pub mod error;
pub mod handler;
pub mod handlers;
pub mod node;
pub mod reference;
pub mod reflect;
pub mod session;
pub mod view;

mod materialize;
mod memo;
mod resolve;

pub use api::EvalApi;
pub use cost::{CostEstimator, CostInput};
pub use error::{EngineError, Result};
pub use handler::{handler_fn, FnHandler, Handler, HandlerTable};
pub use node::{Arena, Data, Function, Key, NodeId, RawNode, RouteFn, Thunk, Value};
pub use rulify_core::EngineConfig;
pub use session::{rulify, Rulify, Session};
pub use view::{Resolved, View};
