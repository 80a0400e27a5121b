//! Deep realization of views into concrete values.

use futures::future::{BoxFuture, FutureExt};
use indexmap::IndexMap;
use tracing::debug;

use crate::context::EvalContext;
use crate::error::{EngineError, Result};
use crate::node::{NodeId, RawNode, Value};
use crate::resolve::resolve;
use crate::view::View;

/// Realize `view` completely.
///
/// Fails with [`EngineError::CycleDetected`] when a node recurs on the path
/// from the materialized view down to the current node.
pub(crate) fn materialize(view: View) -> BoxFuture<'static, Result<Value>> {
    async move {
        let id = view.locate().await?;
        materialize_node(id, view.context().clone()).await
    }
    .boxed()
}

fn materialize_node(id: NodeId, ctx: EvalContext) -> BoxFuture<'static, Result<Value>> {
    async move {
        let id = resolve(id, ctx.clone()).await?;
        if ctx.path.contains(id) {
            debug!(node = %id, depth = ctx.path.depth(), "cycle detected during materialization");
            return Err(EngineError::CycleDetected(id));
        }

        let node = ctx.arena().get(id);
        let value = match &*node {
            RawNode::Null | RawNode::Undefined => Value::Null,
            RawNode::Bool(b) | RawNode::Verdict(b) => Value::Bool(*b),
            RawNode::Number(n) => Value::Number(*n),
            RawNode::String(s) => Value::String(s.clone()),
            RawNode::Regex(re) => Value::Regex(re.clone()),
            RawNode::Function(func) => Value::Function(func.clone()),
            RawNode::Pending(pending) => {
                let next = pending.0.clone().await?;
                return materialize_node(next, ctx).await;
            }
            RawNode::Route(route) => {
                let data = route.func.call(route.path.clone()).await?;
                let next = ctx.arena().alloc(data);
                return materialize_node(next, ctx.descend(id)).await;
            }
            RawNode::Array(items) => {
                let ctx = ctx.descend(id);
                let mut out = Vec::with_capacity(items.len());
                for &item in items {
                    out.push(materialize_node(item, ctx.clone()).await?);
                }
                Value::Array(out)
            }
            RawNode::Object(map) => {
                let ctx = ctx.descend(id);
                let mut out = IndexMap::with_capacity(map.len());
                for (key, &item) in map {
                    out.insert(key.clone(), materialize_node(item, ctx.clone()).await?);
                }
                Value::Object(out)
            }
        };
        Ok(value)
    }
    .boxed()
}
