//! Single-level resolution: directive dispatch with memoization.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, trace};

use crate::api::EvalApi;
use crate::context::EvalContext;
use crate::error::{EngineError, Result};
use crate::handler::Dispatch;
use crate::memo::MemoEntry;
use crate::node::{Arena, Function, NodeId, RawNode, Route};
use crate::view::View;

/// Resolve `id` one level: settle pending values and run directives until a
/// node that is neither remains.
///
/// Each node's resolution runs at most once per session. Concurrent requests
/// share the in-flight computation; a request for a directive from within its
/// own evaluation fails with [`EngineError::CycleDetected`].
pub(crate) fn resolve(id: NodeId, ctx: EvalContext) -> BoxFuture<'static, Result<NodeId>> {
    async move {
        let id = settle(ctx.arena(), id).await?;
        let session = ctx.session.clone();
        let node = session.arena().get(id);

        let (entry, started) = session
            .memo()
            .get_or_start(id, || classify(id, &node, &ctx));

        match entry {
            MemoEntry::Ready(result) => {
                if !started {
                    trace!(node = %id, "memo hit");
                }
                result
            }
            MemoEntry::InFlight(shared) => {
                if !started && ctx.path.contains(id) {
                    debug!(node = %id, "directive requested during its own evaluation");
                    return Err(EngineError::CycleDetected(id));
                }
                shared.await
            }
        }
    }
    .boxed()
}

/// Await pending nodes until a settled node is reached. Never dispatches.
pub(crate) async fn settle(arena: &Arc<Arena>, mut id: NodeId) -> Result<NodeId> {
    loop {
        let pending = match &*arena.get(id) {
            RawNode::Pending(pending) => pending.0.clone(),
            _ => return Ok(id),
        };
        id = pending.await?;
    }
}

fn classify(id: NodeId, node: &RawNode, ctx: &EvalContext) -> MemoEntry {
    let Some((operator, argument)) = node.directive_parts() else {
        return MemoEntry::Ready(Ok(id));
    };
    let Some(dispatch) = ctx.session.handlers().dispatch(operator).cloned() else {
        return MemoEntry::Ready(Ok(id));
    };

    let operator = operator.to_string();
    let ctx = ctx.descend(id);
    let computation = async move {
        let session = ctx.session.clone();
        let result = run_directive(id, &operator, argument, dispatch, ctx).await;
        if let Err(err) = &result {
            debug!(node = %id, operator = %operator, error = %err, "directive failed");
        }
        session.memo().settle(id, result.clone());
        result
    };
    MemoEntry::InFlight(computation.boxed().shared())
}

async fn run_directive(
    id: NodeId,
    operator: &str,
    argument: NodeId,
    dispatch: Dispatch,
    ctx: EvalContext,
) -> Result<NodeId> {
    let arena = ctx.arena().clone();
    match dispatch {
        Dispatch::Reserved => Err(EngineError::InvalidHandlerRedefinition(operator.to_string())),
        Dispatch::Route => {
            let target = settle(&arena, argument).await?;
            match &*arena.get(target) {
                RawNode::Function(Function::Route(func)) => {
                    trace!(node = %id, "route captured");
                    Ok(arena.alloc_raw(RawNode::Route(Route::new(func.clone()))))
                }
                RawNode::Route(_) => Ok(target),
                other => Err(EngineError::InvalidRoute(other.type_name())),
            }
        }
        Dispatch::Handler(handler) => {
            debug!(node = %id, operator = %operator, "dispatching directive");
            let view = View::new(argument, ctx.clone());
            let data = handler.handle(view, EvalApi::new(ctx.clone())).await?;
            let next = arena.alloc(data);
            resolve(next, ctx).await
        }
    }
}
