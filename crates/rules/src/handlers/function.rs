use async_trait::async_trait;

use crate::api::EvalApi;
use crate::cost::CostInput;
use crate::error::{EngineError, Result};
use crate::handler::Handler;
use crate::node::{Data, Function, RawNode};
use crate::view::View;

/// `$fn`: call a zero-argument thunk and continue with its result.
///
/// The argument is read raw so the thunk is called, not treated as a value.
/// An argument that only yields a thunk once resolved is resolved first.
pub struct Call;

#[async_trait]
impl Handler for Call {
    async fn handle(&self, argument: View, _api: EvalApi) -> Result<Data> {
        let raw = argument.unwrap_raw().await?;
        if let RawNode::Function(Function::Thunk(thunk)) = &*raw {
            return thunk.call().await;
        }

        let resolved = argument.force().await?;
        match &*resolved {
            RawNode::Function(Function::Thunk(thunk)) => thunk.call().await,
            _ => Err(EngineError::invalid_argument("$fn", "a function")),
        }
    }

    /// Calling costs what the thunk declares; that is the argument's own cost.
    fn cost(&self, _argument: &CostInput<'_>) -> Option<f64> {
        Some(0.0)
    }
}
