use async_trait::async_trait;

use crate::api::EvalApi;
use crate::cost::CostInput;
use crate::error::{EngineError, Result};
use crate::handler::Handler;
use crate::node::{Data, Value};
use crate::view::View;

/// `$ref`: continue with the node at a path from the session root.
///
/// The referenced node keeps its own memoized resolution, so any number of
/// references to it evaluate it once.
pub struct Ref;

#[async_trait]
impl Handler for Ref {
    async fn handle(&self, argument: View, api: EvalApi) -> Result<Data> {
        match api.materialize(&argument).await? {
            Value::String(path) => Ok(Data::View(api.get_ref(&path)?)),
            _ => Err(EngineError::invalid_argument("$ref", "a path string")),
        }
    }

    fn cost(&self, argument: &CostInput<'_>) -> Option<f64> {
        Some(argument.config().unknown_cost)
    }
}
