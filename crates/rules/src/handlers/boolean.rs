use async_trait::async_trait;

use crate::api::EvalApi;
use crate::error::{EngineError, Result};
use crate::handler::Handler;
use crate::node::Data;
use crate::view::View;

/// Candidates of `$and`/`$or` in the order they should be realized.
async fn candidates(operator: &str, argument: &View, api: &EvalApi) -> Result<Vec<View>> {
    if api.length_of(argument).await?.is_none() {
        return Err(EngineError::invalid_argument(operator, "an array"));
    }
    api.sort_by_cost(argument).await
}

/// Truthiness of `view`, and whether it came from an implicit comparison.
async fn truth(view: &View, api: &EvalApi) -> Result<(bool, bool)> {
    if let Some(verdict) = api.verdict(view).await? {
        return Ok((verdict, true));
    }
    Ok((api.materialize(view).await?.is_truthy(), false))
}

/// Combining only implicit comparisons is itself an implicit comparison, so
/// a structural match takes the result as its outcome.
fn outcome(value: bool, implicit: bool) -> Data {
    if implicit {
        Data::Verdict(value)
    } else {
        Data::Bool(value)
    }
}

/// `$and`: true unless a candidate is falsy. Stops at the first falsy one.
pub struct And;

#[async_trait]
impl Handler for And {
    async fn handle(&self, argument: View, api: EvalApi) -> Result<Data> {
        let candidates = candidates("$and", &argument, &api).await?;
        let mut implicit = !candidates.is_empty();
        for candidate in &candidates {
            let (value, from_verdict) = truth(candidate, &api).await?;
            implicit &= from_verdict;
            if !value {
                return Ok(outcome(false, implicit));
            }
        }
        Ok(outcome(true, implicit))
    }
}

/// `$or`: false unless a candidate is truthy. Stops at the first truthy one.
pub struct Or;

#[async_trait]
impl Handler for Or {
    async fn handle(&self, argument: View, api: EvalApi) -> Result<Data> {
        let candidates = candidates("$or", &argument, &api).await?;
        let mut implicit = !candidates.is_empty();
        for candidate in &candidates {
            let (value, from_verdict) = truth(candidate, &api).await?;
            implicit &= from_verdict;
            if value {
                return Ok(outcome(true, implicit));
            }
        }
        Ok(outcome(false, implicit))
    }
}

pub struct Not;

#[async_trait]
impl Handler for Not {
    async fn handle(&self, argument: View, api: EvalApi) -> Result<Data> {
        let (value, implicit) = truth(&argument, &api).await?;
        Ok(outcome(!value, implicit))
    }
}
