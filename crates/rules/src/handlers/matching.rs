//! Structural matching.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};

use crate::api::EvalApi;
use crate::cost::CostInput;
use crate::error::Result;
use crate::handler::Handler;
use crate::node::{Data, RawNode};
use crate::view::View;

/// `$match`: explicit `[subject, pattern]` or implicit against the
/// comparison target, which is the session root outside another match.
///
/// Matching is asymmetric. Every key of a pattern object must match the
/// subject's key and extra subject keys are ignored. Arrays match
/// element-wise and must have equal length. A regex literal tests a string
/// subject. Directives nested in the pattern see the subject position they
/// sit at as their comparison target.
pub struct Match;

#[async_trait]
impl Handler for Match {
    async fn handle(&self, argument: View, api: EvalApi) -> Result<Data> {
        if api.length_of(&argument).await? == Some(2) {
            let matched = matches(&api, argument.index(0), argument.index(1)).await?;
            Ok(Data::Bool(matched))
        } else {
            // Top-level implicit matches test the session root.
            let subject = if api.is_rebound() {
                api.comparison_target()
            } else {
                api.root()
            };
            let matched = matches(&api, subject, argument).await?;
            Ok(Data::Verdict(matched))
        }
    }

    fn cost(&self, argument: &CostInput<'_>) -> Option<f64> {
        if argument.is_pair() {
            Some(0.0)
        } else {
            Some(argument.config().unknown_cost)
        }
    }
}

/// Whether `subject` matches `pattern`.
pub fn matches<'a>(api: &'a EvalApi, subject: View, pattern: View) -> BoxFuture<'a, Result<bool>> {
    async move {
        let resolved = pattern.force().await?;
        match &*resolved {
            RawNode::Verdict(verdict) => Ok(*verdict),
            RawNode::Regex(re) => {
                let value = api.materialize(&subject).await?;
                Ok(value.as_str().is_some_and(|s| re.is_match(s)))
            }
            RawNode::Object(_) => {
                if api.keys_of(&subject).await?.is_none() {
                    return Ok(false);
                }
                for (key, _) in api.sort_entries_by_cost(&pattern).await? {
                    let child = pattern.get_with_root(key.as_str(), subject.clone());
                    if !matches(api, subject.get(key.as_str()), child).await? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            RawNode::Array(items) => {
                if api.length_of(&subject).await? != Some(items.len()) {
                    return Ok(false);
                }
                for index in 0..items.len() {
                    let child = pattern.get_with_root(index, subject.clone());
                    if !matches(api, subject.index(index), child).await? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => {
                // A missing subject key only matches a missing pattern value, never null.
                let pattern_missing = matches!(&*resolved, RawNode::Undefined);
                let subject_missing = api.type_of(&subject).await? == "undefined";
                if pattern_missing != subject_missing {
                    return Ok(false);
                }
                let expected = api.materialize(&pattern).await?;
                let actual = api.materialize(&subject).await?;
                Ok(expected == actual)
            }
        }
    }
    .boxed()
}
