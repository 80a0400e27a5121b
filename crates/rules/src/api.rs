//! The surface handlers use to call back into the engine.

use std::sync::Arc;

use rulify_core::EngineConfig;
use tracing::trace;

use crate::context::EvalContext;
use crate::cost::{sort_by_cost, CostEstimator, CostInput};
use crate::error::Result;
use crate::node::{Arena, Data, Key, NodeId, RawNode, Value};
use crate::reference::parse_path;
use crate::reflect;
use crate::view::View;

/// Handed to every handler invocation. Cheap to clone.
///
/// Views obtained through the api carry the handler's visitation path, so
/// cycles through the handler's own directive are detected.
#[derive(Clone, Debug)]
pub struct EvalApi {
    ctx: EvalContext,
}

impl EvalApi {
    pub(crate) fn new(ctx: EvalContext) -> Self {
        Self { ctx }
    }

    /// The session root.
    pub fn root(&self) -> View {
        let ctx = EvalContext::new(self.ctx.session.clone()).with_path(self.ctx.path.clone());
        View::new(self.ctx.session.root(), ctx)
    }

    /// Property that led to the directive being evaluated.
    pub fn prop(&self) -> Option<&Key> {
        self.ctx.prop.as_ref()
    }

    pub fn arena(&self) -> &Arc<Arena> {
        self.ctx.arena()
    }

    pub fn config(&self) -> &EngineConfig {
        self.ctx.session.config()
    }

    pub async fn materialize(&self, view: &View) -> Result<Value> {
        view.with_path(self.ctx.path.clone()).materialize().await
    }

    /// Elements of `view` in ascending cost order.
    pub async fn sort_by_cost(&self, view: &View) -> Result<Vec<View>> {
        self.sort_by_cost_with(view, |input| Some(input)).await
    }

    /// Elements of `view` ordered by the cost of whatever `accessor` picks
    /// out of each raw element. Elements the accessor rejects cost nothing.
    pub async fn sort_by_cost_with<F>(&self, view: &View, accessor: F) -> Result<Vec<View>>
    where
        F: for<'a> Fn(CostInput<'a>) -> Option<CostInput<'a>> + Send,
    {
        let elements = view.with_path(self.ctx.path.clone()).elements().await?;
        if elements.len() < 2 {
            return Ok(elements);
        }

        let estimator = CostEstimator::new(self.ctx.session.clone());
        let count = elements.len();
        let sorted = sort_by_cost(elements, |element| {
            let input = CostInput::new(&estimator, element.raw_node(), 0);
            accessor(input).map(|picked| picked.cost()).unwrap_or(0.0)
        });
        trace!(candidates = count, "ordered by cost");
        Ok(sorted)
    }

    /// Entries of a mapping in ascending cost of their values.
    pub async fn sort_entries_by_cost(&self, view: &View) -> Result<Vec<(String, View)>> {
        let entries = view.with_path(self.ctx.path.clone()).entries().await?;
        let estimator = CostEstimator::new(self.ctx.session.clone());
        Ok(sort_by_cost(entries, |(_, value)| {
            estimator.cost(value.raw_node())
        }))
    }

    /// What an implicit comparison compares against: the rebound sibling when
    /// inside a structural match, `undefined` otherwise.
    pub fn comparison_target(&self) -> View {
        match &self.ctx.comparison {
            Some(comparison) => comparison
                .root
                .get(comparison.prop.clone())
                .with_path(self.ctx.path.clone()),
            None => View::new(NodeId::UNDEFINED, self.ctx.clone()),
        }
    }

    /// Whether a structural match has rebound the comparison root.
    pub fn is_rebound(&self) -> bool {
        self.ctx.comparison.is_some()
    }

    /// The outcome of `view` if it resolves to an implicit comparison.
    pub async fn verdict(&self, view: &View) -> Result<Option<bool>> {
        let resolved = view.with_path(self.ctx.path.clone()).force().await?;
        Ok(match &*resolved {
            RawNode::Verdict(verdict) => Some(*verdict),
            _ => None,
        })
    }

    /// The view at a `.`/`[n]` path from the session root. Lazy.
    pub fn get_ref(&self, path: &str) -> Result<View> {
        Ok(self.root().at(parse_path(path)?))
    }

    /// Wrap data as a view in this context. Views pass through unchanged.
    pub fn wrap(&self, data: impl Into<Data>) -> View {
        match data.into() {
            Data::View(view) => view,
            data => View::new(self.arena().alloc(data), self.ctx.clone()),
        }
    }

    // ── Reflection ──────────────────────────────────────────────────

    pub async fn type_of(&self, view: &View) -> Result<&'static str> {
        reflect::type_of(&view.with_path(self.ctx.path.clone())).await
    }

    pub async fn keys_of(&self, view: &View) -> Result<Option<Vec<String>>> {
        reflect::keys_of(&view.with_path(self.ctx.path.clone())).await
    }

    pub async fn length_of(&self, view: &View) -> Result<Option<usize>> {
        reflect::length_of(&view.with_path(self.ctx.path.clone())).await
    }

    pub async fn has(&self, view: &View, key: &str) -> Result<bool> {
        reflect::has(&view.with_path(self.ctx.path.clone()), key).await
    }
}
