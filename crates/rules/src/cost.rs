//! Bounded cost heuristic used to order sibling evaluation.
//!
//! Costs never decide results. They only pick which candidate an operator
//! such as `$or` realizes first. Estimation is bounded by depth and breadth,
//! so cyclic data degrades to flat costs instead of recursing forever.

use std::sync::Arc;

use rulify_core::EngineConfig;

use crate::handler::Dispatch;
use crate::node::{Function, NodeId, RawNode};
use crate::session::Session;

/// Estimates raw node costs within one session.
pub struct CostEstimator {
    session: Arc<Session>,
}

impl CostEstimator {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub fn config(&self) -> &EngineConfig {
        self.session.config()
    }

    pub fn cost(&self, id: NodeId) -> f64 {
        self.cost_at(id, 0)
    }

    pub(crate) fn cost_at(&self, id: NodeId, depth: usize) -> f64 {
        let cfg = self.session.config();
        let node = self.session.arena().get(id);

        if node.is_scalar() {
            return 0.0;
        }
        if self.session.memo().contains(id) {
            return cfg.memoized_cost;
        }

        match &*node {
            RawNode::Function(Function::Thunk(thunk)) => {
                return thunk.cost().unwrap_or(cfg.function_cost)
            }
            RawNode::Function(Function::Route(_)) => return cfg.function_cost,
            RawNode::Pending(_) => return cfg.node_cost,
            RawNode::Route(_) => return cfg.handler_cost,
            _ => {}
        }

        if depth > cfg.max_cost_depth {
            return cfg.node_cost;
        }

        if let Some((operator, argument)) = node.directive_parts() {
            match self.session.handlers().dispatch(operator) {
                Some(Dispatch::Handler(handler)) => {
                    let input = CostInput::new(self, argument, depth + 1);
                    return match handler.cost(&input) {
                        Some(own) => own + self.cost_at(argument, depth + 1),
                        None => cfg.handler_cost,
                    };
                }
                Some(_) => return cfg.handler_cost,
                None => {}
            }
        }

        let children: Box<dyn Iterator<Item = NodeId> + '_> = match &*node {
            RawNode::Array(items) => Box::new(items.iter().copied()),
            RawNode::Object(map) => Box::new(map.values().copied()),
            _ => Box::new(std::iter::empty()),
        };
        cfg.node_cost
            + children
                .take(cfg.max_cost_breadth)
                .map(|child| self.cost_at(child, depth + 1))
                .sum::<f64>()
    }
}

/// A raw node as seen by a handler's cost function.
///
/// Inspection never evaluates anything; pending values and directives are
/// seen as they are stored.
#[derive(Clone)]
pub struct CostInput<'a> {
    estimator: &'a CostEstimator,
    id: NodeId,
    depth: usize,
    node: Arc<RawNode>,
}

impl<'a> CostInput<'a> {
    pub(crate) fn new(estimator: &'a CostEstimator, id: NodeId, depth: usize) -> Self {
        Self {
            estimator,
            id,
            depth,
            node: estimator.session.arena().get(id),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn node(&self) -> &RawNode {
        &self.node
    }

    pub fn config(&self) -> &'a EngineConfig {
        self.estimator.config()
    }

    /// Estimated cost of this node, recursing with the same bounds.
    pub fn cost(&self) -> f64 {
        self.estimator.cost_at(self.id, self.depth)
    }

    pub fn field(&self, key: &str) -> Option<CostInput<'a>> {
        let child = *self.node.as_object()?.get(key)?;
        Some(CostInput::new(self.estimator, child, self.depth + 1))
    }

    pub fn element(&self, index: usize) -> Option<CostInput<'a>> {
        let child = *self.node.as_array()?.get(index)?;
        Some(CostInput::new(self.estimator, child, self.depth + 1))
    }

    pub fn elements(&self) -> Vec<CostInput<'a>> {
        self.node
            .as_array()
            .unwrap_or_default()
            .iter()
            .map(|&child| CostInput::new(self.estimator, child, self.depth + 1))
            .collect()
    }

    /// Array length, object size, zero otherwise.
    pub fn len(&self) -> usize {
        match &*self.node {
            RawNode::Array(items) => items.len(),
            RawNode::Object(map) => map.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_pair(&self) -> bool {
        matches!(&*self.node, RawNode::Array(items) if items.len() == 2)
    }
}

/// Pair each item with its cost and sort ascending, keeping declaration
/// order among equal costs. Fewer than two items are returned untouched
/// without computing any cost.
pub(crate) fn sort_by_cost<T, F>(items: Vec<T>, mut cost: F) -> Vec<T>
where
    F: FnMut(&T) -> f64,
{
    if items.len() < 2 {
        return items;
    }
    let mut scored: Vec<(f64, T)> = items.into_iter().map(|item| (cost(&item), item)).collect();
    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    scored.into_iter().map(|(_, item)| item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use crate::node::{Data, Thunk};
    use crate::session::Rulify;
    use serde_json::json;

    fn estimator_for(data: Data) -> (CostEstimator, NodeId) {
        let root = Rulify::new()
            .source(Data::object([("value", data)]))
            .handler(
                "calc",
                handler_fn(|arg, _| async move { Ok(Data::View(arg)) })
                    .with_cost(|input| input.node().as_f64().unwrap_or(0.0)),
            )
            .build()
            .unwrap();
        let session = root.session().clone();
        let value = session.arena().child(session.root(), &"value".into());
        (CostEstimator::new(session), value)
    }

    #[test]
    fn scalars_are_free() {
        let (estimator, value) = estimator_for(Data::from("text"));
        assert_eq!(estimator.cost(value), 0.0);
    }

    #[test]
    fn thunks_use_their_marker() {
        let (estimator, value) = estimator_for(Thunk::new(|| 1).with_cost(3.0).into());
        assert_eq!(estimator.cost(value), 3.0);

        let (estimator, value) = estimator_for(Data::thunk(|| 1));
        assert_eq!(estimator.cost(value), 10.0);
    }

    #[test]
    fn directives_add_declared_cost_to_argument_cost() {
        let (estimator, value) = estimator_for(Data::directive("calc", 7));
        assert_eq!(estimator.cost(value), 7.0);

        let (estimator, value) = estimator_for(Data::directive("calc", json!([1, 2])));
        assert_eq!(estimator.cost(value), 1.0);

        let (estimator, value) = estimator_for(Data::directive("if", json!({})));
        assert_eq!(estimator.cost(value), 10.0);
    }

    #[test]
    fn aggregates_sum_children_plus_overhead() {
        let thunk = Thunk::new(|| 1).with_cost(5.0);
        let (estimator, value) = estimator_for(Data::array([Data::from(thunk), Data::from(1)]));
        assert_eq!(estimator.cost(value), 6.0);
    }

    #[test]
    fn cyclic_data_degrades_to_flat_cost() {
        let (estimator, value) = estimator_for(json!({ "a": 1 }).into());
        let arena = estimator.session.arena().clone();
        arena.insert(value, "self", value).unwrap();

        let cost = estimator.cost(value);
        assert!(cost.is_finite());
        assert!(cost > 1.0);
    }

    #[test]
    fn sorting_is_stable_and_skips_single_items() {
        let mut calls = 0;
        let single = sort_by_cost(vec!["only"], |_| {
            calls += 1;
            0.0
        });
        assert_eq!(single, ["only"]);
        assert_eq!(calls, 0);

        let sorted = sort_by_cost(vec![(10, 'a'), (5, 'b'), (10, 'c'), (1, 'd')], |x| x.0 as f64);
        assert_eq!(sorted, [(1, 'd'), (5, 'b'), (10, 'a'), (10, 'c')]);
    }
}
