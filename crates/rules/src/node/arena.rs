use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use futures::future::FutureExt;
use tracing::trace;

use crate::error::{EngineError, Result};

use super::data::Data;
use super::{Key, NodeId, Pending, RawNode};

/// Append-only storage for raw nodes.
///
/// Nodes are never removed, so a `NodeId` stays valid for the arena's
/// lifetime. Aggregates can gain entries after allocation through
/// [`Arena::insert`] and [`Arena::append`], which is how self-referential
/// graphs are built.
#[derive(Debug)]
pub struct Arena {
    nodes: RwLock<Vec<Arc<RawNode>>>,
    derived: Mutex<HashMap<Derived, NodeId>>,
}

/// Nodes produced by navigation rather than by allocation of data.
#[derive(Debug, PartialEq, Eq, Hash)]
enum Derived {
    Length(usize),
    RouteStep(NodeId, Key),
}

impl Arena {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            nodes: RwLock::new(vec![Arc::new(RawNode::Null), Arc::new(RawNode::Undefined)]),
            derived: Mutex::new(HashMap::new()),
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The node behind `id`. Unknown ids read as `undefined`.
    pub fn get(&self, id: NodeId) -> Arc<RawNode> {
        let nodes = self.nodes.read().unwrap_or_else(PoisonError::into_inner);
        nodes
            .get(id.index())
            .unwrap_or(&nodes[NodeId::UNDEFINED.index()])
            .clone()
    }

    pub(crate) fn alloc_raw(&self, node: RawNode) -> NodeId {
        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        let id = NodeId::from_index(nodes.len());
        nodes.push(Arc::new(node));
        id
    }

    /// Allocate owned data, recursively, and return the new root id.
    ///
    /// A [`Data::Node`] is returned as is. A [`Data::View`] over this arena
    /// yields the view's raw node; a view over another arena is copied in
    /// once materialized.
    pub fn alloc(self: &Arc<Self>, data: impl Into<Data>) -> NodeId {
        match data.into() {
            Data::Null => NodeId::NULL,
            Data::Undefined => NodeId::UNDEFINED,
            Data::Node(id) => id,
            Data::Bool(b) => self.alloc_raw(RawNode::Bool(b)),
            Data::Number(n) => self.alloc_raw(RawNode::Number(n)),
            Data::String(s) => self.alloc_raw(RawNode::String(s)),
            Data::Regex(re) => self.alloc_raw(RawNode::Regex(re)),
            Data::Verdict(b) => self.alloc_raw(RawNode::Verdict(b)),
            Data::Function(func) => self.alloc_raw(RawNode::Function(func)),
            Data::Array(items) => {
                let ids = items.into_iter().map(|item| self.alloc(item)).collect();
                self.alloc_raw(RawNode::Array(ids))
            }
            Data::Object(map) => {
                let entries = map.into_iter().map(|(k, v)| (k, self.alloc(v))).collect();
                self.alloc_raw(RawNode::Object(entries))
            }
            Data::Pending(fut) => {
                let arena = Arc::downgrade(self);
                let shared = async move {
                    let data = fut.await?;
                    let arena = arena.upgrade().ok_or(EngineError::ArenaReleased)?;
                    let id = arena.alloc(data);
                    trace!(node = %id, "pending value settled");
                    Ok(id)
                }
                .boxed()
                .shared();
                self.alloc_raw(RawNode::Pending(Pending(shared)))
            }
            Data::View(view) => {
                if Arc::ptr_eq(view.arena(), self) {
                    view.raw_node()
                } else {
                    let copy = async move { Ok(Data::from(view.materialize().await?)) };
                    self.alloc(Data::Pending(copy.boxed()))
                }
            }
        }
    }

    /// Set `key` on an object node.
    pub fn insert(&self, object: NodeId, key: impl Into<String>, child: NodeId) -> Result<()> {
        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        match nodes.get_mut(object.index()).map(Arc::make_mut) {
            Some(RawNode::Object(map)) => {
                map.insert(key.into(), child);
                Ok(())
            }
            _ => Err(EngineError::NotAggregate(object)),
        }
    }

    /// Push an element onto an array node.
    pub fn append(&self, array: NodeId, child: NodeId) -> Result<()> {
        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        match nodes.get_mut(array.index()).map(Arc::make_mut) {
            Some(RawNode::Array(items)) => {
                items.push(child);
                Ok(())
            }
            _ => Err(EngineError::NotAggregate(array)),
        }
    }

    /// One navigation step on an already-resolved node. Never evaluates.
    ///
    /// Missing keys yield `undefined`. Navigating a route accumulator extends
    /// its path instead of looking anything up. Lengths and route steps are
    /// allocated once and reused, so repeated navigation does not grow the arena.
    pub fn child(&self, parent: NodeId, key: &Key) -> NodeId {
        let node = self.get(parent);
        match &*node {
            RawNode::Object(map) => map.get(key.as_str()).copied().unwrap_or(NodeId::UNDEFINED),
            RawNode::Array(items) if key.as_str() == "length" => {
                let len = items.len();
                self.derive(Derived::Length(len), || RawNode::Number(len as f64))
            }
            RawNode::Array(items) => key
                .as_index()
                .and_then(|i| items.get(i))
                .copied()
                .unwrap_or(NodeId::UNDEFINED),
            RawNode::String(s) if key.as_str() == "length" => {
                let len = s.chars().count();
                self.derive(Derived::Length(len), || RawNode::Number(len as f64))
            }
            RawNode::Route(route) => self.derive(Derived::RouteStep(parent, key.clone()), || {
                RawNode::Route(route.extend(key))
            }),
            _ => NodeId::UNDEFINED,
        }
    }

    fn derive(&self, derived: Derived, make: impl FnOnce() -> RawNode) -> NodeId {
        let mut cache = self.derived.lock().unwrap_or_else(PoisonError::into_inner);
        *cache
            .entry(derived)
            .or_insert_with(|| self.alloc_raw(make()))
    }
}
