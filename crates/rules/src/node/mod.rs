//! Raw data model.
//!
//! Raw nodes live in an [`Arena`] and are addressed by [`NodeId`]. Identity,
//! not structure, is what the memo cache and cycle detection key on: two
//! equal objects allocated separately are two nodes.
//!
//! - [`Data`] is the owned form callers and handlers hand to the engine.
//! - [`RawNode`] is the arena form, possibly holding directives.
//! - [`Value`] is the concrete form produced by materialization.

mod arena;
mod data;
mod function;
mod value;

use std::fmt;

use futures::future::{BoxFuture, Shared};
use indexmap::IndexMap;
use regex::Regex;

use crate::error::Result;

pub use arena::Arena;
pub use data::Data;
pub use function::{DataFuture, Function, RouteFn, Thunk};
pub use value::Value;

/// Prefix every operator name carries.
pub const DIRECTIVE_PREFIX: char = '$';

// ── Identity ────────────────────────────────────────────────────────

/// Stable handle of a raw node inside its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// The shared `null` node.
    pub const NULL: NodeId = NodeId(0);
    /// What navigating to a missing key yields.
    pub const UNDEFINED: NodeId = NodeId(1);

    pub(crate) fn from_index(index: usize) -> Self {
        NodeId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A property name or array index used to navigate a view.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key(String);

impl Key {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_index(&self) -> Option<usize> {
        self.0.parse().ok()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key(s)
    }
}

impl From<&String> for Key {
    fn from(s: &String) -> Self {
        Key(s.clone())
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key(i.to_string())
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.0
    }
}

// ── Raw nodes ───────────────────────────────────────────────────────

pub(crate) type SharedNode = Shared<BoxFuture<'static, Result<NodeId>>>;

/// An asynchronous raw value. Awaiting it twice yields the same node.
#[derive(Clone)]
pub struct Pending(pub(crate) SharedNode);

impl fmt::Debug for Pending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pending")
    }
}

/// Accumulated navigation path below a `$route` directive.
#[derive(Debug, Clone)]
pub struct Route {
    pub(crate) func: RouteFn,
    pub(crate) path: Vec<String>,
}

impl Route {
    pub(crate) fn new(func: RouteFn) -> Self {
        Self {
            func,
            path: Vec::new(),
        }
    }

    pub(crate) fn extend(&self, key: &Key) -> Self {
        let mut path = self.path.clone();
        path.push(key.as_str().to_string());
        Self {
            func: self.func.clone(),
            path,
        }
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }
}

/// A node as stored in the arena.
#[derive(Debug, Clone)]
pub enum RawNode {
    Null,
    Undefined,
    Bool(bool),
    Number(f64),
    String(String),
    Regex(Regex),
    Array(Vec<NodeId>),
    Object(IndexMap<String, NodeId>),
    Function(Function),
    Pending(Pending),
    Route(Route),
    /// Result of an implicit comparison; materializes as a bool.
    Verdict(bool),
}

impl RawNode {
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            RawNode::Null
                | RawNode::Undefined
                | RawNode::Bool(_)
                | RawNode::Number(_)
                | RawNode::String(_)
                | RawNode::Regex(_)
                | RawNode::Verdict(_)
        )
    }

    /// Name reported by reflection helpers.
    pub fn type_name(&self) -> &'static str {
        match self {
            RawNode::Null => "null",
            RawNode::Undefined => "undefined",
            RawNode::Bool(_) | RawNode::Verdict(_) => "boolean",
            RawNode::Number(_) => "number",
            RawNode::String(_) => "string",
            RawNode::Regex(_) => "regex",
            RawNode::Array(_) => "array",
            RawNode::Object(_) | RawNode::Route(_) => "object",
            RawNode::Function(_) => "function",
            RawNode::Pending(_) => "pending",
        }
    }

    /// The `(operator, argument)` pair if this node is shaped like a directive.
    ///
    /// Whether the operator is registered is the handler table's call.
    pub fn directive_parts(&self) -> Option<(&str, NodeId)> {
        match self {
            RawNode::Object(map) if map.len() == 1 => map
                .first()
                .filter(|(key, _)| key.starts_with(DIRECTIVE_PREFIX))
                .map(|(key, arg)| (key.as_str(), *arg)),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RawNode::Bool(b) | RawNode::Verdict(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawNode::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawNode::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[NodeId]> {
        match self {
            RawNode::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, NodeId>> {
        match self {
            RawNode::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, RawNode::Null | RawNode::Undefined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_parts_requires_single_prefixed_key() {
        let mut map = IndexMap::new();
        map.insert("$or".to_string(), NodeId::NULL);
        assert_eq!(
            RawNode::Object(map.clone()).directive_parts(),
            Some(("$or", NodeId::NULL))
        );

        map.insert("other".to_string(), NodeId::NULL);
        assert_eq!(RawNode::Object(map).directive_parts(), None);

        let mut plain = IndexMap::new();
        plain.insert("or".to_string(), NodeId::NULL);
        assert_eq!(RawNode::Object(plain).directive_parts(), None);
    }

    #[test]
    fn keys_from_indexes() {
        let key = Key::from(3usize);
        assert_eq!(key.as_str(), "3");
        assert_eq!(key.as_index(), Some(3));
        assert_eq!(Key::from("name").as_index(), None);
    }
}
