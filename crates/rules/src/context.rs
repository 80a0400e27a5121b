//! Evaluation context threaded through views and handlers.

use std::sync::Arc;

use crate::node::{Arena, Key, NodeId};
use crate::session::Session;
use crate::view::View;

// ── Visitation path ─────────────────────────────────────────────────

struct PathLink {
    id: NodeId,
    parent: VisitPath,
}

/// The raw nodes on the way from the materialization root to the current node.
///
/// A persistent list: pushing shares the parent, so sibling branches never
/// see each other's entries.
#[derive(Clone, Default)]
pub struct VisitPath(Option<Arc<PathLink>>);

impl VisitPath {
    pub fn push(&self, id: NodeId) -> Self {
        VisitPath(Some(Arc::new(PathLink {
            id,
            parent: self.clone(),
        })))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.iter().any(|n| n == id)
    }

    pub fn depth(&self) -> usize {
        self.iter().count()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut cursor = self.0.as_deref();
        std::iter::from_fn(move || {
            let link = cursor?;
            cursor = link.parent.0.as_deref();
            Some(link.id)
        })
    }
}

impl std::fmt::Debug for VisitPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

// ── Context ─────────────────────────────────────────────────────────

/// The sibling an implicit comparison compares against.
#[derive(Debug)]
pub struct Comparison {
    pub root: View,
    pub prop: Key,
}

/// Everything a view needs to resolve its node.
#[derive(Clone)]
pub struct EvalContext {
    pub(crate) session: Arc<Session>,
    /// Property that led to the current view.
    pub(crate) prop: Option<Key>,
    pub(crate) comparison: Option<Arc<Comparison>>,
    pub(crate) path: VisitPath,
}

impl EvalContext {
    pub(crate) fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            prop: None,
            comparison: None,
            path: VisitPath::default(),
        }
    }

    pub(crate) fn arena(&self) -> &Arc<Arena> {
        self.session.arena()
    }

    /// Context for work done underneath `id`.
    pub(crate) fn descend(&self, id: NodeId) -> Self {
        Self {
            path: self.path.push(id),
            ..self.clone()
        }
    }

    pub(crate) fn with_prop(&self, prop: Key) -> Self {
        Self {
            prop: Some(prop),
            ..self.clone()
        }
    }

    pub(crate) fn with_path(&self, path: VisitPath) -> Self {
        Self {
            path,
            ..self.clone()
        }
    }

    /// Rebind the comparison root so that implicit operators below `prop`
    /// compare against `root[prop]`.
    pub(crate) fn with_comparison(&self, root: View, prop: Key) -> Self {
        Self {
            prop: Some(prop.clone()),
            comparison: Some(Arc::new(Comparison { root, prop })),
            ..self.clone()
        }
    }
}

impl std::fmt::Debug for EvalContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvalContext")
            .field("prop", &self.prop)
            .field("comparison", &self.comparison.as_ref().map(|c| &c.prop))
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sibling_paths_do_not_share_entries() {
        let root = VisitPath::default().push(NodeId::from_index(2));
        let left = root.push(NodeId::from_index(3));
        let right = root.push(NodeId::from_index(4));

        assert!(left.contains(NodeId::from_index(2)));
        assert!(left.contains(NodeId::from_index(3)));
        assert!(!right.contains(NodeId::from_index(3)));
        assert_eq!(right.depth(), 2);
        assert_eq!(root.depth(), 1);
    }
}
