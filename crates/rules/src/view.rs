//! Lazy views over raw nodes.
//!
//! Navigating a view is free: it only records the key. Work happens when a
//! view is forced (one level, also available through `.await`), iterated, or
//! materialized.

use std::fmt;
use std::future::IntoFuture;
use std::ops::Deref;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use crate::context::{EvalContext, VisitPath};
use crate::error::Result;
use crate::materialize::materialize;
use crate::node::{Arena, Data, Key, NodeId, RawNode, Value};
use crate::resolve::{resolve, settle};
use crate::session::Session;

/// A handle over one raw node plus the context it is evaluated in.
///
/// The node is addressed as a base node and the keys navigated from it, so a
/// view can point below values that have not been resolved yet.
#[derive(Clone)]
pub struct View {
    base: NodeId,
    path: Vec<Key>,
    ctx: EvalContext,
}

/// The single-level resolved form of a view.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub id: NodeId,
    pub node: Arc<RawNode>,
}

impl Deref for Resolved {
    type Target = RawNode;

    fn deref(&self) -> &RawNode {
        &self.node
    }
}

impl View {
    pub(crate) fn new(base: NodeId, ctx: EvalContext) -> Self {
        Self {
            base,
            path: Vec::new(),
            ctx,
        }
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// The view at `key` below this one. Never evaluates.
    pub fn get(&self, key: impl Into<Key>) -> View {
        let key = key.into();
        let mut path = self.path.clone();
        path.push(key.clone());
        View {
            base: self.base,
            path,
            ctx: self.ctx.with_prop(key),
        }
    }

    pub fn index(&self, index: usize) -> View {
        self.get(index)
    }

    /// Follow several keys at once.
    pub fn at<I, K>(&self, keys: I) -> View
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        keys.into_iter().fold(self.clone(), |view, key| view.get(key))
    }

    /// Like [`View::get`], but implicit comparisons below the returned view
    /// compare against `root[key]`.
    pub fn get_with_root(&self, key: impl Into<Key>, root: View) -> View {
        let key = key.into();
        let mut view = self.get(key.clone());
        view.ctx = view.ctx.with_comparison(root, key);
        view
    }

    /// The property that led to this view.
    pub fn prop(&self) -> Option<&Key> {
        self.ctx.prop.as_ref()
    }

    pub fn arena(&self) -> &Arc<Arena> {
        self.ctx.arena()
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.ctx.session
    }

    pub(crate) fn context(&self) -> &EvalContext {
        &self.ctx
    }

    pub(crate) fn with_path(&self, path: VisitPath) -> View {
        View {
            ctx: self.ctx.with_path(path),
            ..self.clone()
        }
    }

    // ── Evaluation ──────────────────────────────────────────────────

    /// The raw node this view points at, resolving every level above it.
    pub async fn locate(&self) -> Result<NodeId> {
        let mut id = self.base;
        for key in &self.path {
            let parent = resolve(id, self.ctx.clone()).await?;
            id = self.arena().child(parent, key);
        }
        Ok(id)
    }

    /// Resolve one level.
    pub async fn force(&self) -> Result<Resolved> {
        let id = self.locate().await?;
        let id = resolve(id, self.ctx.clone()).await?;
        Ok(Resolved {
            id,
            node: self.arena().get(id),
        })
    }

    /// The raw node with pending values settled but directives left as they are.
    pub async fn unwrap_raw(&self) -> Result<Resolved> {
        let id = self.locate().await?;
        let id = settle(self.arena(), id).await?;
        Ok(Resolved {
            id,
            node: self.arena().get(id),
        })
    }

    /// Element views of a sequence. Anything else has no elements.
    pub async fn elements(&self) -> Result<Vec<View>> {
        let resolved = self.force().await?;
        let views = match resolved.as_array() {
            Some(items) => items
                .iter()
                .enumerate()
                .map(|(i, &item)| View {
                    base: item,
                    path: Vec::new(),
                    ctx: self.ctx.with_prop(Key::from(i)),
                })
                .collect(),
            None => Vec::new(),
        };
        Ok(views)
    }

    /// Key and value views of a mapping. Anything else has no entries.
    pub async fn entries(&self) -> Result<Vec<(String, View)>> {
        let resolved = self.force().await?;
        let entries = match resolved.as_object() {
            Some(map) => map
                .iter()
                .map(|(key, &item)| {
                    let view = View {
                        base: item,
                        path: Vec::new(),
                        ctx: self.ctx.with_prop(Key::from(key)),
                    };
                    (key.clone(), view)
                })
                .collect(),
            None => Vec::new(),
        };
        Ok(entries)
    }

    /// Deep realization.
    pub fn materialize(&self) -> BoxFuture<'static, Result<Value>> {
        materialize(self.clone())
    }

    /// A node standing for this view inside its arena.
    ///
    /// A view without navigation is its base node. Otherwise a pending node
    /// is allocated that locates the target when first awaited.
    pub fn raw_node(&self) -> NodeId {
        if self.path.is_empty() {
            return self.base;
        }
        let view = self.clone();
        self.arena()
            .alloc(Data::pending(async move { Ok(Data::Node(view.locate().await?)) }))
    }
}

impl IntoFuture for View {
    type Output = Result<Resolved>;
    type IntoFuture = BoxFuture<'static, Result<Resolved>>;

    fn into_future(self) -> Self::IntoFuture {
        async move { self.force().await }.boxed()
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("base", &self.base)
            .field("path", &self.path)
            .field("ctx", &self.ctx)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::rulify;
    use serde_json::json;

    #[tokio::test]
    async fn navigation_does_not_evaluate() {
        let root = rulify([json!({ "a": { "b": [1, 2, 3] } })]).unwrap();
        let view = root.get("a").get("b").index(2);
        assert_eq!(view.prop(), Some(&Key::from(2usize)));
        assert_eq!(root.session().memo().len(), 0);

        let resolved = view.await.unwrap();
        assert_eq!(resolved.as_f64(), Some(3.0));
    }

    #[tokio::test]
    async fn elements_of_non_sequences_are_empty() {
        let root = rulify([json!({ "list": ["x", "y"], "scalar": 4 })]).unwrap();
        assert_eq!(root.get("list").elements().await.unwrap().len(), 2);
        assert!(root.get("scalar").elements().await.unwrap().is_empty());
        assert!(root.get("missing").elements().await.unwrap().is_empty());

        let entries = root.entries().await.unwrap();
        let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["list", "scalar"]);
    }

    #[tokio::test]
    async fn raw_node_of_root_is_base() {
        let root = rulify([json!({ "a": 1 })]).unwrap();
        assert_eq!(root.raw_node(), root.session().root());

        let child = root.get("a").raw_node();
        let settled = settle(root.arena(), child).await.unwrap();
        assert_eq!(root.arena().get(settled).as_f64(), Some(1.0));
    }
}
