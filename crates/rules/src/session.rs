//! Session construction: merging data sources under one handler table.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use rulify_core::EngineConfig;
use tracing::debug;

use crate::context::EvalContext;
use crate::error::{EngineError, Result};
use crate::handler::{Handler, HandlerTable};
use crate::memo::MemoCache;
use crate::node::{Arena, Data, NodeId, RawNode};
use crate::view::View;

/// One `rulify` call's merged data, handler table and memo cache.
pub struct Session {
    arena: Arc<Arena>,
    root: NodeId,
    handlers: HandlerTable,
    memo: MemoCache,
    config: EngineConfig,
}

impl Session {
    pub fn arena(&self) -> &Arc<Arena> {
        &self.arena
    }

    /// The merged root object.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn handlers(&self) -> &HandlerTable {
        &self.handlers
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn memo(&self) -> &MemoCache {
        &self.memo
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("root", &self.root)
            .field("handlers", &self.handlers)
            .field("config", &self.config)
            .finish()
    }
}

// ── Builder ─────────────────────────────────────────────────────────

/// Builds a session and returns its root view.
///
/// Sources are merged left to right at the top level only. A source that is
/// a previous session's view contributes its root entries and its handlers;
/// the new session starts with an empty memo cache.
pub struct Rulify {
    arena: Option<Arc<Arena>>,
    sources: Vec<Data>,
    custom: Vec<(String, Arc<dyn Handler>)>,
    config: EngineConfig,
}

impl Rulify {
    pub fn new() -> Self {
        Self {
            arena: None,
            sources: Vec::new(),
            custom: Vec::new(),
            config: EngineConfig::default(),
        }
    }

    /// Allocate into an existing arena, e.g. one holding hand-built cyclic data.
    pub fn with_arena(mut self, arena: Arc<Arena>) -> Self {
        self.arena = Some(arena);
        self
    }

    pub fn source(mut self, source: impl Into<Data>) -> Self {
        self.sources.push(source.into());
        self
    }

    pub fn sources<I, D>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<Data>,
    {
        self.sources.extend(sources.into_iter().map(Into::into));
        self
    }

    /// Register a custom operator. The `$` prefix is added if missing.
    pub fn handler(mut self, name: &str, handler: impl Handler + 'static) -> Self {
        self.custom.push((name.to_string(), Arc::new(handler)));
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<View> {
        let arena = match self.arena {
            Some(arena) => arena,
            None => self
                .sources
                .iter()
                .find_map(|source| match source {
                    Data::View(view) => Some(view.arena().clone()),
                    _ => None,
                })
                .unwrap_or_else(Arena::new),
        };

        let mut handlers = HandlerTable::builtin();
        let mut merged: IndexMap<String, NodeId> = IndexMap::new();
        let source_count = self.sources.len();

        for source in self.sources {
            match source {
                Data::Null | Data::Undefined => {}
                Data::Object(map) => {
                    for (key, value) in map {
                        let id = arena.alloc(value);
                        merged.insert(key, id);
                    }
                }
                Data::View(view) => {
                    if !Arc::ptr_eq(view.arena(), &arena) {
                        return Err(EngineError::InvalidSource(
                            "view belongs to a different arena".to_string(),
                        ));
                    }
                    handlers.extend_from(view.session().handlers());
                    merge_node(&arena, view.raw_node(), &mut merged)?;
                }
                Data::Node(id) => merge_node(&arena, id, &mut merged)?,
                other => {
                    return Err(EngineError::InvalidSource(format!(
                        "expected an object, found {other:?}"
                    )))
                }
            }
        }

        for (name, handler) in self.custom {
            handlers.register_arc(&name, handler)?;
        }

        let root = arena.alloc_raw(RawNode::Object(merged));
        debug!(
            root = %root,
            sources = source_count,
            operators = handlers.len(),
            profile = self.config.profile_label(),
            "session created"
        );

        let session = Arc::new(Session {
            arena,
            root,
            handlers,
            memo: MemoCache::default(),
            config: self.config,
        });
        Ok(View::new(root, EvalContext::new(session)))
    }
}

impl Default for Rulify {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_node(arena: &Arena, id: NodeId, merged: &mut IndexMap<String, NodeId>) -> Result<()> {
    match &*arena.get(id) {
        RawNode::Object(map) => {
            merged.extend(map.iter().map(|(k, v)| (k.clone(), *v)));
            Ok(())
        }
        RawNode::Null | RawNode::Undefined => Ok(()),
        other => Err(EngineError::InvalidSource(format!(
            "expected an object, found {}",
            other.type_name()
        ))),
    }
}

/// Merge `sources` into a new session with the built-in operators.
pub fn rulify<I, D>(sources: I) -> Result<View>
where
    I: IntoIterator<Item = D>,
    D: Into<Data>,
{
    Rulify::new().sources(sources).build()
}
