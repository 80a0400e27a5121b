//! Error types for rulification and materialization.

use std::sync::Arc;

use crate::node::NodeId;

/// Errors surfaced by resolution, materialization and session construction.
///
/// Cloneable because a failed resolution is memoized like a successful one and
/// handed to every waiter of the shared in-flight computation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// A node recurred on the active visitation path.
    #[error("Cycle detected at node {0}")]
    CycleDetected(NodeId),

    /// A handler's own failure, propagated unchanged.
    #[error("{0}")]
    Handler(Arc<anyhow::Error>),

    /// A reserved operator name was used as a directive or registered as a handler.
    #[error("'{0}' is reserved and can only be used by the engine itself")]
    InvalidHandlerRedefinition(String),

    /// A data source passed to `rulify` could not be merged.
    #[error("Invalid data source: {0}")]
    InvalidSource(String),

    /// A reference path could not be parsed.
    #[error("Invalid reference path '{0}'")]
    InvalidReference(String),

    /// An operator received an argument of the wrong shape.
    #[error("{operator} expected {expected}")]
    InvalidArgument { operator: String, expected: String },

    /// A `$route` directive whose argument is not a path function.
    #[error("$route expects a path function, found {0}")]
    InvalidRoute(&'static str),

    /// Entries can only be added to object and array nodes.
    #[error("Node {0} is not an aggregate")]
    NotAggregate(NodeId),

    /// A pending value outlived the arena it was allocated in.
    #[error("Arena was released before a pending value settled")]
    ArenaReleased,

    #[error("Invalid regular expression: {0}")]
    Regex(#[from] regex::Error),
}

impl EngineError {
    /// Wrap an arbitrary handler failure.
    ///
    /// Engine errors that travelled through `anyhow` come back as themselves.
    pub fn handler(err: impl Into<anyhow::Error>) -> Self {
        let err = err.into();
        match err.downcast::<EngineError>() {
            Ok(engine) => engine,
            Err(other) => EngineError::Handler(Arc::new(other)),
        }
    }

    pub(crate) fn invalid_argument(operator: &str, expected: &str) -> Self {
        EngineError::InvalidArgument {
            operator: operator.to_string(),
            expected: expected.to_string(),
        }
    }

    pub fn is_cycle(&self) -> bool {
        matches!(self, EngineError::CycleDetected(_))
    }
}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        EngineError::handler(err)
    }
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
