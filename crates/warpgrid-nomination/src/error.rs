//! Nomination error types.

use thiserror::Error;
use warpgrid_state::StateError;

/// Errors surfaced to the scheduler for a single instance/node pair.
///
/// A malformed plan is never one of these: it degrades to an empty plan.
#[derive(Debug, Error)]
pub enum NominationError {
    #[error("getting node {0:?} from snapshot: node not found")]
    NodeNotFound(String),

    #[error("getting node {node:?} from snapshot: {source}")]
    Access {
        node: String,
        #[source]
        source: StateError,
    },

    #[error("encoding plan for node {node:?}: {source}")]
    Encode {
        node: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to patch node {node:?}: {source}")]
    Persist {
        node: String,
        #[source]
        source: StateError,
    },

    #[error("plan on node {node:?} changed under {attempts} consecutive admission attempts")]
    ConflictRetriesExhausted { node: String, attempts: u32 },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl NominationError {
    /// The node this error is about, if any.
    pub fn node(&self) -> Option<&str> {
        match self {
            NominationError::NodeNotFound(node) => Some(node),
            NominationError::Access { node, .. }
            | NominationError::Encode { node, .. }
            | NominationError::Persist { node, .. }
            | NominationError::ConflictRetriesExhausted { node, .. } => Some(node),
            NominationError::Config(_) => None,
        }
    }
}

pub type NominationResult<T> = Result<T, NominationError>;
