//! Typed failures for catalog operations.
//!
//! Every variant names the identity, media item, or tag it concerns so the
//! caller can refresh or report exactly that item, never a bare
//! "operation failed".

use thiserror::Error;

use crate::catalog::{IdentityId, MediaId};

/// What kind of catalog entity a failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Identity,
    Embedding,
    Media,
    Tag,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntityKind::Identity => "identity",
            EntityKind::Embedding => "embedding",
            EntityKind::Media => "media",
            EntityKind::Tag => "tag",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// An id vanished between computing a candidate list and acting on it.
    /// The catalog was not mutated; the caller should refresh and re-select.
    #[error("stale selection: identity {0} no longer exists in the catalog")]
    StaleSelection(IdentityId),

    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },

    /// Network failure or timeout while talking to the catalog backend.
    /// No partial local mutation is assumed.
    #[error("catalog backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Rejected before any network call.
    #[error("invalid request: {0}")]
    Validation(String),

    /// A bulk tag operation where some items succeeded and some did not.
    /// Re-running the same action is safe and fixes the stragglers.
    #[error("partial failure: {applied} applied, {} failed", failed.len())]
    PartialFailure {
        applied: usize,
        failed: Vec<(MediaId, String)>,
    },
}

impl EngineError {
    pub fn identity_not_found(id: IdentityId) -> Self {
        EngineError::NotFound {
            kind: EntityKind::Identity,
            id: id.0,
        }
    }
}
