use crate::types::EntityId;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, DossierError>;

#[derive(Debug, Error)]
pub enum DossierError {
    #[error("Entity not found: {0}")]
    NotFound(EntityId),

    /// The split completed under the ambiguous policy: both entities keep
    /// the full document set and are flagged for review.
    #[error(
        "Insufficient provenance to split {entity}: {unattributed_documents} document(s) \
         could not be attributed, {new_entity} retains the full document set"
    )]
    InsufficientProvenance {
        entity: EntityId,
        new_entity: EntityId,
        unattributed_documents: usize,
    },

    #[error("Analytics timed out after {elapsed:?} ({completed}/{total} steps)")]
    Timeout {
        elapsed: Duration,
        completed: usize,
        total: usize,
    },

    #[error("Analytics cancelled")]
    Cancelled,

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Review item not found: {0}")]
    ReviewItemNotFound(Uuid),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl DossierError {
    /// Fatal errors indicate a bug and must be surfaced, never retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DossierError::InvariantViolation(_))
    }
}
