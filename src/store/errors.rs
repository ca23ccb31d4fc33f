//! Store error types.

use crate::session::{HandId, StepNumber};
use thiserror::Error;

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A write referenced a parent row that does not exist
    #[error("Column {column} references missing parent id {parent_id}")]
    ReferentialIntegrity { column: String, parent_id: i64 },

    /// Two writers raced on the same step slot within a hand
    #[error("Step {step_number} already taken for hand {hand_id}")]
    DuplicateStep {
        hand_id: HandId,
        step_number: StepNumber,
    },

    /// Row expected to exist was not found
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// A schema-level operation targeted a shape that does not exist or
    /// cannot accept the change
    #[error("Schema error: {0}")]
    Schema(String),

    /// Transient infrastructure failure; the same call may be retried
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether a caller may safely retry the failed call with the same
    /// arguments.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
