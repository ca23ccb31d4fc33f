//! Migration error types.

use crate::store::errors::StoreError;
use thiserror::Error;

/// Migration errors
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Underlying store failure outside any particular changeset
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Destructive changeset attempted without the force flag
    #[error("Changeset {changeset} is destructive and requires force")]
    ForceRequired { changeset: String },

    /// A changeset could not be applied; it was rolled back and the run
    /// halted. The operator resolves this by hand
    #[error("Changeset {changeset} failed and was rolled back: {reason}")]
    Conflict { changeset: String, reason: String },
}

/// Result type for migration operations
pub type MigrationResult<T> = Result<T, MigrationError>;
