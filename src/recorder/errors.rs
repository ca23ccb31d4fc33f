//! Recorder error types.
//!
//! Every rejection carries the event's natural identity (hand, step,
//! player) so the caller can correct and replay it; ingestion never
//! silently drops an action.

use crate::recorder::models::ActionEvent;
use crate::session::{Cents, HandId, PlayerId, StepNumber};
use crate::store::errors::StoreError;
use std::fmt;
use thiserror::Error;

/// Natural identity of one action event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventIdentity {
    pub hand_id: HandId,
    pub step_number: Option<StepNumber>,
    pub player_id: Option<PlayerId>,
}

impl EventIdentity {
    pub fn of(event: &ActionEvent) -> Self {
        Self {
            hand_id: event.hand_id,
            step_number: event.step_number,
            player_id: event.player_id,
        }
    }
}

impl fmt::Display for EventIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hand {}", self.hand_id)?;
        if let Some(step) = self.step_number {
            write!(f, " step {step}")?;
        }
        if let Some(player) = self.player_id {
            write!(f, " player {player}")?;
        }
        Ok(())
    }
}

/// Recorder errors
#[derive(Debug, Error)]
pub enum RecorderError {
    /// Event references a session or player that does not exist; the event
    /// must be corrected before replay
    #[error("Event {identity}: {column} references missing parent {parent_id}")]
    ReferentialIntegrity {
        identity: EventIdentity,
        column: String,
        parent_id: i64,
    },

    /// Step allocation kept colliding with a concurrent writer after the
    /// automatic retry
    #[error("Event {identity}: step allocation conflicted")]
    OrderingConflict { identity: EventIdentity },

    /// Negative amounts never represent a legal chip movement
    #[error("Event {identity}: invalid amount {amount}")]
    InvalidAmount {
        identity: EventIdentity,
        amount: Cents,
    },

    /// Transient storage failure; re-submitting the same event is safe
    #[error("Event {identity}: storage unavailable: {reason}")]
    StorageUnavailable {
        identity: EventIdentity,
        reason: String,
    },

    /// Any other storage failure
    #[error("Event {identity}: {source}")]
    Store {
        identity: EventIdentity,
        source: StoreError,
    },
}

impl RecorderError {
    /// Identity of the rejected event, for correction and replay.
    pub fn identity(&self) -> &EventIdentity {
        match self {
            Self::ReferentialIntegrity { identity, .. }
            | Self::OrderingConflict { identity }
            | Self::InvalidAmount { identity, .. }
            | Self::StorageUnavailable { identity, .. }
            | Self::Store { identity, .. } => identity,
        }
    }

    /// Whether the caller may retry the same event unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable { .. })
    }

    /// Lift a store failure into a recorder error for one event.
    pub(crate) fn from_store(err: StoreError, identity: EventIdentity) -> Self {
        match err {
            StoreError::ReferentialIntegrity { column, parent_id } => Self::ReferentialIntegrity {
                identity,
                column,
                parent_id,
            },
            StoreError::Unavailable(reason) => Self::StorageUnavailable { identity, reason },
            other => Self::Store {
                identity,
                source: other,
            },
        }
    }
}

/// Result type for recorder operations
pub type RecorderResult<T> = Result<T, RecorderError>;
