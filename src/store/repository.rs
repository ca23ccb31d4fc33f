//! Repository trait definitions for testability and dependency injection.
//!
//! Trait-based abstractions over the ledger's storage operations. The
//! recorder, session manager, and migration runner are generic over these,
//! so the same code paths run against PostgreSQL in production and the
//! in-memory store in tests.

use async_trait::async_trait;

use crate::migrate::models::ChangeSet;
use crate::recorder::models::{NewAction, StoredAction};
use crate::session::models::{
    ActionId, Cents, GameSession, Hand, HandId, NewGameSession, Player, PlayerId, SessionId,
    StepNumber,
};
use crate::store::errors::StoreResult;
use crate::store::schema::TableDef;

/// Trait for game-session repository operations
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a new game session
    async fn create_session(&self, new: &NewGameSession) -> StoreResult<SessionId>;

    /// Find session by ID
    async fn find_session(&self, id: SessionId) -> StoreResult<Option<GameSession>>;
}

/// Trait for player repository operations
#[async_trait]
pub trait PlayerRepository: Send + Sync {
    /// Create a new player
    async fn create_player(&self, name: &str) -> StoreResult<PlayerId>;

    /// Find player by ID
    async fn find_player(&self, id: PlayerId) -> StoreResult<Option<Player>>;

    /// Rename an existing player
    async fn rename_player(&self, id: PlayerId, name: &str) -> StoreResult<()>;
}

/// Trait for hand-aggregate repository operations
#[async_trait]
pub trait HandRepository: Send + Sync {
    /// Create the hand row; the id comes from the engine's stream
    async fn create_hand(&self, id: HandId, session_id: SessionId) -> StoreResult<()>;

    /// Find hand by ID
    async fn find_hand(&self, id: HandId) -> StoreResult<Option<Hand>>;

    /// Record the community cards dealt so far
    async fn set_board(&self, id: HandId, board: &str) -> StoreResult<()>;

    /// Record a pot award: accumulates into the pot total and sets the
    /// winner
    async fn record_award(
        &self,
        id: HandId,
        winner_id: PlayerId,
        amount: Cents,
    ) -> StoreResult<()>;
}

/// Trait for action-row repository operations
#[async_trait]
pub trait ActionRepository: Send + Sync {
    /// Insert one enriched action row.
    ///
    /// When `action.step_number` is `None` the implementation allocates
    /// `max(existing) + 1` for the hand inside the same transaction as the
    /// insert. A race on the slot fails with
    /// [`StoreError::DuplicateStep`](crate::store::StoreError::DuplicateStep);
    /// no partial row is ever visible.
    async fn insert_action(&self, action: &NewAction) -> StoreResult<(ActionId, StepNumber)>;

    /// Find the action occupying a step slot, if any
    async fn find_by_step(
        &self,
        hand_id: HandId,
        step_number: StepNumber,
    ) -> StoreResult<Option<StoredAction>>;

    /// All actions of a hand, ordered by step number
    async fn actions_for_hand(&self, hand_id: HandId) -> StoreResult<Vec<StoredAction>>;
}

/// Trait for schema-shape operations: idempotent bootstrap, migration
/// changesets, and the privileged destructive reset.
#[async_trait]
pub trait SchemaBackend: Send + Sync {
    /// Create a table if it does not already exist
    async fn ensure_table(&self, table: &TableDef) -> StoreResult<()>;

    /// Whether a table exists
    async fn has_table(&self, name: &str) -> StoreResult<bool>;

    /// Whether a column exists on a table
    async fn has_column(&self, table: &str, column: &str) -> StoreResult<bool>;

    /// Names of changesets already recorded in the migration ledger
    async fn applied_changesets(&self) -> StoreResult<Vec<String>>;

    /// Apply every change of a changeset and record it in the ledger,
    /// atomically: a failing step rolls the whole changeset back
    async fn apply_changeset(&self, changeset: &ChangeSet) -> StoreResult<()>;

    /// Drop a table outright. Privileged reset path only
    async fn drop_table(&self, name: &str) -> StoreResult<()>;
}

/// The full storage surface the action recorder writes through.
pub trait LedgerStore:
    SessionRepository + PlayerRepository + HandRepository + ActionRepository
{
}

impl<T> LedgerStore for T where
    T: SessionRepository + PlayerRepository + HandRepository + ActionRepository
{
}
