//! Session and player lifecycle operations.

use super::models::{GameSession, NewGameSession, Player, PlayerId, SessionId};
use crate::store::errors::StoreResult;
use crate::store::repository::{PlayerRepository, SessionRepository};
use std::sync::Arc;

/// Thin write surface for the slow-changing entities: sessions are created
/// once at table start, players once on first sight, and a player rename is
/// the only mutation either ever sees.
#[derive(Clone)]
pub struct SessionManager<S> {
    store: Arc<S>,
}

impl<S> SessionManager<S>
where
    S: SessionRepository + PlayerRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create a new game session and return its id.
    pub async fn create_session(&self, new: &NewGameSession) -> StoreResult<SessionId> {
        let id = self.store.create_session(new).await?;
        log::info!(
            "Created session {id}: {} blinds {}/{}",
            new.game_type,
            new.small_blind,
            new.big_blind
        );
        Ok(id)
    }

    /// Look up a session by id.
    pub async fn session(&self, id: SessionId) -> StoreResult<Option<GameSession>> {
        self.store.find_session(id).await
    }

    /// Create a new player and return their id.
    pub async fn create_player(&self, name: &str) -> StoreResult<PlayerId> {
        let id = self.store.create_player(name).await?;
        log::info!("Created player {id}: {name}");
        Ok(id)
    }

    /// Look up a player by id.
    pub async fn player(&self, id: PlayerId) -> StoreResult<Option<Player>> {
        self.store.find_player(id).await
    }

    /// Rename an existing player.
    pub async fn rename_player(&self, id: PlayerId, name: &str) -> StoreResult<()> {
        self.store.rename_player(id, name).await?;
        log::info!("Renamed player {id} to {name}");
        Ok(())
    }
}
