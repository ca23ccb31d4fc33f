//! In-memory implementation of the repository and schema traits.
//!
//! Mirrors the PostgreSQL backend's observable behavior (referential
//! integrity checks, step allocation, changeset atomicity) behind a single
//! process-local lock. The test suite runs the full recorder and migration
//! paths against it, and tooling that replays hands without a database can
//! embed it directly.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

use super::errors::{StoreError, StoreResult};
use super::repository::{
    ActionRepository, HandRepository, PlayerRepository, SchemaBackend, SessionRepository,
};
use super::schema::TableDef;
use crate::migrate::models::{Change, ChangeSet};
use crate::recorder::models::{NewAction, StoredAction};
use crate::session::models::{
    ActionId, Cents, GameSession, Hand, HandId, NewGameSession, Player, PlayerId, SessionId,
    StepNumber,
};

/// A loosely typed cell for raw schema-catalog rows.
#[derive(Debug, Clone, PartialEq)]
pub enum MemValue {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
    Bool(bool),
}

impl From<i64> for MemValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for MemValue {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<&str> for MemValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<bool> for MemValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// One table in the schema catalog: its definition plus raw rows keyed by
/// column name. The catalog is what migrations operate on.
#[derive(Debug, Clone, Default)]
struct MemTable {
    columns: Vec<String>,
    rows: Vec<HashMap<String, MemValue>>,
}

#[derive(Default)]
struct Inner {
    next_session_id: SessionId,
    next_player_id: PlayerId,
    next_action_id: ActionId,
    sessions: HashMap<SessionId, GameSession>,
    players: HashMap<PlayerId, Player>,
    hands: HashMap<HandId, Hand>,
    actions: Vec<StoredAction>,
    tables: HashMap<String, MemTable>,
    applied: Vec<String>,
}

/// In-process ledger store.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock means a writer panicked mid-operation; there is
        // no meaningful recovery for an in-process store.
        self.inner.lock().expect("memory store lock poisoned")
    }

    /// Seed a raw catalog row, for exercising migrations over existing
    /// data.
    pub fn insert_row(&self, table: &str, row: &[(&str, MemValue)]) -> StoreResult<()> {
        let mut inner = self.lock();
        let mem_table = inner
            .tables
            .get_mut(table)
            .ok_or_else(|| StoreError::Schema(format!("no such table: {table}")))?;
        for (column, _) in row {
            if !mem_table.columns.iter().any(|c| c == column) {
                return Err(StoreError::Schema(format!(
                    "no such column: {table}.{column}"
                )));
            }
        }
        mem_table.rows.push(
            row.iter()
                .map(|(column, value)| ((*column).to_string(), value.clone()))
                .collect(),
        );
        Ok(())
    }

    /// All values of one catalog column, nulls included.
    pub fn column_values(&self, table: &str, column: &str) -> StoreResult<Vec<MemValue>> {
        let inner = self.lock();
        let mem_table = inner
            .tables
            .get(table)
            .ok_or_else(|| StoreError::Schema(format!("no such table: {table}")))?;
        if !mem_table.columns.iter().any(|c| c == column) {
            return Err(StoreError::Schema(format!(
                "no such column: {table}.{column}"
            )));
        }
        Ok(mem_table
            .rows
            .iter()
            .map(|row| row.get(column).cloned().unwrap_or(MemValue::Null))
            .collect())
    }

    /// Column names of a catalog table.
    pub fn table_columns(&self, table: &str) -> StoreResult<Vec<String>> {
        let inner = self.lock();
        inner
            .tables
            .get(table)
            .map(|t| t.columns.clone())
            .ok_or_else(|| StoreError::Schema(format!("no such table: {table}")))
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn create_session(&self, new: &NewGameSession) -> StoreResult<SessionId> {
        let mut inner = self.lock();
        inner.next_session_id += 1;
        let id = inner.next_session_id;
        inner.sessions.insert(
            id,
            GameSession {
                id,
                created_at: Utc::now(),
                game_type: new.game_type.clone(),
                small_blind: new.small_blind,
                big_blind: new.big_blind,
                same_stack: new.same_stack,
                rebuy_setting: new.rebuy_setting.clone(),
                stack_amount: new.stack_amount,
                script_name: new.script_name.clone(),
            },
        );
        Ok(id)
    }

    async fn find_session(&self, id: SessionId) -> StoreResult<Option<GameSession>> {
        Ok(self.lock().sessions.get(&id).cloned())
    }
}

#[async_trait]
impl PlayerRepository for MemoryStore {
    async fn create_player(&self, name: &str) -> StoreResult<PlayerId> {
        let mut inner = self.lock();
        inner.next_player_id += 1;
        let id = inner.next_player_id;
        inner.players.insert(
            id,
            Player {
                id,
                name: name.to_string(),
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn find_player(&self, id: PlayerId) -> StoreResult<Option<Player>> {
        Ok(self.lock().players.get(&id).cloned())
    }

    async fn rename_player(&self, id: PlayerId, name: &str) -> StoreResult<()> {
        let mut inner = self.lock();
        match inner.players.get_mut(&id) {
            Some(player) => {
                player.name = name.to_string();
                Ok(())
            }
            None => Err(StoreError::NotFound {
                entity: "player",
                id,
            }),
        }
    }
}

#[async_trait]
impl HandRepository for MemoryStore {
    async fn create_hand(&self, id: HandId, session_id: SessionId) -> StoreResult<()> {
        let mut inner = self.lock();
        if !inner.sessions.contains_key(&session_id) {
            return Err(StoreError::ReferentialIntegrity {
                column: "game_session_id".to_string(),
                parent_id: session_id,
            });
        }
        inner.hands.entry(id).or_insert_with(|| Hand {
            id,
            game_session_id: session_id,
            board: None,
            pot: 0,
            winner_id: None,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn find_hand(&self, id: HandId) -> StoreResult<Option<Hand>> {
        Ok(self.lock().hands.get(&id).cloned())
    }

    async fn set_board(&self, id: HandId, board: &str) -> StoreResult<()> {
        let mut inner = self.lock();
        match inner.hands.get_mut(&id) {
            Some(hand) => {
                hand.board = Some(board.to_string());
                Ok(())
            }
            None => Err(StoreError::NotFound { entity: "hand", id }),
        }
    }

    async fn record_award(
        &self,
        id: HandId,
        winner_id: PlayerId,
        amount: Cents,
    ) -> StoreResult<()> {
        let mut inner = self.lock();
        match inner.hands.get_mut(&id) {
            Some(hand) => {
                hand.pot += amount;
                hand.winner_id = Some(winner_id);
                Ok(())
            }
            None => Err(StoreError::NotFound { entity: "hand", id }),
        }
    }
}

#[async_trait]
impl ActionRepository for MemoryStore {
    async fn insert_action(&self, action: &NewAction) -> StoreResult<(ActionId, StepNumber)> {
        let mut inner = self.lock();
        if !inner.sessions.contains_key(&action.game_session_id) {
            return Err(StoreError::ReferentialIntegrity {
                column: "game_session_id".to_string(),
                parent_id: action.game_session_id,
            });
        }
        if let Some(player_id) = action.player_id {
            if !inner.players.contains_key(&player_id) {
                return Err(StoreError::ReferentialIntegrity {
                    column: "player_id".to_string(),
                    parent_id: player_id,
                });
            }
        }
        if !inner.hands.contains_key(&action.hand_id) {
            return Err(StoreError::ReferentialIntegrity {
                column: "hand_id".to_string(),
                parent_id: action.hand_id,
            });
        }

        let max_step = inner
            .actions
            .iter()
            .filter(|a| a.hand_id == action.hand_id)
            .map(|a| a.step_number)
            .max()
            .unwrap_or(0);
        let step_number = match action.step_number {
            Some(step) => {
                let taken = inner
                    .actions
                    .iter()
                    .any(|a| a.hand_id == action.hand_id && a.step_number == step);
                if taken {
                    return Err(StoreError::DuplicateStep {
                        hand_id: action.hand_id,
                        step_number: step,
                    });
                }
                step
            }
            None => max_step + 1,
        };

        inner.next_action_id += 1;
        let id = inner.next_action_id;
        inner.actions.push(StoredAction {
            id,
            game_session_id: action.game_session_id,
            hand_id: action.hand_id,
            step_number,
            player_id: action.player_id,
            position: action.position.clone(),
            phase: action.phase,
            action: action.action,
            amount: action.amount,
            hole_cards: action.hole_cards.clone(),
            hole_card1: action.hole_card1.clone(),
            hole_card2: action.hole_card2.clone(),
            community_cards: action.community_cards.clone(),
            hand_rank_5: action.hand_rank_5,
            hand_class: action.hand_class.clone(),
            pf_hand_class: action.pf_hand_class.clone(),
            high_rank: action.high_rank,
            low_rank: action.low_rank,
            is_pair: action.is_pair,
            is_suited: action.is_suited,
            gap: action.gap,
            chen_score: action.chen_score,
            amount_to_call: action.amount_to_call,
            percent_stack_to_call: action.percent_stack_to_call,
            highest_bet: action.highest_bet,
            pot_odds: action.pot_odds,
            detail: action.detail.clone(),
            created_at: Utc::now(),
        });
        Ok((id, step_number))
    }

    async fn find_by_step(
        &self,
        hand_id: HandId,
        step_number: StepNumber,
    ) -> StoreResult<Option<StoredAction>> {
        Ok(self
            .lock()
            .actions
            .iter()
            .find(|a| a.hand_id == hand_id && a.step_number == step_number)
            .cloned())
    }

    async fn actions_for_hand(&self, hand_id: HandId) -> StoreResult<Vec<StoredAction>> {
        let mut actions: Vec<StoredAction> = self
            .lock()
            .actions
            .iter()
            .filter(|a| a.hand_id == hand_id)
            .cloned()
            .collect();
        actions.sort_by_key(|a| a.step_number);
        Ok(actions)
    }
}

fn apply_change(tables: &mut HashMap<String, MemTable>, change: &Change) -> StoreResult<()> {
    match change {
        Change::AddColumn { table, column, .. } => {
            let mem_table = tables
                .get_mut(table)
                .ok_or_else(|| StoreError::Schema(format!("no such table: {table}")))?;
            if mem_table.columns.iter().any(|c| c == column) {
                return Ok(()); // IF NOT EXISTS
            }
            mem_table.columns.push(column.clone());
            Ok(())
        }
        Change::RenameColumn { table, from, to } => {
            let mem_table = tables
                .get_mut(table)
                .ok_or_else(|| StoreError::Schema(format!("no such table: {table}")))?;
            let from_exists = mem_table.columns.iter().any(|c| c == from);
            let to_exists = mem_table.columns.iter().any(|c| c == to);
            if !from_exists && to_exists {
                return Ok(()); // already renamed
            }
            if !from_exists {
                return Err(StoreError::Schema(format!(
                    "no such column: {table}.{from}"
                )));
            }
            if to_exists {
                return Err(StoreError::Schema(format!(
                    "column already exists: {table}.{to}"
                )));
            }
            for column in &mut mem_table.columns {
                if column == from {
                    *column = to.clone();
                }
            }
            for row in &mut mem_table.rows {
                if let Some(value) = row.remove(from) {
                    row.insert(to.clone(), value);
                }
            }
            Ok(())
        }
        Change::DropColumn { table, column } => {
            let mem_table = tables
                .get_mut(table)
                .ok_or_else(|| StoreError::Schema(format!("no such table: {table}")))?;
            mem_table.columns.retain(|c| c != column);
            for row in &mut mem_table.rows {
                row.remove(column);
            }
            Ok(())
        }
        Change::DropTable { table } => {
            tables.remove(table);
            Ok(())
        }
    }
}

#[async_trait]
impl SchemaBackend for MemoryStore {
    async fn ensure_table(&self, table: &TableDef) -> StoreResult<()> {
        let mut inner = self.lock();
        inner
            .tables
            .entry(table.name.clone())
            .or_insert_with(|| MemTable {
                columns: table.columns.iter().map(|c| c.name.clone()).collect(),
                rows: Vec::new(),
            });
        Ok(())
    }

    async fn has_table(&self, name: &str) -> StoreResult<bool> {
        Ok(self.lock().tables.contains_key(name))
    }

    async fn has_column(&self, table: &str, column: &str) -> StoreResult<bool> {
        Ok(self
            .lock()
            .tables
            .get(table)
            .is_some_and(|t| t.columns.iter().any(|c| c == column)))
    }

    async fn applied_changesets(&self) -> StoreResult<Vec<String>> {
        Ok(self.lock().applied.clone())
    }

    async fn apply_changeset(&self, changeset: &ChangeSet) -> StoreResult<()> {
        let mut inner = self.lock();
        // Apply against a copy and swap on success, so a failing step
        // leaves the catalog exactly as it was.
        let mut staged = inner.tables.clone();
        for change in &changeset.changes {
            apply_change(&mut staged, change)?;
        }
        inner.tables = staged;
        if !inner.applied.iter().any(|name| name == &changeset.name) {
            inner.applied.push(changeset.name.clone());
        }
        Ok(())
    }

    async fn drop_table(&self, name: &str) -> StoreResult<()> {
        let mut inner = self.lock();
        inner.tables.remove(name);
        match name {
            "actions" => inner.actions.clear(),
            "hands" => inner.hands.clear(),
            "game_sessions" => inner.sessions.clear(),
            "players" => inner.players.clear(),
            "schema_migrations" => inner.applied.clear(),
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::models::{ActionKind, Phase};
    use crate::session::models::NewGameSession;

    fn blank_action(session: SessionId, hand: HandId) -> NewAction {
        NewAction {
            game_session_id: session,
            hand_id: hand,
            step_number: None,
            player_id: None,
            position: None,
            phase: Phase::Preflop,
            action: ActionKind::Check,
            amount: None,
            hole_cards: None,
            hole_card1: None,
            hole_card2: None,
            community_cards: None,
            hand_rank_5: None,
            hand_class: None,
            pf_hand_class: None,
            high_rank: None,
            low_rank: None,
            is_pair: None,
            is_suited: None,
            gap: None,
            chen_score: None,
            amount_to_call: None,
            percent_stack_to_call: None,
            highest_bet: None,
            pot_odds: None,
            detail: None,
        }
    }

    #[tokio::test]
    async fn allocates_steps_per_hand() {
        let store = MemoryStore::new();
        let session = store
            .create_session(&NewGameSession::nlhe(100, 200))
            .await
            .unwrap();
        store.create_hand(1, session).await.unwrap();
        store.create_hand(2, session).await.unwrap();

        let (_, step1) = store.insert_action(&blank_action(session, 1)).await.unwrap();
        let (_, step2) = store.insert_action(&blank_action(session, 1)).await.unwrap();
        let (_, other_hand) = store.insert_action(&blank_action(session, 2)).await.unwrap();
        assert_eq!((step1, step2), (1, 2));
        assert_eq!(other_hand, 1);
    }

    #[tokio::test]
    async fn rejects_unknown_parents() {
        let store = MemoryStore::new();
        let err = store.insert_action(&blank_action(99, 1)).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::ReferentialIntegrity { ref column, parent_id: 99 } if column == "game_session_id"
        ));
    }

    #[tokio::test]
    async fn explicit_step_conflicts_are_reported() {
        let store = MemoryStore::new();
        let session = store
            .create_session(&NewGameSession::nlhe(100, 200))
            .await
            .unwrap();
        store.create_hand(1, session).await.unwrap();
        store.insert_action(&blank_action(session, 1)).await.unwrap();

        let mut replay = blank_action(session, 1);
        replay.step_number = Some(1);
        let err = store.insert_action(&replay).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::DuplicateStep {
                hand_id: 1,
                step_number: 1
            }
        ));
    }

    #[tokio::test]
    async fn hand_aggregate_accumulates() {
        let store = MemoryStore::new();
        let session = store
            .create_session(&NewGameSession::nlhe(100, 200))
            .await
            .unwrap();
        let winner = store.create_player("P1").await.unwrap();
        store.create_hand(7, session).await.unwrap();
        store.set_board(7, "7h8dTc").await.unwrap();
        store.record_award(7, winner, 1200).await.unwrap();
        store.record_award(7, winner, 300).await.unwrap();

        let hand = store.find_hand(7).await.unwrap().unwrap();
        assert_eq!(hand.board.as_deref(), Some("7h8dTc"));
        assert_eq!(hand.pot, 1500);
        assert_eq!(hand.winner_id, Some(winner));
    }
}
