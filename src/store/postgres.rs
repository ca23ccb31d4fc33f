//! PostgreSQL implementation of the repository and schema traits.
//!
//! Queries are built at runtime with bound parameters; nothing here needs a
//! live database at compile time. Referential integrity is enforced by the
//! declared foreign keys, and step-number uniqueness by the
//! `(hand_id, step_number)` constraint; this code only translates the
//! resulting violations into typed errors.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use super::errors::{StoreError, StoreResult};
use super::repository::{
    ActionRepository, HandRepository, PlayerRepository, SchemaBackend, SessionRepository,
};
use super::schema::TableDef;
use super::timeouts::{
    DEFAULT_QUERY_TIMEOUT, DEFAULT_TRANSACTION_TIMEOUT, MIGRATION_TIMEOUT, with_timeout,
};
use crate::migrate::models::{Change, ChangeSet};
use crate::recorder::models::{NewAction, StoredAction};
use crate::session::models::{
    ActionId, Cents, GameSession, Hand, HandId, NewGameSession, Player, PlayerId, SessionId,
    StepNumber,
};

/// PostgreSQL-backed ledger store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn ensure_ledger_table(&self) -> StoreResult<()> {
        sqlx::query(&crate::migrate::models::ledger_table().create_sql())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Translate constraint violations on the actions insert into the typed
/// errors the recorder reacts to.
fn map_action_insert_error(err: StoreError, action: &NewAction) -> StoreError {
    match err {
        // foreign_key_violation
        StoreError::Database(sqlx::Error::Database(ref db_err))
            if db_err.code().as_deref() == Some("23503") =>
        {
            let constraint = db_err.constraint().unwrap_or_default();
            let (column, parent_id) = if constraint.contains("game_session_id") {
                ("game_session_id", action.game_session_id)
            } else if constraint.contains("player_id") {
                ("player_id", action.player_id.unwrap_or_default())
            } else {
                ("hand_id", action.hand_id)
            };
            StoreError::ReferentialIntegrity {
                column: column.to_string(),
                parent_id,
            }
        }
        // unique_violation on (hand_id, step_number)
        StoreError::Database(sqlx::Error::Database(ref db_err))
            if db_err.code().as_deref() == Some("23505") =>
        {
            StoreError::DuplicateStep {
                hand_id: action.hand_id,
                step_number: action.step_number.unwrap_or_default(),
            }
        }
        other => other,
    }
}

fn map_session_row(r: &PgRow) -> GameSession {
    GameSession {
        id: r.get("id"),
        created_at: r.get("created_at"),
        game_type: r.get("game_type"),
        small_blind: r.get("small_blind"),
        big_blind: r.get("big_blind"),
        same_stack: r.get("same_stack"),
        rebuy_setting: r.get("rebuy_setting"),
        stack_amount: r.get("stack_amount"),
        script_name: r.get("script_name"),
    }
}

fn map_action_row(r: &PgRow) -> StoreResult<StoredAction> {
    let phase: String = r.get("phase");
    let action: String = r.get("action");
    Ok(StoredAction {
        id: r.get("id"),
        game_session_id: r.get("game_session_id"),
        hand_id: r.get("hand_id"),
        step_number: r.get("step_number"),
        player_id: r.get("player_id"),
        position: r.get("position"),
        phase: phase
            .parse()
            .map_err(|e: String| StoreError::Schema(e))?,
        action: action
            .parse()
            .map_err(|e: String| StoreError::Schema(e))?,
        amount: r.get("amount"),
        hole_cards: r.get("hole_cards"),
        hole_card1: r.get("hole_card1"),
        hole_card2: r.get("hole_card2"),
        community_cards: r.get("community_cards"),
        hand_rank_5: r.get("hand_rank_5"),
        hand_class: r.get("hand_class"),
        pf_hand_class: r.get("pf_hand_class"),
        high_rank: r.get("high_rank"),
        low_rank: r.get("low_rank"),
        is_pair: r.get("is_pair"),
        is_suited: r.get("is_suited"),
        gap: r.get("gap"),
        chen_score: r.get("chen_score"),
        amount_to_call: r.get("amount_to_call"),
        percent_stack_to_call: r.get("percent_stack_to_call"),
        highest_bet: r.get("highest_bet"),
        pot_odds: r.get("pot_odds"),
        detail: r.get("detail"),
        created_at: r.get("created_at"),
    })
}

const ACTION_COLUMNS: &str = "id, game_session_id, hand_id, step_number, player_id, position, \
     phase, action, amount, hole_cards, hole_card1, hole_card2, community_cards, \
     hand_rank_5, hand_class, pf_hand_class, high_rank, low_rank, is_pair, is_suited, \
     gap, chen_score, amount_to_call, percent_stack_to_call, highest_bet, pot_odds, \
     detail, created_at";

#[async_trait]
impl SessionRepository for PgStore {
    async fn create_session(&self, new: &NewGameSession) -> StoreResult<SessionId> {
        let row = with_timeout(
            DEFAULT_QUERY_TIMEOUT,
            sqlx::query(
                "INSERT INTO game_sessions \
                 (game_type, small_blind, big_blind, same_stack, rebuy_setting, stack_amount, script_name) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
            )
            .bind(&new.game_type)
            .bind(new.small_blind)
            .bind(new.big_blind)
            .bind(new.same_stack)
            .bind(&new.rebuy_setting)
            .bind(new.stack_amount)
            .bind(&new.script_name)
            .fetch_one(&self.pool),
        )
        .await?;
        Ok(row.get("id"))
    }

    async fn find_session(&self, id: SessionId) -> StoreResult<Option<GameSession>> {
        let row = with_timeout(
            DEFAULT_QUERY_TIMEOUT,
            sqlx::query(
                "SELECT id, created_at, game_type, small_blind, big_blind, same_stack, \
                 rebuy_setting, stack_amount, script_name \
                 FROM game_sessions WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?;
        Ok(row.as_ref().map(map_session_row))
    }
}

#[async_trait]
impl PlayerRepository for PgStore {
    async fn create_player(&self, name: &str) -> StoreResult<PlayerId> {
        let row = with_timeout(
            DEFAULT_QUERY_TIMEOUT,
            sqlx::query("INSERT INTO players (name) VALUES ($1) RETURNING id")
                .bind(name)
                .fetch_one(&self.pool),
        )
        .await?;
        Ok(row.get("id"))
    }

    async fn find_player(&self, id: PlayerId) -> StoreResult<Option<Player>> {
        let row = with_timeout(
            DEFAULT_QUERY_TIMEOUT,
            sqlx::query("SELECT id, name, created_at FROM players WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?;
        Ok(row.map(|r| Player {
            id: r.get("id"),
            name: r.get("name"),
            created_at: r.get("created_at"),
        }))
    }

    async fn rename_player(&self, id: PlayerId, name: &str) -> StoreResult<()> {
        let result = with_timeout(
            DEFAULT_QUERY_TIMEOUT,
            sqlx::query("UPDATE players SET name = $2 WHERE id = $1")
                .bind(id)
                .bind(name)
                .execute(&self.pool),
        )
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "player",
                id,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl HandRepository for PgStore {
    async fn create_hand(&self, id: HandId, session_id: SessionId) -> StoreResult<()> {
        // Two recorders can race on a hand's first action; the loser's
        // insert is a no-op.
        with_timeout(
            DEFAULT_QUERY_TIMEOUT,
            sqlx::query(
                "INSERT INTO hands (id, game_session_id) VALUES ($1, $2) \
                 ON CONFLICT (id) DO NOTHING",
            )
            .bind(id)
            .bind(session_id)
            .execute(&self.pool),
        )
        .await
        .map_err(|err| match err {
            StoreError::Database(sqlx::Error::Database(ref db_err))
                if db_err.code().as_deref() == Some("23503") =>
            {
                StoreError::ReferentialIntegrity {
                    column: "game_session_id".to_string(),
                    parent_id: session_id,
                }
            }
            other => other,
        })?;
        Ok(())
    }

    async fn find_hand(&self, id: HandId) -> StoreResult<Option<Hand>> {
        let row = with_timeout(
            DEFAULT_QUERY_TIMEOUT,
            sqlx::query(
                "SELECT id, game_session_id, board, pot, winner_id, created_at \
                 FROM hands WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?;
        Ok(row.map(|r| Hand {
            id: r.get("id"),
            game_session_id: r.get("game_session_id"),
            board: r.get("board"),
            pot: r.get("pot"),
            winner_id: r.get("winner_id"),
            created_at: r.get("created_at"),
        }))
    }

    async fn set_board(&self, id: HandId, board: &str) -> StoreResult<()> {
        let result = with_timeout(
            DEFAULT_QUERY_TIMEOUT,
            sqlx::query("UPDATE hands SET board = $2 WHERE id = $1")
                .bind(id)
                .bind(board)
                .execute(&self.pool),
        )
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "hand", id });
        }
        Ok(())
    }

    async fn record_award(
        &self,
        id: HandId,
        winner_id: PlayerId,
        amount: Cents,
    ) -> StoreResult<()> {
        let result = with_timeout(
            DEFAULT_QUERY_TIMEOUT,
            sqlx::query("UPDATE hands SET pot = pot + $3, winner_id = $2 WHERE id = $1")
                .bind(id)
                .bind(winner_id)
                .bind(amount)
                .execute(&self.pool),
        )
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "hand", id });
        }
        Ok(())
    }
}

#[async_trait]
impl ActionRepository for PgStore {
    async fn insert_action(&self, action: &NewAction) -> StoreResult<(ActionId, StepNumber)> {
        // Single-statement insert: the step subquery and the row land in
        // the same snapshot, and the unique constraint backstops any two
        // writers that still race to the same slot.
        const INSERT_SQL: &str = "INSERT INTO actions ( \
                 game_session_id, hand_id, step_number, player_id, position, phase, action, \
                 amount, hole_cards, hole_card1, hole_card2, community_cards, hand_rank_5, \
                 hand_class, pf_hand_class, high_rank, low_rank, is_pair, is_suited, gap, \
                 chen_score, amount_to_call, percent_stack_to_call, highest_bet, pot_odds, detail \
             ) VALUES ( \
                 $1, $2, \
                 COALESCE($3, (SELECT COALESCE(MAX(a.step_number), 0) + 1 FROM actions a WHERE a.hand_id = $2)), \
                 $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, \
                 $20, $21, $22, $23, $24, $25, $26 \
             ) RETURNING id, step_number";
        let row = with_timeout(
            DEFAULT_TRANSACTION_TIMEOUT,
            sqlx::query(INSERT_SQL)
                .bind(action.game_session_id)
                .bind(action.hand_id)
                .bind(action.step_number)
                .bind(action.player_id)
                .bind(&action.position)
                .bind(action.phase.as_str())
                .bind(action.action.as_str())
                .bind(action.amount)
                .bind(&action.hole_cards)
                .bind(&action.hole_card1)
                .bind(&action.hole_card2)
                .bind(&action.community_cards)
                .bind(action.hand_rank_5)
                .bind(&action.hand_class)
                .bind(&action.pf_hand_class)
                .bind(action.high_rank)
                .bind(action.low_rank)
                .bind(action.is_pair)
                .bind(action.is_suited)
                .bind(action.gap)
                .bind(action.chen_score)
                .bind(action.amount_to_call)
                .bind(action.percent_stack_to_call)
                .bind(action.highest_bet)
                .bind(action.pot_odds)
                .bind(&action.detail)
                .fetch_one(&self.pool),
        )
        .await
        .map_err(|err| map_action_insert_error(err, action))?;
        Ok((row.get("id"), row.get("step_number")))
    }

    async fn find_by_step(
        &self,
        hand_id: HandId,
        step_number: StepNumber,
    ) -> StoreResult<Option<StoredAction>> {
        let sql = format!(
            "SELECT {ACTION_COLUMNS} FROM actions WHERE hand_id = $1 AND step_number = $2"
        );
        let row = with_timeout(
            DEFAULT_QUERY_TIMEOUT,
            sqlx::query(&sql)
                .bind(hand_id)
                .bind(step_number)
                .fetch_optional(&self.pool),
        )
        .await?;
        row.as_ref().map(map_action_row).transpose()
    }

    async fn actions_for_hand(&self, hand_id: HandId) -> StoreResult<Vec<StoredAction>> {
        let sql = format!(
            "SELECT {ACTION_COLUMNS} FROM actions WHERE hand_id = $1 ORDER BY step_number"
        );
        let rows = with_timeout(
            DEFAULT_QUERY_TIMEOUT,
            sqlx::query(&sql).bind(hand_id).fetch_all(&self.pool),
        )
        .await?;
        rows.iter().map(map_action_row).collect()
    }
}

#[async_trait]
impl SchemaBackend for PgStore {
    async fn ensure_table(&self, table: &TableDef) -> StoreResult<()> {
        with_timeout(
            MIGRATION_TIMEOUT,
            sqlx::query(&table.create_sql()).execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn has_table(&self, name: &str) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name = $1)",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn has_column(&self, table: &str, column: &str) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM information_schema.columns \
             WHERE table_schema = current_schema() AND table_name = $1 AND column_name = $2)",
        )
        .bind(table)
        .bind(column)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn applied_changesets(&self) -> StoreResult<Vec<String>> {
        self.ensure_ledger_table().await?;
        let names: Vec<String> =
            sqlx::query_scalar("SELECT name FROM schema_migrations ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(names)
    }

    async fn apply_changeset(&self, changeset: &ChangeSet) -> StoreResult<()> {
        self.ensure_ledger_table().await?;
        // One transaction per changeset: the ALTER/DROP statements take
        // ACCESS EXCLUSIVE locks, so concurrent recorder writes block until
        // commit and never observe a half-migrated shape. Any failure rolls
        // the whole changeset back.
        let mut tx = self.pool.begin().await?;
        for change in &changeset.changes {
            match change {
                Change::AddColumn {
                    table,
                    column,
                    definition,
                } => {
                    sqlx::query(&format!(
                        "ALTER TABLE {table} ADD COLUMN IF NOT EXISTS {column} {definition}"
                    ))
                    .execute(&mut *tx)
                    .await?;
                }
                Change::RenameColumn { table, from, to } => {
                    let from_exists: bool = sqlx::query_scalar(
                        "SELECT EXISTS (SELECT 1 FROM information_schema.columns \
                         WHERE table_schema = current_schema() AND table_name = $1 AND column_name = $2)",
                    )
                    .bind(table)
                    .bind(from)
                    .fetch_one(&mut *tx)
                    .await?;
                    let to_exists: bool = sqlx::query_scalar(
                        "SELECT EXISTS (SELECT 1 FROM information_schema.columns \
                         WHERE table_schema = current_schema() AND table_name = $1 AND column_name = $2)",
                    )
                    .bind(table)
                    .bind(to)
                    .fetch_one(&mut *tx)
                    .await?;
                    if !from_exists && to_exists {
                        // Already renamed; row values live under the new
                        // name.
                        continue;
                    }
                    sqlx::query(&format!("ALTER TABLE {table} RENAME COLUMN {from} TO {to}"))
                        .execute(&mut *tx)
                        .await?;
                }
                Change::DropColumn { table, column } => {
                    sqlx::query(&format!(
                        "ALTER TABLE {table} DROP COLUMN IF EXISTS {column}"
                    ))
                    .execute(&mut *tx)
                    .await?;
                }
                Change::DropTable { table } => {
                    sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }
        sqlx::query("INSERT INTO schema_migrations (name) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(&changeset.name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn drop_table(&self, name: &str) -> StoreResult<()> {
        with_timeout(
            MIGRATION_TIMEOUT,
            sqlx::query(&format!("DROP TABLE IF EXISTS {name}")).execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}
