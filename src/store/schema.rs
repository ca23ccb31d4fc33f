//! Versioned table definitions for the hand ledger.
//!
//! Tables are only ever created with `IF NOT EXISTS` semantics; redefining a
//! live table is not something the ingestion path can do. Shape changes go
//! through the migration ledger, and destructive resets are a separate
//! privileged operation.

use serde::{Deserialize, Serialize};

/// One column of a table definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    /// Everything after the column name: type plus constraints
    /// ("BIGINT NOT NULL", "TEXT").
    pub definition: String,
}

impl ColumnDef {
    pub fn new(name: &str, definition: &str) -> Self {
        Self {
            name: name.to_string(),
            definition: definition.to_string(),
        }
    }
}

/// A declared foreign key; violations surface as referential-integrity
/// errors naming the column and missing parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDef {
    pub column: String,
    pub parent_table: String,
    pub parent_column: String,
}

/// A complete table definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub foreign_keys: Vec<ForeignKeyDef>,
    /// Composite uniqueness constraints, one inner list per constraint.
    pub uniques: Vec<Vec<String>>,
}

impl TableDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
            uniques: Vec::new(),
        }
    }

    pub fn column(mut self, name: &str, definition: &str) -> Self {
        self.columns.push(ColumnDef::new(name, definition));
        self
    }

    pub fn foreign_key(mut self, column: &str, parent_table: &str, parent_column: &str) -> Self {
        self.foreign_keys.push(ForeignKeyDef {
            column: column.to_string(),
            parent_table: parent_table.to_string(),
            parent_column: parent_column.to_string(),
        });
        self
    }

    pub fn unique(mut self, columns: &[&str]) -> Self {
        self.uniques
            .push(columns.iter().map(|c| (*c).to_string()).collect());
        self
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Render idempotent creation DDL.
    pub fn create_sql(&self) -> String {
        let mut parts: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.definition))
            .collect();
        for unique in &self.uniques {
            parts.push(format!("UNIQUE ({})", unique.join(", ")));
        }
        for fk in &self.foreign_keys {
            parts.push(format!(
                "FOREIGN KEY ({}) REFERENCES {} ({})",
                fk.column, fk.parent_table, fk.parent_column
            ));
        }
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            self.name,
            parts.join(",\n    ")
        )
    }
}

/// The current ledger schema: players, game_sessions, hands, actions.
pub fn ledger_tables() -> Vec<TableDef> {
    vec![
        TableDef::new("players")
            .column("id", "BIGSERIAL PRIMARY KEY")
            .column("name", "TEXT NOT NULL")
            .column("created_at", "TIMESTAMPTZ NOT NULL DEFAULT NOW()"),
        TableDef::new("game_sessions")
            .column("id", "BIGSERIAL PRIMARY KEY")
            .column("created_at", "TIMESTAMPTZ NOT NULL DEFAULT NOW()")
            .column("game_type", "TEXT NOT NULL")
            .column("small_blind", "BIGINT NOT NULL")
            .column("big_blind", "BIGINT NOT NULL")
            .column("same_stack", "BOOLEAN NOT NULL DEFAULT TRUE")
            .column("rebuy_setting", "TEXT")
            .column("stack_amount", "BIGINT")
            .column("script_name", "TEXT"),
        TableDef::new("hands")
            .column("id", "BIGINT PRIMARY KEY")
            .column("game_session_id", "BIGINT NOT NULL")
            .column("board", "TEXT")
            .column("pot", "BIGINT NOT NULL DEFAULT 0")
            .column("winner_id", "BIGINT")
            .column("created_at", "TIMESTAMPTZ NOT NULL DEFAULT NOW()")
            .foreign_key("game_session_id", "game_sessions", "id")
            .foreign_key("winner_id", "players", "id"),
        TableDef::new("actions")
            .column("id", "BIGSERIAL PRIMARY KEY")
            .column("game_session_id", "BIGINT NOT NULL")
            .column("hand_id", "BIGINT NOT NULL")
            .column("step_number", "INTEGER NOT NULL")
            .column("player_id", "BIGINT")
            .column("position", "TEXT")
            .column("phase", "TEXT NOT NULL")
            .column("action", "TEXT NOT NULL")
            .column("amount", "BIGINT")
            .column("hole_cards", "TEXT")
            .column("hole_card1", "TEXT")
            .column("hole_card2", "TEXT")
            .column("community_cards", "TEXT")
            .column("hand_rank_5", "INTEGER")
            .column("hand_class", "TEXT")
            .column("pf_hand_class", "TEXT")
            .column("high_rank", "SMALLINT")
            .column("low_rank", "SMALLINT")
            .column("is_pair", "BOOLEAN")
            .column("is_suited", "BOOLEAN")
            .column("gap", "SMALLINT")
            .column("chen_score", "DOUBLE PRECISION")
            .column("amount_to_call", "BIGINT")
            .column("percent_stack_to_call", "DOUBLE PRECISION")
            .column("highest_bet", "BIGINT")
            .column("pot_odds", "DOUBLE PRECISION")
            .column("detail", "TEXT")
            .column("created_at", "TIMESTAMPTZ NOT NULL DEFAULT NOW()")
            .unique(&["hand_id", "step_number"])
            .foreign_key("game_session_id", "game_sessions", "id")
            .foreign_key("hand_id", "hands", "id")
            .foreign_key("player_id", "players", "id"),
    ]
}
