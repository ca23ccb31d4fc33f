//! Migration changeset models and the recorded schema history.

use crate::store::schema::TableDef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One schema change. Add and rename are additive; drops are destructive
/// and gated behind a force flag at the runner level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Change {
    AddColumn {
        table: String,
        column: String,
        definition: String,
    },
    RenameColumn {
        table: String,
        from: String,
        to: String,
    },
    DropColumn {
        table: String,
        column: String,
    },
    DropTable {
        table: String,
    },
}

impl Change {
    pub fn is_destructive(&self) -> bool {
        matches!(self, Self::DropColumn { .. } | Self::DropTable { .. })
    }

    /// Table the change targets.
    pub fn table(&self) -> &str {
        match self {
            Self::AddColumn { table, .. }
            | Self::RenameColumn { table, .. }
            | Self::DropColumn { table, .. }
            | Self::DropTable { table } => table,
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddColumn { table, column, .. } => write!(f, "add column {table}.{column}"),
            Self::RenameColumn { table, from, to } => {
                write!(f, "rename column {table}.{from} -> {to}")
            }
            Self::DropColumn { table, column } => write!(f, "drop column {table}.{column}"),
            Self::DropTable { table } => write!(f, "drop table {table}"),
        }
    }
}

/// A named, ordered group of changes applied exactly once and recorded in
/// the migration ledger under its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub name: String,
    pub changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            changes: Vec::new(),
        }
    }

    pub fn add_column(mut self, table: &str, column: &str, definition: &str) -> Self {
        self.changes.push(Change::AddColumn {
            table: table.to_string(),
            column: column.to_string(),
            definition: definition.to_string(),
        });
        self
    }

    pub fn rename_column(mut self, table: &str, from: &str, to: &str) -> Self {
        self.changes.push(Change::RenameColumn {
            table: table.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        });
        self
    }

    pub fn drop_column(mut self, table: &str, column: &str) -> Self {
        self.changes.push(Change::DropColumn {
            table: table.to_string(),
            column: column.to_string(),
        });
        self
    }

    pub fn drop_table(mut self, table: &str) -> Self {
        self.changes.push(Change::DropTable {
            table: table.to_string(),
        });
        self
    }

    /// A changeset is destructive if any of its changes is.
    pub fn is_destructive(&self) -> bool {
        self.changes.iter().any(Change::is_destructive)
    }
}

/// Definition of the migration ledger table itself.
pub fn ledger_table() -> TableDef {
    TableDef::new("schema_migrations")
        .column("name", "TEXT PRIMARY KEY")
        .column("applied_at", "TIMESTAMPTZ NOT NULL DEFAULT NOW()")
}

/// The evolution of the actions table from its minimal first shape to the
/// current feature-rich one, as an ordered changeset sequence. Stores
/// created from the current [`ledger_tables`](crate::store::ledger_tables)
/// baseline no-op through all of it; stores born earlier catch up.
pub fn observed_history() -> Vec<ChangeSet> {
    vec![
        ChangeSet::new("0001_action_card_context")
            .add_column("actions", "hole_cards", "TEXT")
            .add_column("actions", "hole_card1", "TEXT")
            .add_column("actions", "hole_card2", "TEXT")
            .add_column("actions", "community_cards", "TEXT"),
        ChangeSet::new("0002_preflop_features")
            .add_column("actions", "pf_hand_class", "TEXT")
            .add_column("actions", "high_rank", "SMALLINT")
            .add_column("actions", "low_rank", "SMALLINT")
            .add_column("actions", "is_pair", "BOOLEAN")
            .add_column("actions", "is_suited", "BOOLEAN")
            .add_column("actions", "gap", "SMALLINT")
            .add_column("actions", "chen_score", "DOUBLE PRECISION"),
        ChangeSet::new("0003_betting_features")
            .add_column("actions", "amount_to_call", "BIGINT")
            .add_column("actions", "percent_stack_to_call", "DOUBLE PRECISION")
            .add_column("actions", "highest_bet", "BIGINT")
            .add_column("actions", "pot_odds", "DOUBLE PRECISION"),
        // hand_rank held the 5-card score before the evaluator settled on
        // its packed form; the data is compatible, only the name changed.
        ChangeSet::new("0004_rename_hand_rank")
            .rename_column("actions", "hand_rank", "hand_rank_5"),
    ]
}
