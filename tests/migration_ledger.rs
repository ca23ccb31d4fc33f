//! Migration ledger behavior against the in-memory schema backend.

use poker_ledger::migrate::{ChangeSet, MigrationError, MigrationRunner, observed_history};
use poker_ledger::store::repository::SchemaBackend;
use poker_ledger::store::schema::TableDef;
use poker_ledger::store::{MemoryStore, memory::MemValue};
use std::sync::Arc;

/// The actions table as it looked before the evaluator settled on
/// `hand_rank_5`.
fn legacy_actions_table() -> TableDef {
    TableDef::new("actions")
        .column("id", "BIGSERIAL PRIMARY KEY")
        .column("hand_id", "BIGINT NOT NULL")
        .column("step_number", "INTEGER NOT NULL")
        .column("action", "TEXT NOT NULL")
        .column("hand_rank", "INTEGER")
}

#[tokio::test]
async fn bootstrap_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let runner = MigrationRunner::new(Arc::clone(&store));

    runner.bootstrap().await.unwrap();
    runner.bootstrap().await.unwrap();

    for table in ["players", "game_sessions", "hands", "actions", "schema_migrations"] {
        assert!(store.has_table(table).await.unwrap(), "missing {table}");
    }
}

#[tokio::test]
async fn rename_preserves_row_values_and_reruns_are_noops() {
    let store = Arc::new(MemoryStore::new());
    store.ensure_table(&legacy_actions_table()).await.unwrap();
    store
        .insert_row(
            "actions",
            &[
                ("id", MemValue::Int(1)),
                ("hand_id", MemValue::Int(7)),
                ("step_number", MemValue::Int(1)),
                ("action", MemValue::from("raise")),
                ("hand_rank", MemValue::Int(1_234_567)),
            ],
        )
        .unwrap();
    store
        .insert_row(
            "actions",
            &[
                ("id", MemValue::Int(2)),
                ("hand_id", MemValue::Int(7)),
                ("step_number", MemValue::Int(2)),
                ("action", MemValue::from("call")),
                ("hand_rank", MemValue::Null),
            ],
        )
        .unwrap();

    let runner = MigrationRunner::new(Arc::clone(&store));
    let rename = ChangeSet::new("0004_rename_hand_rank").rename_column(
        "actions",
        "hand_rank",
        "hand_rank_5",
    );

    let applied = runner.apply(&rename, false).await.unwrap();
    assert!(applied);
    assert!(!store.has_column("actions", "hand_rank").await.unwrap());
    assert!(store.has_column("actions", "hand_rank_5").await.unwrap());

    // Every existing row's value lives under the new name.
    let values = store.column_values("actions", "hand_rank_5").unwrap();
    assert_eq!(values, vec![MemValue::Int(1_234_567), MemValue::Null]);

    // Second run: already in the ledger, nothing applied, data untouched.
    let applied_again = runner.apply(&rename, false).await.unwrap();
    assert!(!applied_again);
    let values = store.column_values("actions", "hand_rank_5").unwrap();
    assert_eq!(values, vec![MemValue::Int(1_234_567), MemValue::Null]);
}

#[tokio::test]
async fn observed_history_applies_once_end_to_end() {
    let store = Arc::new(MemoryStore::new());
    // A store born before the feature columns existed.
    store.ensure_table(&legacy_actions_table()).await.unwrap();

    let runner = MigrationRunner::new(Arc::clone(&store));
    let applied = runner.apply_all(&observed_history(), false).await.unwrap();
    assert_eq!(applied.len(), observed_history().len());

    for column in ["hole_cards", "chen_score", "pot_odds", "hand_rank_5"] {
        assert!(
            store.has_column("actions", column).await.unwrap(),
            "missing {column} after history"
        );
    }

    // The whole sequence is a no-op the second time.
    let applied = runner.apply_all(&observed_history(), false).await.unwrap();
    assert!(applied.is_empty());
}

#[tokio::test]
async fn destructive_changesets_require_force() {
    let store = Arc::new(MemoryStore::new());
    let runner = MigrationRunner::new(Arc::clone(&store));
    runner.bootstrap().await.unwrap();

    let reset = ChangeSet::new("9999_drop_actions").drop_table("actions");
    let err = runner.apply(&reset, false).await.unwrap_err();
    assert!(matches!(err, MigrationError::ForceRequired { .. }));
    assert!(store.has_table("actions").await.unwrap());

    runner.apply(&reset, true).await.unwrap();
    assert!(!store.has_table("actions").await.unwrap());
}

#[tokio::test]
async fn failed_changeset_rolls_back_atomically() {
    let store = Arc::new(MemoryStore::new());
    let runner = MigrationRunner::new(Arc::clone(&store));
    runner.bootstrap().await.unwrap();

    // First change is fine, second targets a missing table: the whole
    // changeset must roll back.
    let broken = ChangeSet::new("bad")
        .add_column("actions", "experimental", "TEXT")
        .rename_column("no_such_table", "a", "b");

    let err = runner.apply(&broken, false).await.unwrap_err();
    assert!(matches!(err, MigrationError::Conflict { .. }));
    assert!(
        !store.has_column("actions", "experimental").await.unwrap(),
        "partial changeset must not be visible"
    );
    // Nothing recorded in the ledger either.
    assert!(runner.apply(&ChangeSet::new("bad"), false).await.unwrap());
}

#[tokio::test]
async fn purge_requires_force_and_clears_everything() {
    let store = Arc::new(MemoryStore::new());
    let runner = MigrationRunner::new(Arc::clone(&store));
    runner.bootstrap().await.unwrap();

    let err = runner.purge(false).await.unwrap_err();
    assert!(matches!(err, MigrationError::ForceRequired { .. }));

    runner.purge(true).await.unwrap();
    for table in ["players", "game_sessions", "hands", "actions", "schema_migrations"] {
        assert!(!store.has_table(table).await.unwrap(), "{table} survived purge");
    }
}
