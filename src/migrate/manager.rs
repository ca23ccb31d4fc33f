//! Migration runner: applies changesets against a schema backend and keeps
//! the ledger.

use super::errors::{MigrationError, MigrationResult};
use super::models::{ChangeSet, ledger_table};
use crate::store::repository::SchemaBackend;
use crate::store::schema::ledger_tables;
use std::collections::HashSet;
use std::sync::Arc;

/// Applies named, ordered changesets exactly once each.
///
/// Every applied changeset is recorded in the `schema_migrations` ledger;
/// a re-run of the same sequence skips everything already recorded. A
/// changeset that fails mid-way is rolled back as a unit by the backend
/// and the run halts so an operator can intervene.
pub struct MigrationRunner<S> {
    backend: Arc<S>,
}

impl<S> MigrationRunner<S>
where
    S: SchemaBackend,
{
    pub fn new(backend: Arc<S>) -> Self {
        Self { backend }
    }

    /// Idempotently create the ledger schema and the migration ledger
    /// itself. Safe to call on every startup.
    pub async fn bootstrap(&self) -> MigrationResult<()> {
        self.backend.ensure_table(&ledger_table()).await?;
        for table in ledger_tables() {
            self.backend.ensure_table(&table).await?;
        }
        log::info!("Schema bootstrap complete");
        Ok(())
    }

    /// Apply every changeset not yet in the ledger, in order.
    ///
    /// Returns the names of the changesets applied this run. Destructive
    /// changesets are refused unless `force` is set; already-applied ones
    /// are skipped silently, so re-running a full sequence is a no-op.
    pub async fn apply_all(
        &self,
        changesets: &[ChangeSet],
        force: bool,
    ) -> MigrationResult<Vec<String>> {
        let applied: HashSet<String> = self
            .backend
            .applied_changesets()
            .await?
            .into_iter()
            .collect();

        let mut newly_applied = Vec::new();
        for changeset in changesets {
            if applied.contains(&changeset.name) {
                log::debug!("Changeset {} already applied, skipping", changeset.name);
                continue;
            }
            self.apply_one(changeset, force).await?;
            newly_applied.push(changeset.name.clone());
        }
        Ok(newly_applied)
    }

    /// Apply a single changeset if it is not already in the ledger.
    pub async fn apply(&self, changeset: &ChangeSet, force: bool) -> MigrationResult<bool> {
        let applied = self.backend.applied_changesets().await?;
        if applied.iter().any(|name| name == &changeset.name) {
            return Ok(false);
        }
        self.apply_one(changeset, force).await?;
        Ok(true)
    }

    async fn apply_one(&self, changeset: &ChangeSet, force: bool) -> MigrationResult<()> {
        if changeset.is_destructive() && !force {
            return Err(MigrationError::ForceRequired {
                changeset: changeset.name.clone(),
            });
        }
        log::info!(
            "Applying changeset {} ({} changes)",
            changeset.name,
            changeset.changes.len()
        );
        self.backend
            .apply_changeset(changeset)
            .await
            .map_err(|err| MigrationError::Conflict {
                changeset: changeset.name.clone(),
                reason: err.to_string(),
            })
    }

    /// Privileged reset: drop every ledger table and the migration ledger.
    ///
    /// This is the operational escape hatch, never part of ingestion.
    /// Refuses to run without `force`.
    pub async fn purge(&self, force: bool) -> MigrationResult<()> {
        if !force {
            return Err(MigrationError::ForceRequired {
                changeset: "purge".to_string(),
            });
        }
        // Children first so foreign keys never dangle mid-purge.
        for name in ["actions", "hands", "game_sessions", "players"] {
            self.backend.drop_table(name).await?;
        }
        self.backend.drop_table("schema_migrations").await?;
        log::warn!("Purged all ledger tables");
        Ok(())
    }
}
