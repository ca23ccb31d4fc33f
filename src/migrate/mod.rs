//! Schema evolution: an ordered, idempotent migration ledger.
//!
//! The schema's shape changes through named changesets applied exactly
//! once each. The ledger records what has been applied, so re-running the
//! full sequence is a no-op for everything already in it. Destructive
//! changes (drops, resets) never run without an explicit force flag.

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{MigrationError, MigrationResult};
pub use manager::MigrationRunner;
pub use models::{Change, ChangeSet, ledger_table, observed_history};
