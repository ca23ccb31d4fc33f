//! Action ingestion: the write path from raw engine events to enriched,
//! persisted action rows.

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{EventIdentity, RecorderError, RecorderResult};
pub use manager::{ActionRecorder, recompute_features};
pub use models::{ActionEvent, ActionKind, NewAction, Phase, StoredAction, positions_for};
