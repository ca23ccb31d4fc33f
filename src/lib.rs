//! # Poker Ledger
//!
//! An ingestion and feature-enrichment engine for recorded poker hands.
//!
//! The ledger receives a stream of action events from a game engine (live
//! or replayed), scores each action's hand context, and persists one
//! enriched row per action with strict referential integrity to its
//! session, hand, and player. Schema shape evolves through an ordered,
//! idempotent migration ledger, so historical rows survive every change.
//!
//! ## Architecture
//!
//! One action flows through four stages:
//!
//! - **Resolve**: the [`recorder::ActionRecorder`] validates that the
//!   event's session and player exist and creates the hand aggregate on a
//!   hand's first event
//! - **Enrich**: the pure [`features`] extractor computes preflop features
//!   (Chen score, gap, suitedness), postflop hand rank/class via the
//!   [`cards`] evaluator, and betting ratios (pot odds, call cost)
//! - **Persist**: one atomic insert through the [`store`] repositories;
//!   step numbers within a hand are strictly increasing with no gaps, even
//!   under concurrent writers
//! - **Evolve**: the [`migrate`] runner applies named changesets exactly
//!   once each, recorded in a ledger table
//!
//! ## Core Modules
//!
//! - [`cards`]: card model, parsing, and 5-card hand evaluation
//! - [`features`]: pure derived-feature computation
//! - [`recorder`]: the action write path
//! - [`session`]: session, player, and hand entities
//! - [`store`]: PostgreSQL and in-memory storage backends
//! - [`migrate`]: schema changesets and the migration ledger
//!
//! ## Example
//!
//! ```no_run
//! use poker_ledger::recorder::{ActionEvent, ActionKind, ActionRecorder, Phase};
//! use poker_ledger::session::NewGameSession;
//! use poker_ledger::store::MemoryStore;
//! use poker_ledger::store::repository::{PlayerRepository, SessionRepository};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let session = store.create_session(&NewGameSession::nlhe(100, 200)).await?;
//! let player = store.create_player("hero").await?;
//!
//! let recorder = ActionRecorder::new(store);
//! let event = ActionEvent {
//!     player_id: Some(player),
//!     amount: Some(600),
//!     hole_cards: Some("AhKs".to_string()),
//!     ..ActionEvent::new(session, 1, ActionKind::Raise, Phase::Preflop)
//! };
//! let action_id = recorder.record(&event).await?;
//! # Ok(())
//! # }
//! ```

/// Card model, parsing, and hand evaluation.
pub mod cards;
pub use cards::{Card, HandRank, HandValue, Suit, Value};

/// Pure derived-feature computation.
pub mod features;
pub use features::{FeatureBundle, FeatureContext, extract};

/// Action ingestion write path.
pub mod recorder;
pub use recorder::{ActionEvent, ActionRecorder, RecorderError};

/// Session, player, and hand entities.
pub mod session;
pub use session::{Cents, GameSession, Hand, NewGameSession, Player, SessionManager};

/// Storage backends and repository traits.
pub mod store;
pub use store::{Database, DatabaseConfig, MemoryStore, PgStore, StoreError};

/// Schema evolution.
pub mod migrate;
pub use migrate::{ChangeSet, MigrationError, MigrationRunner};
