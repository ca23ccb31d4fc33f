//! Session, player, and hand data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Type alias for money amounts. All bets, blinds, and stacks are integer
/// cents; fractional chips do not exist anywhere in the pipeline.
pub type Cents = i64;

/// Game session ID type
pub type SessionId = i64;

/// Player ID type
pub type PlayerId = i64;

/// Hand ID type (assigned by the game engine, unique per session stream)
pub type HandId = i64;

/// Persisted action row ID type
pub type ActionId = i64;

/// Position of an action within its hand, starting at 1
pub type StepNumber = i32;

/// Player model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Game session model: one configured table instance, immutable after
/// creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
    pub game_type: String,
    pub small_blind: Cents,
    pub big_blind: Cents,
    pub same_stack: bool,
    pub rebuy_setting: Option<String>,
    pub stack_amount: Option<Cents>,
    pub script_name: Option<String>,
}

/// Configuration for a new game session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGameSession {
    pub game_type: String,
    pub small_blind: Cents,
    pub big_blind: Cents,
    pub same_stack: bool,
    pub rebuy_setting: Option<String>,
    pub stack_amount: Option<Cents>,
    pub script_name: Option<String>,
}

impl NewGameSession {
    /// A no-limit hold'em session with the given blinds and everything else
    /// defaulted.
    pub fn nlhe(small_blind: Cents, big_blind: Cents) -> Self {
        Self {
            game_type: "nlhe".to_string(),
            small_blind,
            big_blind,
            same_stack: true,
            rebuy_setting: None,
            stack_amount: None,
            script_name: None,
        }
    }
}

/// Hand aggregate: groups the ordered action sequence of one dealt hand and
/// carries the hand-level facts (board, pot, winner) folded in from the
/// action stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hand {
    pub id: HandId,
    pub game_session_id: SessionId,
    /// Community cards in packed text ("7h8dTc"), filled in as they are dealt.
    pub board: Option<String>,
    /// Total chips awarded from this hand's pot so far.
    pub pot: Cents,
    /// Winner of the pot, or the last winner when a pot was split.
    pub winner_id: Option<PlayerId>,
    pub created_at: DateTime<Utc>,
}
