//! Action stream data models.

use crate::session::{Cents, HandId, PlayerId, SessionId, StepNumber};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A betting round within a hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Deal,
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deal => "deal",
            Self::Preflop => "preflop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Showdown => "showdown",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deal" => Ok(Self::Deal),
            "preflop" => Ok(Self::Preflop),
            "flop" => Ok(Self::Flop),
            "turn" => Ok(Self::Turn),
            "river" => Ok(Self::River),
            "showdown" => Ok(Self::Showdown),
            other => Err(format!("unknown phase: {other}")),
        }
    }
}

/// Everything that can land in the `action` column: the betting verbs plus
/// the dealing and bookkeeping events the engine emits around them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Fold,
    Check,
    Call,
    Bet,
    Raise,
    AllIn,
    DealHole,
    DealCommunity,
    WinPot,
    PostSmallBlind,
    PostBigBlind,
    PhaseAdvance,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fold => "fold",
            Self::Check => "check",
            Self::Call => "call",
            Self::Bet => "bet",
            Self::Raise => "raise",
            Self::AllIn => "all_in",
            Self::DealHole => "deal_hole",
            Self::DealCommunity => "deal_community",
            Self::WinPot => "win_pot",
            Self::PostSmallBlind => "post_small_blind",
            Self::PostBigBlind => "post_big_blind",
            Self::PhaseAdvance => "phase_advance",
        }
    }

    /// Betting verbs move chips and carry betting context; bookkeeping
    /// kinds (deals, phase advances) do not.
    pub fn is_betting(self) -> bool {
        matches!(
            self,
            Self::Fold
                | Self::Check
                | Self::Call
                | Self::Bet
                | Self::Raise
                | Self::AllIn
                | Self::PostSmallBlind
                | Self::PostBigBlind
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fold" => Ok(Self::Fold),
            "check" => Ok(Self::Check),
            "call" => Ok(Self::Call),
            "bet" => Ok(Self::Bet),
            "raise" => Ok(Self::Raise),
            "all_in" => Ok(Self::AllIn),
            "deal_hole" => Ok(Self::DealHole),
            "deal_community" => Ok(Self::DealCommunity),
            "win_pot" => Ok(Self::WinPot),
            "post_small_blind" => Ok(Self::PostSmallBlind),
            "post_big_blind" => Ok(Self::PostBigBlind),
            "phase_advance" => Ok(Self::PhaseAdvance),
            other => Err(format!("unknown action kind: {other}")),
        }
    }
}

/// Table position labels by seat count, button first.
pub fn positions_for(player_count: usize) -> Option<&'static [&'static str]> {
    match player_count {
        2 => Some(&["Button", "BB"]),
        3 => Some(&["Button", "SB", "BB"]),
        4 => Some(&["Button", "SB", "BB", "UTG"]),
        5 => Some(&["Button", "SB", "BB", "UTG", "CO"]),
        6 => Some(&["Button", "SB", "BB", "UTG", "HJ", "CO"]),
        7 => Some(&["Button", "SB", "BB", "UTG", "MP", "HJ", "CO"]),
        8 => Some(&["Button", "SB", "BB", "UTG", "UTG+1", "MP", "HJ", "CO"]),
        9 => Some(&["Button", "SB", "BB", "UTG", "UTG+1", "UTG+2", "MP", "HJ", "CO"]),
        10 => Some(&[
            "Button", "SB", "BB", "UTG", "UTG+1", "UTG+2", "MP", "LJ", "HJ", "CO",
        ]),
        _ => None,
    }
}

/// One raw action event from the game engine. Carries only observed facts;
/// every derived feature is computed at record time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionEvent {
    pub game_session_id: SessionId,
    pub hand_id: HandId,
    pub player_id: Option<PlayerId>,
    pub action: ActionKind,
    pub phase: Phase,
    pub position: Option<String>,
    /// Chips put in by this action, in cents.
    pub amount: Option<Cents>,
    /// Explicit step for idempotent replay; normally allocated by the
    /// recorder.
    pub step_number: Option<StepNumber>,
    /// Hole cards in engine text ("AhKs" or "Ah,Ks").
    pub hole_cards: Option<String>,
    /// Community cards dealt so far, engine text.
    pub community_cards: Option<String>,
    pub amount_to_call: Option<Cents>,
    pub pot: Option<Cents>,
    /// Acting player's remaining stack.
    pub stack: Option<Cents>,
    pub highest_bet: Option<Cents>,
    pub detail: Option<String>,
}

impl ActionEvent {
    /// A minimal event; optional context is filled in with struct update
    /// syntax.
    pub fn new(
        game_session_id: SessionId,
        hand_id: HandId,
        action: ActionKind,
        phase: Phase,
    ) -> Self {
        Self {
            game_session_id,
            hand_id,
            player_id: None,
            action,
            phase,
            position: None,
            amount: None,
            step_number: None,
            hole_cards: None,
            community_cards: None,
            amount_to_call: None,
            pot: None,
            stack: None,
            highest_bet: None,
            detail: None,
        }
    }
}

/// A fully enriched action row ready for insertion. The recorder builds
/// these; nothing else should.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAction {
    pub game_session_id: SessionId,
    pub hand_id: HandId,
    /// `None` lets the store allocate the next step in-transaction.
    pub step_number: Option<StepNumber>,
    pub player_id: Option<PlayerId>,
    pub position: Option<String>,
    pub phase: Phase,
    pub action: ActionKind,
    pub amount: Option<Cents>,
    pub hole_cards: Option<String>,
    pub hole_card1: Option<String>,
    pub hole_card2: Option<String>,
    pub community_cards: Option<String>,
    pub hand_rank_5: Option<i32>,
    pub hand_class: Option<String>,
    pub pf_hand_class: Option<String>,
    pub high_rank: Option<i16>,
    pub low_rank: Option<i16>,
    pub is_pair: Option<bool>,
    pub is_suited: Option<bool>,
    pub gap: Option<i16>,
    pub chen_score: Option<f64>,
    pub amount_to_call: Option<Cents>,
    pub percent_stack_to_call: Option<f64>,
    pub highest_bet: Option<Cents>,
    pub pot_odds: Option<f64>,
    pub detail: Option<String>,
}

/// A persisted action row as read back from the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAction {
    pub id: crate::session::ActionId,
    pub game_session_id: SessionId,
    pub hand_id: HandId,
    pub step_number: StepNumber,
    pub player_id: Option<PlayerId>,
    pub position: Option<String>,
    pub phase: Phase,
    pub action: ActionKind,
    pub amount: Option<Cents>,
    pub hole_cards: Option<String>,
    pub hole_card1: Option<String>,
    pub hole_card2: Option<String>,
    pub community_cards: Option<String>,
    pub hand_rank_5: Option<i32>,
    pub hand_class: Option<String>,
    pub pf_hand_class: Option<String>,
    pub high_rank: Option<i16>,
    pub low_rank: Option<i16>,
    pub is_pair: Option<bool>,
    pub is_suited: Option<bool>,
    pub gap: Option<i16>,
    pub chen_score: Option<f64>,
    pub amount_to_call: Option<Cents>,
    pub percent_stack_to_call: Option<f64>,
    pub highest_bet: Option<Cents>,
    pub pot_odds: Option<f64>,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}
