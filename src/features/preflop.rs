//! Preflop hole-card features and the Chen score.
//!
//! Everything here is a deterministic pure function of the two hole cards;
//! the recorder materializes the results into action rows, and a backfill
//! can always recompute them from `hole_card1`/`hole_card2` alone.
//!
//! # Chen score reference table
//!
//! Base points by high card: A=10, K=8, Q=7, J=6, T=5, then half the card
//! value down to 2=1 (9=4.5, 8=4, 7=3.5, 6=3, 5=2.5, 4=2, 3=1.5, 2=1).
//! Pairs score twice the base with a floor of 5. Suited cards add 2. The
//! gap between the cards (rank distance minus one) costs 0 / 1 / 2 / 4 for
//! gaps of 0-3 and 5 for anything wider. Non-pairs with gap <= 1 where both
//! cards are queen or lower add 1 for straight potential. Scores are exact
//! half-point multiples with no rounding and no floor; the minimum is 7-2
//! offsuit at -1.5.
//!
//! Pinned values: AA=20, KK=16, QQ=14, AKs=12, JTs=9, AKo=10, 22=5, 72o=-1.5.

use crate::cards::{Card, QUEEN, Value};
use serde::{Deserialize, Serialize};

/// Derived features for a pair of hole cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreflopFeatures {
    pub high_rank: Value,
    pub low_rank: Value,
    pub is_pair: bool,
    pub is_suited: bool,
    /// Rank distance minus one; 0 for pairs and adjacent ranks.
    pub gap: u8,
    pub chen_score: f64,
    /// Preflop archetype: "AKs", "72o", pairs are bare ("AA").
    pub hand_class: String,
}

/// Compute all preflop features for two hole cards.
pub fn preflop_features(first: Card, second: Card) -> PreflopFeatures {
    let (high, low) = if first.value() >= second.value() {
        (first, second)
    } else {
        (second, first)
    };
    let is_pair = high.value() == low.value();
    let is_suited = high.suit() == low.suit();
    let gap = (high.value() - low.value()).saturating_sub(1);

    let suffix = match (is_pair, is_suited) {
        (true, _) => "",
        (false, true) => "s",
        (false, false) => "o",
    };
    let hand_class = format!("{}{}{suffix}", high.rank_char(), low.rank_char());

    PreflopFeatures {
        high_rank: high.value(),
        low_rank: low.value(),
        is_pair,
        is_suited,
        gap,
        chen_score: chen_score(high.value(), low.value(), is_suited),
        hand_class,
    }
}

/// Chen score for a hole-card pair, per the reference table in the module
/// docs. Accepts the two values in either order.
pub fn chen_score(first: Value, second: Value, is_suited: bool) -> f64 {
    let (high, low) = if first >= second {
        (first, second)
    } else {
        (second, first)
    };
    let is_pair = high == low;
    let gap = (high - low).saturating_sub(1);

    let mut score = base_points(high);
    if is_pair {
        score = (score * 2.0).max(5.0);
    }
    if is_suited {
        score += 2.0;
    }
    score -= gap_penalty(gap);
    if !is_pair && gap <= 1 && high <= QUEEN {
        score += 1.0;
    }
    score
}

fn base_points(value: Value) -> f64 {
    match value {
        14 => 10.0,
        13 => 8.0,
        12 => 7.0,
        11 => 6.0,
        _ => f64::from(value) / 2.0,
    }
}

fn gap_penalty(gap: u8) -> f64 {
    match gap {
        0 => 0.0,
        1 => 1.0,
        2 => 2.0,
        3 => 4.0,
        _ => 5.0,
    }
}
