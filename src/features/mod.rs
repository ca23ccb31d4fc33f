//! Feature extraction: pure computation of derived hand-strength and
//! betting features from an action's card and betting context.
//!
//! The extractor never fails. Whatever the context is missing simply stays
//! `None` in the returned bundle and the recorder persists nulls for those
//! columns; a later backfill can recompute every derived column from the
//! stored raw facts alone.

pub mod betting;
pub mod preflop;

pub use betting::{BettingFeatures, betting_features, percent_stack_to_call, pot_odds};
pub use preflop::{PreflopFeatures, chen_score, preflop_features};

use crate::cards::{Card, HandValue, evaluate};
use crate::session::Cents;
use serde::{Deserialize, Serialize};

/// Postflop hand-strength features, defined once at least five cards
/// (two hole plus three community) are known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardFeatures {
    /// Packed total-ordered 5-card score; higher is stronger.
    pub hand_rank_5: i32,
    /// Class label ("Two Pair", "Flush", ...).
    pub hand_class: String,
}

impl From<HandValue> for BoardFeatures {
    fn from(value: HandValue) -> Self {
        Self {
            hand_rank_5: value.score,
            hand_class: value.class().to_string(),
        }
    }
}

/// Best-available context for one action.
#[derive(Debug, Clone, Default)]
pub struct FeatureContext {
    pub hole_cards: Option<(Card, Card)>,
    pub community_cards: Vec<Card>,
    pub amount_to_call: Option<Cents>,
    pub pot: Option<Cents>,
    pub stack: Option<Cents>,
    pub highest_bet: Option<Cents>,
}

/// The full derived-feature bundle for one action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureBundle {
    pub preflop: Option<PreflopFeatures>,
    pub board: Option<BoardFeatures>,
    pub betting: BettingFeatures,
}

/// Extract every feature the context supports.
///
/// Preflop features need both hole cards; board features additionally need
/// at least three community cards (five total, enough for a 5-card
/// evaluation); betting ratios need their respective amounts.
pub fn extract(ctx: &FeatureContext) -> FeatureBundle {
    let preflop = ctx
        .hole_cards
        .map(|(first, second)| preflop_features(first, second));

    let board = ctx.hole_cards.and_then(|(first, second)| {
        if ctx.community_cards.len() < 3 {
            return None;
        }
        let mut cards = Vec::with_capacity(2 + ctx.community_cards.len());
        cards.push(first);
        cards.push(second);
        cards.extend_from_slice(&ctx.community_cards);
        evaluate(&cards).map(BoardFeatures::from)
    });

    FeatureBundle {
        preflop,
        board,
        betting: betting_features(ctx.amount_to_call, ctx.pot, ctx.stack, ctx.highest_bet),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{parse_cards, parse_hole_cards};

    fn ctx(hole: Option<&str>, community: &str) -> FeatureContext {
        FeatureContext {
            hole_cards: hole.map(|h| parse_hole_cards(h).unwrap()),
            community_cards: parse_cards(community).unwrap(),
            ..FeatureContext::default()
        }
    }

    #[test]
    fn no_cards_yields_empty_bundle() {
        let bundle = extract(&FeatureContext::default());
        assert!(bundle.preflop.is_none());
        assert!(bundle.board.is_none());
        assert_eq!(bundle.betting, BettingFeatures::default());
    }

    #[test]
    fn hole_cards_alone_yield_preflop_only() {
        let bundle = extract(&ctx(Some("AhKs"), ""));
        let preflop = bundle.preflop.unwrap();
        assert_eq!(preflop.hand_class, "AKo");
        assert!(bundle.board.is_none());
    }

    #[test]
    fn board_features_need_three_community_cards() {
        // Two community cards: not enough for a 5-card evaluation.
        assert!(extract(&ctx(Some("AhKs"), "Ad7c")).board.is_none());

        // Flop down: top pair evaluates.
        let bundle = extract(&ctx(Some("AhKs"), "Ad7c2h"));
        let board = bundle.board.unwrap();
        assert_eq!(board.hand_class, "Pair");
    }

    #[test]
    fn board_features_need_hole_cards() {
        // A full board with unknown hole cards stays null.
        assert!(extract(&ctx(None, "Ad7c2h9s3d")).board.is_none());
    }

    #[test]
    fn full_board_evaluates_best_five_of_seven() {
        let bundle = extract(&ctx(Some("AhKh"), "QhJhTh9s9d"));
        assert_eq!(bundle.board.unwrap().hand_class, "Straight Flush");
    }

    #[test]
    fn extraction_is_deterministic() {
        let context = ctx(Some("8d8c"), "Ad8h2s");
        assert_eq!(extract(&context), extract(&context));
    }
}
