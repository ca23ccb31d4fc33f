/// Property-based tests for feature extraction using proptest
///
/// These verify that the evaluator and the preflop/betting features hold
/// their invariants across randomly generated inputs.
use poker_ledger::cards::{Card, HandRank, Suit, evaluate};
use poker_ledger::features::{percent_stack_to_call, pot_odds, preflop_features};
use proptest::prelude::*;
use std::collections::BTreeSet;

// Strategy to generate a valid card (values 2-14, ace is 14)
fn card_strategy() -> impl Strategy<Value = Card> {
    (2u8..=14, 0u8..=3).prop_map(|(value, suit_idx)| {
        let suit = match suit_idx {
            0 => Suit::Club,
            1 => Suit::Diamond,
            2 => Suit::Heart,
            _ => Suit::Spade,
        };
        Card(value, suit)
    })
}

// Strategy to generate a vec of unique cards (no duplicates)
fn unique_cards_strategy(count: usize) -> impl Strategy<Value = Vec<Card>> {
    prop::collection::vec(card_strategy(), count).prop_filter("Cards must be unique", |cards| {
        let set: BTreeSet<_> = cards.iter().collect();
        set.len() == cards.len()
    })
}

proptest! {
    #[test]
    fn evaluation_is_deterministic(cards in unique_cards_strategy(7)) {
        prop_assert_eq!(evaluate(&cards), evaluate(&cards));
    }

    #[test]
    fn more_cards_never_weaken_a_hand(cards in unique_cards_strategy(7)) {
        let five = evaluate(&cards[..5]).unwrap();
        let seven = evaluate(&cards).unwrap();
        prop_assert!(seven.score >= five.score, "extra cards weakened the hand");
    }

    #[test]
    fn score_orders_by_category(cards in unique_cards_strategy(5)) {
        let value = evaluate(&cards).unwrap();
        // The packed score's category bits must agree with the rank enum.
        let category = value.score >> 20;
        let expected = match value.rank {
            HandRank::HighCard => 0,
            HandRank::OnePair => 1,
            HandRank::TwoPair => 2,
            HandRank::ThreeOfAKind => 3,
            HandRank::Straight => 4,
            HandRank::Flush => 5,
            HandRank::FullHouse => 6,
            HandRank::FourOfAKind => 7,
            HandRank::StraightFlush => 8,
        };
        prop_assert_eq!(category, expected);
    }

    #[test]
    fn preflop_features_are_order_independent(cards in unique_cards_strategy(2)) {
        let forward = preflop_features(cards[0], cards[1]);
        let reversed = preflop_features(cards[1], cards[0]);
        prop_assert_eq!(forward, reversed);
    }

    #[test]
    fn chen_score_stays_in_range(cards in unique_cards_strategy(2)) {
        let features = preflop_features(cards[0], cards[1]);
        // 7-2 offsuit bottoms the table, pocket aces top it.
        prop_assert!(features.chen_score >= -1.5);
        prop_assert!(features.chen_score <= 20.0);
        // Scores are exact half-point multiples.
        prop_assert_eq!(features.chen_score * 2.0, (features.chen_score * 2.0).round());
    }

    #[test]
    fn gap_matches_rank_distance(cards in unique_cards_strategy(2)) {
        let features = preflop_features(cards[0], cards[1]);
        let distance = features.high_rank - features.low_rank;
        prop_assert_eq!(features.gap, distance.saturating_sub(1));
        prop_assert!(features.gap <= 11);
    }

    #[test]
    fn hand_class_encodes_suitedness(cards in unique_cards_strategy(2)) {
        let features = preflop_features(cards[0], cards[1]);
        if features.is_pair {
            prop_assert_eq!(features.hand_class.len(), 2);
        } else if features.is_suited {
            prop_assert!(features.hand_class.ends_with('s'));
        } else {
            prop_assert!(features.hand_class.ends_with('o'));
        }
    }

    #[test]
    fn pot_odds_are_a_proper_fraction(call in 1i64..1_000_000, pot in 0i64..1_000_000) {
        let odds = pot_odds(call, pot).unwrap();
        prop_assert!(odds > 0.0);
        prop_assert!(odds <= 1.0);
    }

    #[test]
    fn percent_stack_is_non_negative(call in 0i64..1_000_000, stack in 1i64..1_000_000) {
        let ratio = percent_stack_to_call(call, stack).unwrap();
        prop_assert!(ratio >= 0.0);
        prop_assert!(ratio.is_finite());
    }
}
