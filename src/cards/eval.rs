//! Five-card hand evaluation.
//!
//! Evaluates the best 5-card combination out of 5 to 7 known cards and packs
//! the result into a single total-ordered score: a higher score always means
//! a stronger hand, ties mean an exact chop. The packed score is what gets
//! persisted as `hand_rank_5`.

use super::{Card, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum HandRank {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

impl HandRank {
    /// Class label as persisted in the `hand_class` column.
    pub fn label(self) -> &'static str {
        match self {
            Self::HighCard => "High Card",
            Self::OnePair => "Pair",
            Self::TwoPair => "Two Pair",
            Self::ThreeOfAKind => "Three of a Kind",
            Self::Straight => "Straight",
            Self::Flush => "Flush",
            Self::FullHouse => "Full House",
            Self::FourOfAKind => "Four of a Kind",
            Self::StraightFlush => "Straight Flush",
        }
    }

    fn index(self) -> i32 {
        match self {
            Self::HighCard => 0,
            Self::OnePair => 1,
            Self::TwoPair => 2,
            Self::ThreeOfAKind => 3,
            Self::Straight => 4,
            Self::Flush => 5,
            Self::FullHouse => 6,
            Self::FourOfAKind => 7,
            Self::StraightFlush => 8,
        }
    }
}

impl fmt::Display for HandRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Evaluated strength of a 5-card combination.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct HandValue {
    pub rank: HandRank,
    /// Packed score: rank category in the high bits, the five tiebreak
    /// card values in descending significance below it.
    pub score: i32,
}

impl HandValue {
    pub fn class(&self) -> &'static str {
        self.rank.label()
    }
}

impl Ord for HandValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.score.cmp(&other.score)
    }
}

impl PartialOrd for HandValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Evaluate the best 5-card hand from the given cards.
///
/// Returns `None` with fewer than 5 cards; board features stay null until
/// the flop is down.
pub fn evaluate(cards: &[Card]) -> Option<HandValue> {
    if cards.len() < 5 {
        return None;
    }
    let n = cards.len();
    let mut best: Option<HandValue> = None;
    for mask in 0u32..(1 << n) {
        if mask.count_ones() != 5 {
            continue;
        }
        let mut five = [cards[0]; 5];
        let mut k = 0;
        for (i, card) in cards.iter().enumerate() {
            if mask & (1 << i) != 0 {
                five[k] = *card;
                k += 1;
            }
        }
        let value = eval_five(&five);
        if best.is_none_or(|b| value.score > b.score) {
            best = Some(value);
        }
    }
    best
}

fn eval_five(cards: &[Card; 5]) -> HandValue {
    let mut values: [Value; 5] = [
        cards[0].0, cards[1].0, cards[2].0, cards[3].0, cards[4].0,
    ];
    values.sort_unstable_by(|a, b| b.cmp(a));

    let is_flush = cards.iter().all(|c| c.1 == cards[0].1);
    let straight_high = straight_high(&values);

    // Group values by multiplicity, strongest group first.
    let mut groups: Vec<(u8, Value)> = Vec::with_capacity(5);
    for &v in &values {
        match groups.iter_mut().find(|(_, gv)| *gv == v) {
            Some((count, _)) => *count += 1,
            None => groups.push((1, v)),
        }
    }
    groups.sort_unstable_by(|a, b| b.cmp(a));

    let (rank, tiebreaks) = match (is_flush, straight_high, groups.as_slice()) {
        (true, Some(high), _) => (HandRank::StraightFlush, vec![high]),
        (_, _, [(4, quad), (1, kicker)]) => (HandRank::FourOfAKind, vec![*quad, *kicker]),
        (_, _, [(3, trip), (2, pair)]) => (HandRank::FullHouse, vec![*trip, *pair]),
        (true, None, _) => (HandRank::Flush, values.to_vec()),
        (false, Some(high), _) => (HandRank::Straight, vec![high]),
        (_, _, [(3, trip), (1, k1), (1, k2)]) => (HandRank::ThreeOfAKind, vec![*trip, *k1, *k2]),
        (_, _, [(2, hi), (2, lo), (1, kicker)]) => (HandRank::TwoPair, vec![*hi, *lo, *kicker]),
        (_, _, [(2, pair), (1, k1), (1, k2), (1, k3)]) => {
            (HandRank::OnePair, vec![*pair, *k1, *k2, *k3])
        }
        _ => (HandRank::HighCard, values.to_vec()),
    };

    HandValue {
        rank,
        score: pack(rank, &tiebreaks),
    }
}

/// High card of a straight, if the five distinct values are consecutive.
/// The wheel (A-5-4-3-2) counts as a 5-high straight.
fn straight_high(sorted_desc: &[Value; 5]) -> Option<Value> {
    for window in sorted_desc.windows(2) {
        if window[0] == window[1] {
            return None;
        }
    }
    if sorted_desc[0] - sorted_desc[4] == 4 {
        return Some(sorted_desc[0]);
    }
    if sorted_desc == &[14, 5, 4, 3, 2] {
        return Some(5);
    }
    None
}

fn pack(rank: HandRank, tiebreaks: &[Value]) -> i32 {
    let mut score = rank.index() << 20;
    for (i, &v) in tiebreaks.iter().enumerate() {
        score |= i32::from(v) << (16 - 4 * i);
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::parse_cards;

    fn value_of(text: &str) -> HandValue {
        evaluate(&parse_cards(text).unwrap()).unwrap()
    }

    #[test]
    fn needs_five_cards() {
        assert!(evaluate(&parse_cards("AhKs").unwrap()).is_none());
        assert!(evaluate(&parse_cards("AhKsQd2c").unwrap()).is_none());
        assert!(evaluate(&parse_cards("AhKsQd2c3h").unwrap()).is_some());
    }

    #[test]
    fn classifies_every_category() {
        assert_eq!(value_of("AhKhQhJhTh").rank, HandRank::StraightFlush);
        assert_eq!(value_of("7c7d7h7s2c").rank, HandRank::FourOfAKind);
        assert_eq!(value_of("7c7d7h2s2c").rank, HandRank::FullHouse);
        assert_eq!(value_of("Ah9h7h4h2h").rank, HandRank::Flush);
        assert_eq!(value_of("9c8dTh6s7c").rank, HandRank::Straight);
        assert_eq!(value_of("7c7d7hKs2c").rank, HandRank::ThreeOfAKind);
        assert_eq!(value_of("7c7d2h2sKc").rank, HandRank::TwoPair);
        assert_eq!(value_of("7c7d5h3sKc").rank, HandRank::OnePair);
        assert_eq!(value_of("Ac7d5h3sKc").rank, HandRank::HighCard);
    }

    #[test]
    fn wheel_is_a_five_high_straight() {
        let wheel = value_of("Ah2c3d4s5h");
        assert_eq!(wheel.rank, HandRank::Straight);
        let six_high = value_of("2c3d4s5h6d");
        assert!(six_high.score > wheel.score);
    }

    #[test]
    fn higher_category_always_beats_lower() {
        // Worst hand of each category still beats the best of the one below.
        let weakest_flush = value_of("7h5h4h3h2h");
        let best_straight = value_of("AhKcQdJsTc");
        assert!(weakest_flush.score > best_straight.score);
    }

    #[test]
    fn kickers_break_ties() {
        let aces_king = value_of("AcAdKh5s3c");
        let aces_queen = value_of("AhAsQd5c3d");
        assert!(aces_king.score > aces_queen.score);

        let chop_a = value_of("AcAdKh5s3c");
        let chop_b = value_of("AhAsKd5c3d");
        assert_eq!(chop_a.score, chop_b.score);
    }

    #[test]
    fn finds_best_five_of_seven() {
        // Hole cards plus full board; the trips on board beat the hole pair.
        let seven = parse_cards("2c2dKhKsKc9h4d").unwrap();
        let value = evaluate(&seven).unwrap();
        assert_eq!(value.rank, HandRank::FullHouse);

        // Board-only straight is found even when hole cards play nothing.
        let seven = parse_cards("2c3d5h6s7c8h9d").unwrap();
        assert_eq!(evaluate(&seven).unwrap().rank, HandRank::Straight);
    }

    #[test]
    fn class_labels_match_persisted_strings() {
        assert_eq!(value_of("7c7d5h3sKc").class(), "Pair");
        assert_eq!(value_of("7c7d2h2sKc").class(), "Two Pair");
        assert_eq!(value_of("AhKhQhJhTh").class(), "Straight Flush");
    }
}
