//! Card model and text parsing.
//!
//! Cards arrive from the game engine as compact text ("AhKs", "Ah,Kd") and
//! are persisted back in the same form, so parsing and formatting must
//! round-trip exactly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod eval;

pub use eval::{HandRank, HandValue, evaluate};

/// Card value, 2 through 14 (ace high).
pub type Value = u8;

/// Lowest card value (deuce).
pub const MIN_VALUE: Value = 2;

/// Highest card value (ace).
pub const ACE: Value = 14;

/// Queen's value, the cutoff for the Chen straight bonus.
pub const QUEEN: Value = 12;

/// Card parsing errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CardError {
    /// Unknown rank character
    #[error("Invalid card rank: {0:?}")]
    InvalidRank(char),

    /// Unknown suit character
    #[error("Invalid card suit: {0:?}")]
    InvalidSuit(char),

    /// Input not made of two-character cards
    #[error("Malformed card text: {0:?}")]
    Malformed(String),

    /// Wrong number of cards for the context
    #[error("Expected {expected} cards, got {got}")]
    WrongCount { expected: usize, got: usize },
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Diamond,
    Heart,
    Spade,
}

impl Suit {
    /// One-letter code used in card text ("Ah" -> 'h').
    pub fn code(self) -> char {
        match self {
            Self::Club => 'c',
            Self::Diamond => 'd',
            Self::Heart => 'h',
            Self::Spade => 's',
        }
    }

    fn from_code(c: char) -> Result<Self, CardError> {
        match c {
            'c' => Ok(Self::Club),
            'd' => Ok(Self::Diamond),
            'h' => Ok(Self::Heart),
            's' => Ok(Self::Spade),
            other => Err(CardError::InvalidSuit(other)),
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A card is a tuple of a value (2u8 ... ace=14u8) and a suit.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl Card {
    pub fn value(self) -> Value {
        self.0
    }

    pub fn suit(self) -> Suit {
        self.1
    }

    /// Rank character as it appears in card text ('2'..'9', 'T', 'J', 'Q', 'K', 'A').
    pub fn rank_char(self) -> char {
        value_to_char(self.0)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", value_to_char(self.0), self.1)
    }
}

impl FromStr for Card {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(rank), Some(suit), None) => {
                Ok(Card(char_to_value(rank)?, Suit::from_code(suit)?))
            }
            _ => Err(CardError::Malformed(s.to_string())),
        }
    }
}

fn char_to_value(c: char) -> Result<Value, CardError> {
    match c.to_ascii_uppercase() {
        '2' => Ok(2),
        '3' => Ok(3),
        '4' => Ok(4),
        '5' => Ok(5),
        '6' => Ok(6),
        '7' => Ok(7),
        '8' => Ok(8),
        '9' => Ok(9),
        'T' => Ok(10),
        'J' => Ok(11),
        'Q' => Ok(12),
        'K' => Ok(13),
        'A' => Ok(14),
        other => Err(CardError::InvalidRank(other)),
    }
}

fn value_to_char(value: Value) -> char {
    match value {
        2..=9 => (b'0' + value) as char,
        10 => 'T',
        11 => 'J',
        12 => 'Q',
        13 => 'K',
        14 => 'A',
        // Out-of-range values never come from a parsed card.
        _ => '?',
    }
}

/// Parse a run of cards from engine text.
///
/// Accepts both the packed form ("AhKs") and the delimited forms
/// ("Ah,Kd", "Ah Kd") seen in upstream hand scripts.
pub fn parse_cards(s: &str) -> Result<Vec<Card>, CardError> {
    let chars: Vec<char> = s.chars().filter(|c| !matches!(c, ',' | ' ')).collect();
    if chars.len() % 2 != 0 {
        return Err(CardError::Malformed(s.to_string()));
    }
    chars
        .chunks(2)
        .map(|pair| {
            Ok(Card(
                char_to_value(pair[0])?,
                Suit::from_code(pair[1].to_ascii_lowercase())?,
            ))
        })
        .collect()
}

/// Parse exactly two hole cards.
pub fn parse_hole_cards(s: &str) -> Result<(Card, Card), CardError> {
    let cards = parse_cards(s)?;
    match cards.as_slice() {
        [first, second] => Ok((*first, *second)),
        other => Err(CardError::WrongCount {
            expected: 2,
            got: other.len(),
        }),
    }
}

/// Format cards back into packed engine text ("7h8dTc").
pub fn format_cards(cards: &[Card]) -> String {
    cards.iter().map(Card::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_card() {
        assert_eq!("Ah".parse::<Card>().unwrap(), Card(14, Suit::Heart));
        assert_eq!("Tc".parse::<Card>().unwrap(), Card(10, Suit::Club));
        assert_eq!("2s".parse::<Card>().unwrap(), Card(2, Suit::Spade));
    }

    #[test]
    fn rejects_bad_cards() {
        assert_eq!("1h".parse::<Card>(), Err(CardError::InvalidRank('1')));
        assert_eq!("Ax".parse::<Card>(), Err(CardError::InvalidSuit('x')));
        assert!(matches!(
            "Ahh".parse::<Card>(),
            Err(CardError::Malformed(_))
        ));
    }

    #[test]
    fn parses_packed_and_delimited_forms() {
        let packed = parse_cards("AhKs").unwrap();
        let comma = parse_cards("Ah,Ks").unwrap();
        let spaced = parse_cards("Ah Ks").unwrap();
        assert_eq!(packed, comma);
        assert_eq!(packed, spaced);
        assert_eq!(packed, vec![Card(14, Suit::Heart), Card(13, Suit::Spade)]);
    }

    #[test]
    fn hole_cards_require_exactly_two() {
        assert!(parse_hole_cards("AhKs").is_ok());
        assert_eq!(
            parse_hole_cards("AhKsQd"),
            Err(CardError::WrongCount {
                expected: 2,
                got: 3
            })
        );
    }

    #[test]
    fn formatting_round_trips() {
        let text = "7h8dTcJsQd";
        let cards = parse_cards(text).unwrap();
        assert_eq!(format_cards(&cards), text);
    }
}
