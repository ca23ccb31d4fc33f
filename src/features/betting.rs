//! Betting-context features: call cost ratios and pot odds.

use crate::session::Cents;
use serde::{Deserialize, Serialize};

/// Betting metrics for one action. Every field is optional: a ratio is null
/// whenever its inputs are unknown or it is not mathematically meaningful
/// (nothing live to call, empty stack).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BettingFeatures {
    pub amount_to_call: Option<Cents>,
    pub percent_stack_to_call: Option<f64>,
    pub highest_bet: Option<Cents>,
    pub pot_odds: Option<f64>,
}

/// Cost to call as a fraction of the resulting pot:
/// `amount_to_call / (pot + amount_to_call)`.
///
/// Returns `None` when there is no live bet to call or the pot is
/// nonsensical, so callers persist null rather than a misleading 0.
pub fn pot_odds(amount_to_call: Cents, pot: Cents) -> Option<f64> {
    if amount_to_call <= 0 || pot < 0 {
        return None;
    }
    Some(amount_to_call as f64 / (pot + amount_to_call) as f64)
}

/// Cost to call as a fraction of the player's remaining stack.
///
/// Returns `None` for an empty or unknown stack.
pub fn percent_stack_to_call(amount_to_call: Cents, stack: Cents) -> Option<f64> {
    if stack <= 0 || amount_to_call < 0 {
        return None;
    }
    Some(amount_to_call as f64 / stack as f64)
}

/// Assemble betting features from whatever context the event carried.
pub fn betting_features(
    amount_to_call: Option<Cents>,
    pot: Option<Cents>,
    stack: Option<Cents>,
    highest_bet: Option<Cents>,
) -> BettingFeatures {
    BettingFeatures {
        amount_to_call,
        percent_stack_to_call: match (amount_to_call, stack) {
            (Some(call), Some(stack)) => percent_stack_to_call(call, stack),
            _ => None,
        },
        highest_bet,
        pot_odds: match (amount_to_call, pot) {
            (Some(call), Some(pot)) => pot_odds(call, pot),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pot_odds_against_resulting_pot() {
        // Calling 600 into a 900 pot: 600 / 1500.
        assert_eq!(pot_odds(600, 900), Some(0.4));
        // Facing half-pot: 50 / 150.
        assert_eq!(pot_odds(50, 100), Some(50.0 / 150.0));
    }

    #[test]
    fn pot_odds_null_without_live_bet() {
        assert_eq!(pot_odds(0, 900), None);
        assert_eq!(pot_odds(-5, 900), None);
        assert_eq!(pot_odds(100, -1), None);
    }

    #[test]
    fn percent_stack_null_for_empty_stack() {
        assert_eq!(percent_stack_to_call(600, 2400), Some(0.25));
        assert_eq!(percent_stack_to_call(600, 0), None);
        assert_eq!(percent_stack_to_call(-1, 100), None);
    }

    #[test]
    fn checking_costs_nothing_of_the_stack() {
        assert_eq!(percent_stack_to_call(0, 2400), Some(0.0));
    }

    #[test]
    fn assembles_only_what_context_allows() {
        let full = betting_features(Some(600), Some(900), Some(2400), Some(600));
        assert_eq!(full.pot_odds, Some(0.4));
        assert_eq!(full.percent_stack_to_call, Some(0.25));
        assert_eq!(full.highest_bet, Some(600));

        let no_pot = betting_features(Some(600), None, Some(2400), None);
        assert_eq!(no_pot.pot_odds, None);
        assert_eq!(no_pot.percent_stack_to_call, Some(0.25));

        let nothing = betting_features(None, Some(900), Some(2400), None);
        assert_eq!(nothing.pot_odds, None);
        assert_eq!(nothing.percent_stack_to_call, None);
        assert_eq!(nothing.amount_to_call, None);
    }
}
