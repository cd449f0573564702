//! Win-cut tier table
//!
//! A cashier owns an ordered list of player-count brackets; the bracket a
//! round falls into decides the percentage of the total bet the house keeps.

use serde::{Deserialize, Serialize};

/// Per-card bets at or below this use the low-bet percentage
pub const LOW_BET_THRESHOLD: f64 = 30.0;

/// One player-count bracket of the win-cut table
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WinCutRule {
    pub min_cards: u32,
    pub max_cards: u32,
    pub percent_low_bet: f64,
    pub percent_high_bet: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WinCutError {
    #[error("bracket {min}..={max} is empty (min_cards > max_cards)")]
    EmptyBracket { min: u32, max: u32 },

    #[error("{field} must be within 0..=100, got {value}")]
    PercentOutOfRange { field: &'static str, value: f64 },
}

impl WinCutRule {
    pub fn matches(&self, registered_numbers: u32) -> bool {
        self.min_cards <= registered_numbers && registered_numbers <= self.max_cards
    }

    /// Percentage for a per-card bet
    pub fn percent_for(&self, bet_amount: f64) -> f64 {
        if bet_amount <= LOW_BET_THRESHOLD {
            self.percent_low_bet
        } else {
            self.percent_high_bet
        }
    }

    /// Boundary check applied when a rule is written
    pub fn validate(&self) -> Result<(), WinCutError> {
        if self.min_cards > self.max_cards {
            return Err(WinCutError::EmptyBracket {
                min: self.min_cards,
                max: self.max_cards,
            });
        }
        for (field, value) in [
            ("percentLowBet", self.percent_low_bet),
            ("percentHighBet", self.percent_high_bet),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(WinCutError::PercentOutOfRange { field, value });
            }
        }
        Ok(())
    }

    fn overlaps(&self, other: &WinCutRule) -> bool {
        self.min_cards <= other.max_cards && other.min_cards <= self.max_cards
    }
}

/// Win-cut percentage for a round; first matching bracket wins, 0 when none match
pub fn calculate_win_cut(registered_numbers: u32, bet_amount: f64, rules: &[WinCutRule]) -> f64 {
    rules
        .iter()
        .find(|rule| rule.matches(registered_numbers))
        .map(|rule| rule.percent_for(bet_amount))
        .unwrap_or(0.0)
}

/// Index pairs of brackets that overlap. Advisory only: lookup stays first-match.
pub fn find_overlaps(rules: &[WinCutRule]) -> Vec<(usize, usize)> {
    let mut overlaps = Vec::new();
    for (i, a) in rules.iter().enumerate() {
        for (j, b) in rules.iter().enumerate().skip(i + 1) {
            if a.overlaps(b) {
                overlaps.push((i, j));
            }
        }
    }
    overlaps
}
