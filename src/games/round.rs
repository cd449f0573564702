//! Round State
//!
//! Everything one bingo round owns: registered cards, the called numbers,
//! confirmed winners and the cards locked out after a false claim. A round is
//! driven by whoever orchestrates the session; persisting it is the caller's
//! explicit side effect.

use crate::games::patterns;
use crate::games::types::{
    BingoCard, CallError, CalledNumbers, CardId, Cell, PatternKind, WinResult,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Lifecycle of a round
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoundPhase {
    Registering,
    Calling,
    Finished,
}

/// Extra payout for a win confirmed early in the round
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BonusRule {
    /// A win confirmed within this many calls earns the bonus
    pub max_calls: usize,
    pub amount: f64,
}

impl BonusRule {
    pub fn applies(&self, calls_made: usize) -> bool {
        calls_made > 0 && calls_made <= self.max_calls
    }
}

/// A confirmed winning card
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WinnerRecord {
    pub card_id: CardId,
    pub calls_at_win: usize,
    pub winning_cells: Vec<Cell>,
    pub bonus: f64,
    pub payout: f64,
}

/// Result of a "check card" request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum CheckOutcome {
    Winner { result: WinResult, bonus: f64 },
    /// Card already won earlier in this round
    AlreadyWon { result: WinResult },
    /// Losing claim; the card is now locked for the rest of the round
    NotWinner { result: WinResult },
    Blacklisted,
    NotRegistered,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoundError {
    #[error("round is {0:?}; cards can only be registered before the first call")]
    RegistrationClosed(RoundPhase),

    #[error("card {0} is already registered")]
    AlreadyRegistered(CardId),

    #[error("round is finished")]
    Finished,

    #[error(transparent)]
    Call(#[from] CallError),

    #[error("card {0} is not a winner of this round")]
    NotAWinner(CardId),

    #[error("invalid payout amount {0}")]
    InvalidPayout(String),
}

/// State of one bingo round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundState {
    id: Uuid,
    bet_amount: f64,
    pattern: PatternKind,
    bonus: Option<BonusRule>,
    phase: RoundPhase,
    registered: Vec<CardId>,
    called: CalledNumbers,
    winners: Vec<WinnerRecord>,
    blacklist: HashSet<CardId>,
    total_paid_out: f64,
}

impl RoundState {
    pub fn new(bet_amount: f64, pattern: PatternKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            bet_amount,
            pattern,
            bonus: None,
            phase: RoundPhase::Registering,
            registered: Vec::new(),
            called: CalledNumbers::new(),
            winners: Vec::new(),
            blacklist: HashSet::new(),
            total_paid_out: 0.0,
        }
    }

    pub fn with_bonus(mut self, bonus: BonusRule) -> Self {
        self.bonus = Some(bonus);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn pattern(&self) -> PatternKind {
        self.pattern
    }

    pub fn bet_amount(&self) -> f64 {
        self.bet_amount
    }

    pub fn called(&self) -> &CalledNumbers {
        &self.called
    }

    pub fn winners(&self) -> &[WinnerRecord] {
        &self.winners
    }

    pub fn is_blacklisted(&self, card: CardId) -> bool {
        self.blacklist.contains(&card)
    }

    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }

    pub fn registered(&self) -> &[CardId] {
        &self.registered
    }

    pub fn total_bet(&self) -> f64 {
        self.registered.len() as f64 * self.bet_amount
    }

    pub fn total_paid_out(&self) -> f64 {
        self.total_paid_out
    }

    /// House revenue so far: total bet less everything paid out
    pub fn revenue(&self) -> f64 {
        self.total_bet() - self.total_paid_out
    }

    pub fn register_card(&mut self, card: CardId) -> Result<(), RoundError> {
        if self.phase != RoundPhase::Registering {
            return Err(RoundError::RegistrationClosed(self.phase));
        }
        if self.registered.contains(&card) {
            return Err(RoundError::AlreadyRegistered(card));
        }
        self.registered.push(card);
        Ok(())
    }

    pub fn call_number(&mut self, number: u8) -> Result<(), RoundError> {
        if self.phase == RoundPhase::Finished {
            return Err(RoundError::Finished);
        }
        self.called.call(number)?;
        self.phase = RoundPhase::Calling;
        Ok(())
    }

    /// Draw a uniformly random uncalled number and call it
    pub fn draw_next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Option<u8>, RoundError> {
        if self.phase == RoundPhase::Finished {
            return Err(RoundError::Finished);
        }
        let remaining = self.called.remaining();
        if remaining.is_empty() {
            return Ok(None);
        }
        let number = remaining[rng.gen_range(0..remaining.len())];
        self.call_number(number)?;
        Ok(Some(number))
    }

    /// Check a claimed card against the round's pattern
    pub fn check_card(&mut self, card: &BingoCard) -> CheckOutcome {
        let id = card.id();
        if !self.registered.contains(&id) {
            return CheckOutcome::NotRegistered;
        }
        if self.blacklist.contains(&id) {
            return CheckOutcome::Blacklisted;
        }

        let result = patterns::evaluate(card, &self.called, self.pattern);
        if !result.is_winner {
            self.blacklist.insert(id);
            return CheckOutcome::NotWinner { result };
        }
        if self.winners.iter().any(|w| w.card_id == id) {
            return CheckOutcome::AlreadyWon { result };
        }

        let calls_at_win = self.called.len();
        let bonus = self
            .bonus
            .filter(|rule| rule.applies(calls_at_win))
            .map(|rule| rule.amount)
            .unwrap_or(0.0);
        self.winners.push(WinnerRecord {
            card_id: id,
            calls_at_win,
            winning_cells: result.winning_cells.clone(),
            bonus,
            payout: 0.0,
        });
        CheckOutcome::Winner { result, bonus }
    }

    /// Record the prize paid to a confirmed winner; any bonus is paid with it
    pub fn record_payout(&mut self, card: CardId, amount: f64) -> Result<f64, RoundError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(RoundError::InvalidPayout(amount.to_string()));
        }
        let winner = self
            .winners
            .iter_mut()
            .find(|w| w.card_id == card)
            .ok_or(RoundError::NotAWinner(card))?;

        let first_payment = winner.payout == 0.0;
        let paid = if first_payment { amount + winner.bonus } else { amount };
        winner.payout += paid;
        self.total_paid_out += paid;
        Ok(paid)
    }

    pub fn finish(&mut self) {
        self.phase = RoundPhase::Finished;
    }

    /// Start a fresh round with the same bet, pattern and bonus
    pub fn reset_for_next_round(&mut self) {
        self.id = Uuid::new_v4();
        self.phase = RoundPhase::Registering;
        self.registered.clear();
        self.called.reset();
        self.winners.clear();
        self.blacklist.clear();
        self.total_paid_out = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn card(id: u32) -> BingoCard {
        BingoCard::new(
            CardId(id),
            &[1, 2, 3, 4, 5],
            &[16, 17, 18, 19, 20],
            &[31, 32, 0, 34, 35],
            &[46, 47, 48, 49, 50],
            &[61, 62, 63, 64, 65],
        )
        .unwrap()
    }

    fn round_with(cards: &[u32]) -> RoundState {
        let mut round = RoundState::new(20.0, PatternKind::OneLine);
        for &id in cards {
            round.register_card(CardId(id)).unwrap();
        }
        round
    }

    #[test]
    fn test_registration_closes_after_first_call() {
        let mut round = round_with(&[1]);
        assert_eq!(round.register_card(CardId(1)), Err(RoundError::AlreadyRegistered(CardId(1))));
        round.call_number(7).unwrap();
        assert_eq!(round.phase(), RoundPhase::Calling);
        assert_eq!(
            round.register_card(CardId(2)),
            Err(RoundError::RegistrationClosed(RoundPhase::Calling))
        );
    }

    #[test]
    fn test_repeated_call_rejected() {
        let mut round = round_with(&[1]);
        round.call_number(7).unwrap();
        assert_eq!(round.call_number(7), Err(RoundError::Call(CallError::AlreadyCalled(7))));
    }

    #[test]
    fn test_false_claim_blacklists_card() {
        let mut round = round_with(&[1]);
        round.call_number(1).unwrap();
        assert!(matches!(round.check_card(&card(1)), CheckOutcome::NotWinner { .. }));
        assert!(round.is_blacklisted(CardId(1)));

        for n in 2..=5 {
            round.call_number(n).unwrap();
        }
        assert_eq!(round.check_card(&card(1)), CheckOutcome::Blacklisted);
    }

    #[test]
    fn test_unregistered_card() {
        let mut round = round_with(&[1]);
        assert_eq!(round.check_card(&card(9)), CheckOutcome::NotRegistered);
    }

    #[test]
    fn test_winner_and_revenue() {
        let mut round = round_with(&[1, 2, 3]).with_bonus(BonusRule { max_calls: 5, amount: 10.0 });
        for n in 1..=5 {
            round.call_number(n).unwrap();
        }

        match round.check_card(&card(1)) {
            CheckOutcome::Winner { result, bonus } => {
                assert!(result.is_winner);
                assert_eq!(bonus, 10.0);
            }
            other => panic!("expected winner, got {:?}", other),
        }
        assert!(matches!(round.check_card(&card(1)), CheckOutcome::AlreadyWon { .. }));

        assert_eq!(round.total_bet(), 60.0);
        assert_eq!(round.record_payout(CardId(1), 40.0).unwrap(), 50.0);
        assert_eq!(round.revenue(), 10.0);
        assert_eq!(round.record_payout(CardId(2), 1.0), Err(RoundError::NotAWinner(CardId(2))));
    }

    #[test]
    fn test_bonus_not_awarded_after_limit() {
        let mut round = round_with(&[1]).with_bonus(BonusRule { max_calls: 4, amount: 10.0 });
        for n in 1..=5 {
            round.call_number(n).unwrap();
        }
        assert!(matches!(round.check_card(&card(1)), CheckOutcome::Winner { bonus, .. } if bonus == 0.0));
    }

    #[test]
    fn test_draw_exhausts_all_numbers() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut round = round_with(&[1]);
        let mut drawn = HashSet::new();
        while let Some(n) = round.draw_next(&mut rng).unwrap() {
            assert!(drawn.insert(n));
        }
        assert_eq!(drawn.len(), 75);
    }

    #[test]
    fn test_finish_and_reset() {
        let mut round = round_with(&[1]);
        round.call_number(3).unwrap();
        let first_id = round.id();
        round.finish();
        assert_eq!(round.call_number(4), Err(RoundError::Finished));

        round.reset_for_next_round();
        assert_ne!(round.id(), first_id);
        assert_eq!(round.phase(), RoundPhase::Registering);
        assert!(round.called().is_empty());
        assert_eq!(round.registered_count(), 0);
    }
}
