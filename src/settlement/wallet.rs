//! Wallet and debt arithmetic
//!
//! Every balance mutation goes through debt-first application: incoming funds
//! clear outstanding debt before they reach the wallet, and reductions that
//! the wallet cannot cover turn into debt.

use serde::{Deserialize, Serialize};

/// Wallet and debt owned by one agent or cashier
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BalancePair {
    pub wallet_balance: f64,
    pub debt_balance: f64,
}

impl BalancePair {
    pub fn new(wallet_balance: f64, debt_balance: f64) -> Self {
        Self {
            wallet_balance,
            debt_balance,
        }
    }

    /// Apply a signed amount debt-first and return the full outcome
    pub fn apply(&mut self, amount: f64) -> DebtFirstPayment {
        let payment = calculate_debt_first_payment(amount, self.debt_balance, self.wallet_balance);
        *self = payment.balances();
        payment
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WalletError {
    #[error("percentage must be greater than 0 and at most 100, got {0}")]
    InvalidPercentage(f64),

    #[error("amount must be a finite number, got {0}")]
    InvalidAmount(f64),
}

/// Wallet change produced by a top-up request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "amount", rename_all = "lowercase")]
pub enum WalletIncrease {
    /// Back-calculated credit for the recipient
    Credit(f64),
    /// Exact debit, no percentage math
    Reduction(f64),
}

impl WalletIncrease {
    /// Signed amount ready for debt-first application
    pub fn signed_amount(&self) -> f64 {
        match *self {
            WalletIncrease::Credit(amount) => amount,
            WalletIncrease::Reduction(amount) => -amount,
        }
    }
}

/// Recipient wallet change for a funder's stated share.
///
/// A non-negative input is the funder's own commission share; the credit is
/// `input / (percentage / 100)`. A negative input debits exactly `|input|`.
/// The percentage must lie in (0, 100] for every input.
pub fn calculate_wallet_increase(
    input_amount: f64,
    percentage: f64,
) -> Result<WalletIncrease, WalletError> {
    if !percentage.is_finite() || percentage <= 0.0 || percentage > 100.0 {
        return Err(WalletError::InvalidPercentage(percentage));
    }
    if !input_amount.is_finite() {
        return Err(WalletError::InvalidAmount(input_amount));
    }

    if input_amount < 0.0 {
        Ok(WalletIncrease::Reduction(input_amount.abs()))
    } else {
        Ok(WalletIncrease::Credit(input_amount / (percentage / 100.0)))
    }
}

/// Outcome of a debt-first application
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DebtFirstPayment {
    pub new_wallet_balance: f64,
    pub new_debt_balance: f64,
    pub debt_paid: f64,
    /// Wallet delta actually applied; negative for reductions
    pub wallet_added: f64,
}

impl DebtFirstPayment {
    pub fn balances(&self) -> BalancePair {
        BalancePair::new(self.new_wallet_balance, self.new_debt_balance)
    }
}

pub fn calculate_debt_first_payment(
    amount: f64,
    current_debt: f64,
    current_wallet: f64,
) -> DebtFirstPayment {
    if amount < 0.0 {
        let reduction = amount.abs();
        if current_wallet >= reduction {
            return DebtFirstPayment {
                new_wallet_balance: current_wallet - reduction,
                new_debt_balance: current_debt,
                debt_paid: 0.0,
                wallet_added: -reduction,
            };
        }
        // wallet floors at zero, the shortfall becomes debt
        let absorbed = current_wallet.max(0.0);
        return DebtFirstPayment {
            new_wallet_balance: 0.0,
            new_debt_balance: current_debt + (reduction - absorbed),
            debt_paid: 0.0,
            wallet_added: -absorbed,
        };
    }

    if current_debt > 0.0 {
        if amount >= current_debt {
            let remainder = amount - current_debt;
            DebtFirstPayment {
                new_wallet_balance: current_wallet + remainder,
                new_debt_balance: 0.0,
                debt_paid: current_debt,
                wallet_added: remainder,
            }
        } else {
            DebtFirstPayment {
                new_wallet_balance: current_wallet,
                new_debt_balance: current_debt - amount,
                debt_paid: amount,
                wallet_added: 0.0,
            }
        }
    } else {
        DebtFirstPayment {
            new_wallet_balance: current_wallet + amount,
            new_debt_balance: current_debt,
            debt_paid: 0.0,
            wallet_added: amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeductionError {
    #[error("Amount cannot be zero")]
    ZeroAmount,

    #[error("insufficient balance: {balance} available, {required} required")]
    InsufficientBalance { balance: f64, required: f64 },

    #[error("cannot {action} a deduction in state {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },
}

/// Result of checking whether a deduction may proceed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeductionCheck {
    pub is_valid: bool,
    pub remaining_balance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Check a deduction against a wallet balance.
///
/// Only auto-locked entities are refused on a shortfall; otherwise the
/// remaining balance may go negative and the caller routes it into debt.
pub fn validate_wallet_deduction(
    current_balance: f64,
    required_amount: f64,
    auto_lock: bool,
) -> Result<f64, DeductionError> {
    if required_amount == 0.0 {
        return Err(DeductionError::ZeroAmount);
    }
    if required_amount > 0.0 && current_balance < required_amount && auto_lock {
        return Err(DeductionError::InsufficientBalance {
            balance: current_balance,
            required: required_amount,
        });
    }
    Ok(current_balance - required_amount)
}

impl DeductionCheck {
    pub fn evaluate(current_balance: f64, required_amount: f64, auto_lock: bool) -> Self {
        match validate_wallet_deduction(current_balance, required_amount, auto_lock) {
            Ok(remaining_balance) => Self {
                is_valid: true,
                remaining_balance,
                error: None,
            },
            Err(e) => Self {
                is_valid: false,
                remaining_balance: current_balance,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Per-round wallet lifecycle: `Idle -> PendingDeduction -> Applied | Blocked`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum DeductionState {
    Idle,
    PendingDeduction {
        required: f64,
    },
    Applied {
        required: f64,
        payment: DebtFirstPayment,
        /// The shortfall was booked as new debt; surface a warning to the operator
        debt_grew: bool,
    },
    Blocked {
        required: f64,
        reason: String,
    },
}

impl DeductionState {
    fn name(&self) -> &'static str {
        match self {
            DeductionState::Idle => "idle",
            DeductionState::PendingDeduction { .. } => "pendingDeduction",
            DeductionState::Applied { .. } => "applied",
            DeductionState::Blocked { .. } => "blocked",
        }
    }

    pub fn begin(self, required: f64) -> Result<Self, DeductionError> {
        match self {
            DeductionState::Idle => {
                if required == 0.0 {
                    return Err(DeductionError::ZeroAmount);
                }
                Ok(DeductionState::PendingDeduction { required })
            }
            other => Err(DeductionError::InvalidTransition {
                state: other.name(),
                action: "begin",
            }),
        }
    }

    /// Settle a pending deduction against freshly read balances
    pub fn resolve(self, balances: BalancePair, auto_lock: bool) -> Result<Self, DeductionError> {
        let required = match self {
            DeductionState::PendingDeduction { required } => required,
            other => {
                return Err(DeductionError::InvalidTransition {
                    state: other.name(),
                    action: "resolve",
                })
            }
        };

        match validate_wallet_deduction(balances.wallet_balance, required, auto_lock) {
            Ok(_) => {
                let payment = calculate_debt_first_payment(
                    -required,
                    balances.debt_balance,
                    balances.wallet_balance,
                );
                Ok(DeductionState::Applied {
                    required,
                    debt_grew: payment.new_debt_balance > balances.debt_balance,
                    payment,
                })
            }
            Err(DeductionError::InsufficientBalance { .. }) => Ok(DeductionState::Blocked {
                required,
                reason: "cannot start game, insufficient balance".to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DeductionState::Applied { .. } | DeductionState::Blocked { .. })
    }
}

impl Default for DeductionState {
    fn default() -> Self {
        DeductionState::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_pays_debt_first() {
        let payment = calculate_debt_first_payment(100.0, 30.0, 50.0);
        assert_eq!(
            payment,
            DebtFirstPayment {
                new_wallet_balance: 120.0,
                new_debt_balance: 0.0,
                debt_paid: 30.0,
                wallet_added: 70.0,
            }
        );
    }

    #[test]
    fn test_credit_smaller_than_debt() {
        let payment = calculate_debt_first_payment(20.0, 30.0, 50.0);
        assert_eq!(payment.new_debt_balance, 10.0);
        assert_eq!(payment.new_wallet_balance, 50.0);
        assert_eq!(payment.debt_paid, 20.0);
        assert_eq!(payment.wallet_added, 0.0);
    }

    #[test]
    fn test_credit_without_debt() {
        let payment = calculate_debt_first_payment(40.0, 0.0, 10.0);
        assert_eq!(payment.new_wallet_balance, 50.0);
        assert_eq!(payment.debt_paid, 0.0);
        assert_eq!(payment.wallet_added, 40.0);
    }

    #[test]
    fn test_reduction_beyond_wallet_becomes_debt() {
        let payment = calculate_debt_first_payment(-40.0, 0.0, 30.0);
        assert_eq!(payment.new_wallet_balance, 0.0);
        assert_eq!(payment.new_debt_balance, 10.0);
        assert_eq!(payment.wallet_added, -30.0);
        assert_eq!(payment.debt_paid, 0.0);
    }

    #[test]
    fn test_reduction_within_wallet() {
        let payment = calculate_debt_first_payment(-20.0, 5.0, 30.0);
        assert_eq!(payment.new_wallet_balance, 10.0);
        assert_eq!(payment.new_debt_balance, 5.0);
        assert_eq!(payment.wallet_added, -20.0);
    }

    #[test]
    fn test_balance_pair_apply() {
        let mut pair = BalancePair::new(50.0, 30.0);
        pair.apply(100.0);
        assert_eq!(pair, BalancePair::new(120.0, 0.0));
        pair.apply(-130.0);
        assert_eq!(pair, BalancePair::new(0.0, 10.0));
    }

    #[test]
    fn test_wallet_increase_back_calculates() {
        assert_eq!(calculate_wallet_increase(25.0, 25.0), Ok(WalletIncrease::Credit(100.0)));
        assert_eq!(calculate_wallet_increase(0.0, 50.0), Ok(WalletIncrease::Credit(0.0)));
    }

    #[test]
    fn test_wallet_reduction_is_exact() {
        let increase = calculate_wallet_increase(-75.0, 20.0).unwrap();
        assert_eq!(increase, WalletIncrease::Reduction(75.0));
        assert_eq!(increase.signed_amount(), -75.0);
    }

    #[test]
    fn test_wallet_increase_rejects_bad_percentage() {
        for pct in [0.0, -5.0, 100.5, f64::NAN] {
            assert!(calculate_wallet_increase(10.0, pct).is_err());
            assert!(calculate_wallet_increase(-10.0, pct).is_err());
        }
        assert!(calculate_wallet_increase(10.0, 100.0).is_ok());
    }

    #[test]
    fn test_deduction_zero_is_invalid() {
        let check = DeductionCheck::evaluate(100.0, 0.0, false);
        assert!(!check.is_valid);
        assert_eq!(check.error.as_deref(), Some("Amount cannot be zero"));
    }

    #[test]
    fn test_deduction_blocked_only_with_auto_lock() {
        assert!(!DeductionCheck::evaluate(10.0, 50.0, true).is_valid);

        let allowed = DeductionCheck::evaluate(10.0, 50.0, false);
        assert!(allowed.is_valid);
        assert_eq!(allowed.remaining_balance, -40.0);
    }

    #[test]
    fn test_negative_requirement_is_credit() {
        let check = DeductionCheck::evaluate(10.0, -5.0, true);
        assert!(check.is_valid);
        assert_eq!(check.remaining_balance, 15.0);
    }

    #[test]
    fn test_state_machine_applied_with_debt() {
        let state = DeductionState::Idle.begin(50.0).unwrap();
        let state = state.resolve(BalancePair::new(20.0, 0.0), false).unwrap();
        match state {
            DeductionState::Applied { payment, debt_grew, .. } => {
                assert!(debt_grew);
                assert_eq!(payment.balances(), BalancePair::new(0.0, 30.0));
            }
            other => panic!("expected applied, got {:?}", other),
        }
    }

    #[test]
    fn test_state_machine_blocked() {
        let state = DeductionState::Idle
            .begin(50.0)
            .and_then(|s| s.resolve(BalancePair::new(20.0, 0.0), true))
            .unwrap();
        assert!(matches!(state, DeductionState::Blocked { .. }));
        assert!(state.is_terminal());
    }

    #[test]
    fn test_state_machine_rejects_out_of_order() {
        assert!(matches!(
            DeductionState::Idle.resolve(BalancePair::default(), true),
            Err(DeductionError::InvalidTransition { state: "idle", .. })
        ));
        assert_eq!(DeductionState::Idle.begin(0.0), Err(DeductionError::ZeroAmount));
    }
}
