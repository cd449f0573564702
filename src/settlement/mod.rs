//! Settlement Engine
//!
//! Win-cut tiers, the cashier -> agent -> admin commission cascade and
//! debt-first wallet arithmetic. Every function here is pure: callers read
//! balances, compute, and write the returned state back atomically.

pub mod commission;
pub mod wallet;
pub mod win_cut;

pub use commission::{
    calculate_round_financials, cascade_commissions, expected_revenue, CommissionSplit,
    ReportDraft, ReportStatus, RoundFinancials,
};
pub use wallet::{
    calculate_debt_first_payment, calculate_wallet_increase, validate_wallet_deduction,
    BalancePair, DebtFirstPayment, DeductionCheck, DeductionError, DeductionState, WalletError,
    WalletIncrease,
};
pub use win_cut::{calculate_win_cut, find_overlaps, WinCutError, WinCutRule, LOW_BET_THRESHOLD};
