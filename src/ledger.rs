//! Balance ledger
//!
//! Storage seam for the admin -> agent -> cashier ownership tree. Each
//! mutation reads, computes and writes one entity's balances as a single
//! step, so two settlements against the same cashier apply one at a time.

use crate::settlement::{
    calculate_debt_first_payment, BalancePair, DebtFirstPayment, DeductionError, DeductionState,
    WinCutError, WinCutRule,
};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Tier of an account in the ownership tree
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Admin,
    Agent,
    Cashier,
}

impl EntityKind {
    /// Kind an account of this tier must hang under
    pub fn parent_kind(self) -> Option<EntityKind> {
        match self {
            EntityKind::Admin => None,
            EntityKind::Agent => Some(EntityKind::Admin),
            EntityKind::Cashier => Some(EntityKind::Agent),
        }
    }
}

/// Persisted account fields the settlement core depends on
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntityAccount {
    pub id: String,
    pub kind: EntityKind,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub balances: BalancePair,
    /// Share of this entity's commission passed to its parent
    /// (agent percentage on a cashier, admin percentage on an agent)
    #[serde(default)]
    pub commission_percent: f64,
    #[serde(default)]
    pub auto_lock: bool,
    #[serde(default)]
    pub win_cut_rules: Vec<WinCutRule>,
}

impl EntityAccount {
    pub fn new(id: impl Into<String>, kind: EntityKind, parent: Option<&str>) -> Self {
        Self {
            id: id.into(),
            kind,
            parent: parent.map(str::to_string),
            balances: BalancePair::default(),
            commission_percent: 0.0,
            auto_lock: false,
            win_cut_rules: Vec::new(),
        }
    }

    pub fn with_balances(mut self, wallet: f64, debt: f64) -> Self {
        self.balances = BalancePair::new(wallet, debt);
        self
    }

    pub fn with_commission_percent(mut self, percent: f64) -> Self {
        self.commission_percent = percent;
        self
    }

    pub fn with_auto_lock(mut self, auto_lock: bool) -> Self {
        self.auto_lock = auto_lock;
        self
    }

    pub fn with_win_cut_rules(mut self, rules: Vec<WinCutRule>) -> Self {
        self.win_cut_rules = rules;
        self
    }

    fn validate(&self) -> Result<(), LedgerError> {
        if self.id.trim().is_empty() {
            return Err(LedgerError::InvalidAccount("id cannot be empty".to_string()));
        }
        if self.parent.as_deref() == Some(self.id.as_str()) {
            return Err(LedgerError::InvalidAccount(format!(
                "{} cannot be its own parent",
                self.id
            )));
        }
        if !(0.0..=100.0).contains(&self.commission_percent) {
            return Err(LedgerError::InvalidAccount(format!(
                "commission percent must be within 0..=100, got {}",
                self.commission_percent
            )));
        }
        let BalancePair {
            wallet_balance,
            debt_balance,
        } = self.balances;
        if wallet_balance < 0.0 || debt_balance < 0.0 {
            return Err(LedgerError::InvalidAccount(
                "wallet and debt balances cannot be negative".to_string(),
            ));
        }
        if self.kind != EntityKind::Cashier && !self.win_cut_rules.is_empty() {
            return Err(LedgerError::InvalidAccount(
                "only cashiers own win-cut rules".to_string(),
            ));
        }
        for rule in &self.win_cut_rules {
            rule.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("account not found: {0}")]
    NotFound(String),

    #[error("account {id} must have a {expected:?} parent")]
    InvalidParent { id: String, expected: Option<EntityKind> },

    #[error("invalid account: {0}")]
    InvalidAccount(String),

    #[error(transparent)]
    WinCut(#[from] WinCutError),

    #[error(transparent)]
    Deduction(#[from] DeductionError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Balance storage used by the settlement services
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Fresh copy of an account
    async fn account(&self, id: &str) -> LedgerResult<EntityAccount>;

    /// Create or overwrite an account (administrative override)
    async fn upsert(&self, account: EntityAccount) -> LedgerResult<()>;

    /// Apply a signed amount debt-first
    async fn apply_payment(&self, id: &str, amount: f64) -> LedgerResult<DebtFirstPayment>;

    /// Run the deduction state machine against the stored balances and the
    /// account's auto-lock flag; balances are written only when applied
    async fn apply_deduction(&self, id: &str, required: f64) -> LedgerResult<DeductionState>;
}

/// In-memory store; a mutation holds the entry lock for its whole read-modify-write
#[derive(Debug, Clone, Default)]
pub struct InMemoryBalanceBook {
    accounts: Arc<DashMap<String, EntityAccount>>,
}

impl InMemoryBalanceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl BalanceStore for InMemoryBalanceBook {
    async fn account(&self, id: &str) -> LedgerResult<EntityAccount> {
        self.accounts
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))
    }

    async fn upsert(&self, account: EntityAccount) -> LedgerResult<()> {
        account.validate()?;

        let expected = account.kind.parent_kind();
        let parent_kind = match &account.parent {
            Some(parent) => Some(
                self.accounts
                    .get(parent)
                    .map(|entry| entry.kind)
                    .ok_or_else(|| LedgerError::NotFound(parent.clone()))?,
            ),
            None => None,
        };
        if parent_kind != expected {
            return Err(LedgerError::InvalidParent {
                id: account.id,
                expected,
            });
        }

        let previous_kind = self.accounts.get(&account.id).map(|entry| entry.kind);
        if previous_kind.is_some_and(|kind| kind != account.kind) {
            let children = self
                .accounts
                .iter()
                .filter(|entry| entry.parent.as_deref() == Some(account.id.as_str()))
                .count();
            if children > 0 {
                return Err(LedgerError::InvalidAccount(format!(
                    "cannot change kind of {} while {} account(s) hang under it",
                    account.id, children
                )));
            }
        }

        self.accounts.insert(account.id.clone(), account);
        Ok(())
    }

    async fn apply_payment(&self, id: &str, amount: f64) -> LedgerResult<DebtFirstPayment> {
        let mut entry = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        let balances = entry.balances;
        let payment =
            calculate_debt_first_payment(amount, balances.debt_balance, balances.wallet_balance);
        entry.balances = payment.balances();
        Ok(payment)
    }

    async fn apply_deduction(&self, id: &str, required: f64) -> LedgerResult<DeductionState> {
        let mut entry = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        let state = DeductionState::Idle
            .begin(required)?
            .resolve(entry.balances, entry.auto_lock)?;
        if let DeductionState::Applied { payment, .. } = &state {
            entry.balances = payment.balances();
        }
        Ok(state)
    }
}
