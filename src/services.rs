//! Hall services
//!
//! Orchestrates the pure settlement functions against a balance store:
//! read fresh balances, compute, write back through the store's atomic
//! mutations.

use crate::{
    ledger::{BalanceStore, EntityAccount, EntityKind, LedgerError},
    metrics::MetricsRegistry,
    settlement::{
        calculate_round_financials, calculate_wallet_increase, calculate_win_cut,
        cascade_commissions, find_overlaps, DebtFirstPayment, DeductionState, ReportDraft,
        ReportStatus, WalletError, WalletIncrease,
    },
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("{funder} is not the parent of {recipient}")]
    NotParent { funder: String, recipient: String },

    #[error("account {id} is not a {expected:?}")]
    WrongKind { id: String, expected: EntityKind },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Outcome of funding a child account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopUpOutcome {
    pub recipient_id: String,
    pub increase: WalletIncrease,
    pub payment: DebtFirstPayment,
}

/// Round totals reported by the game layer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SettleRoundRequest {
    pub registered_numbers: u32,
    pub bet_amount: f64,
    /// Total bet less everything actually paid out
    pub revenue: f64,
}

impl SettleRoundRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        if !self.bet_amount.is_finite() || self.bet_amount < 0.0 {
            return Err(ServiceError::InvalidRequest(format!(
                "bet amount must be a non-negative number, got {}",
                self.bet_amount
            )));
        }
        if !self.revenue.is_finite() {
            return Err(ServiceError::InvalidRequest("revenue must be finite".to_string()));
        }
        // a loss round has no commission to cascade
        if self.revenue < 0.0 {
            return Err(ServiceError::InvalidRequest(format!(
                "revenue cannot be negative, got {}",
                self.revenue
            )));
        }
        Ok(())
    }
}

/// Financial result of settling one round
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SettlementOutcome {
    pub report: ReportDraft,
    pub cashier_deduction: DeductionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_payment: Option<DebtFirstPayment>,
    /// Index pairs of overlapping win-cut brackets on the cashier
    pub overlapping_rules: Vec<(usize, usize)>,
}

/// Settlement workflows over a balance store
pub struct HallService<S: BalanceStore> {
    store: Arc<S>,
    metrics: Arc<MetricsRegistry>,
}

impl<S: BalanceStore> HallService<S> {
    pub fn new(store: Arc<S>, metrics: Arc<MetricsRegistry>) -> Self {
        Self { store, metrics }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    async fn account_of_kind(&self, id: &str, expected: EntityKind) -> ServiceResult<EntityAccount> {
        let account = self.store.account(id).await?;
        if account.kind != expected {
            return Err(ServiceError::WrongKind {
                id: id.to_string(),
                expected,
            });
        }
        Ok(account)
    }

    /// Fund (or reduce) a child account on behalf of its parent.
    ///
    /// The funder states its own share; the recipient's credit is
    /// back-calculated from the recipient's commission percentage.
    pub async fn top_up(
        &self,
        funder_id: &str,
        recipient_id: &str,
        input_amount: f64,
    ) -> ServiceResult<TopUpOutcome> {
        let recipient = self.store.account(recipient_id).await?;
        if recipient.parent.as_deref() != Some(funder_id) {
            return Err(ServiceError::NotParent {
                funder: funder_id.to_string(),
                recipient: recipient_id.to_string(),
            });
        }

        let increase = calculate_wallet_increase(input_amount, recipient.commission_percent)?;
        let payment = self
            .store
            .apply_payment(recipient_id, increase.signed_amount())
            .await?;
        MetricsRegistry::incr(&self.metrics.top_ups_total);

        info!(
            funder = funder_id,
            recipient = recipient_id,
            ?increase,
            debt_paid = payment.debt_paid,
            wallet = payment.new_wallet_balance,
            debt = payment.new_debt_balance,
            "top-up applied"
        );
        Ok(TopUpOutcome {
            recipient_id: recipient_id.to_string(),
            increase,
            payment,
        })
    }

    /// Settle a finished round for a cashier.
    ///
    /// The cashier's wallet is charged the round revenue (auto-lock may
    /// refuse it); when applied, the agent's wallet is charged the agent
    /// commission debt-first. A negative revenue (payouts above the total
    /// bet) is rejected before any balance is touched.
    pub async fn settle_round(
        &self,
        cashier_id: &str,
        request: SettleRoundRequest,
    ) -> ServiceResult<SettlementOutcome> {
        request.validate()?;

        let cashier = self.account_of_kind(cashier_id, EntityKind::Cashier).await?;
        let agent_id = cashier.parent.clone().ok_or_else(|| LedgerError::InvalidParent {
            id: cashier_id.to_string(),
            expected: Some(EntityKind::Agent),
        })?;
        let agent = self.account_of_kind(&agent_id, EntityKind::Agent).await?;

        let overlapping_rules = find_overlaps(&cashier.win_cut_rules);
        if !overlapping_rules.is_empty() {
            warn!(
                cashier = cashier_id,
                ?overlapping_rules,
                "win-cut brackets overlap; first match applies"
            );
        }

        let win_cut = calculate_win_cut(
            request.registered_numbers,
            request.bet_amount,
            &cashier.win_cut_rules,
        );
        let financials = calculate_round_financials(
            request.registered_numbers,
            request.bet_amount,
            win_cut,
            request.revenue,
        );
        let split = cascade_commissions(
            financials.cashier_commission,
            cashier.commission_percent,
            agent.commission_percent,
        );
        debug!(cashier = cashier_id, ?financials, ?split, "round financials computed");

        let cashier_deduction = if financials.cashier_commission == 0.0 {
            DeductionState::Idle
        } else {
            self.store
                .apply_deduction(cashier_id, financials.cashier_commission)
                .await?
        };

        let (status, agent_payment) = match &cashier_deduction {
            DeductionState::Blocked { reason, .. } => {
                MetricsRegistry::incr(&self.metrics.settlements_blocked_total);
                warn!(cashier = cashier_id, reason = reason.as_str(), "settlement blocked");
                (ReportStatus::Blocked, None)
            }
            state => {
                if let DeductionState::Applied { debt_grew: true, payment, .. } = state {
                    MetricsRegistry::incr(&self.metrics.settlements_debt_grown_total);
                    warn!(
                        cashier = cashier_id,
                        debt = payment.new_debt_balance,
                        "insufficient balance; shortfall booked as debt"
                    );
                }
                let agent_payment = if split.agent_commission != 0.0 {
                    Some(self.store.apply_payment(&agent_id, -split.agent_commission).await?)
                } else {
                    None
                };
                (ReportStatus::Settled, agent_payment)
            }
        };

        MetricsRegistry::incr(&self.metrics.settlements_total);
        let report = ReportDraft::from_round(cashier_id, &financials, &split, status);
        info!(
            cashier = cashier_id,
            report = %report.id,
            status = ?report.status,
            revenue = report.revenue,
            agent_commission = report.agent_commission,
            admin_commission = report.admin_commission,
            "round settled"
        );

        Ok(SettlementOutcome {
            report,
            cashier_deduction,
            agent_payment,
            overlapping_rules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryBalanceBook;
    use crate::settlement::{BalancePair, WinCutRule};

    async fn service() -> HallService<InMemoryBalanceBook> {
        let book = InMemoryBalanceBook::new();
        book.upsert(EntityAccount::new("admin", EntityKind::Admin, None))
            .await
            .unwrap();
        book.upsert(
            EntityAccount::new("agent", EntityKind::Agent, Some("admin"))
                .with_commission_percent(20.0)
                .with_balances(100.0, 0.0),
        )
        .await
        .unwrap();
        book.upsert(
            EntityAccount::new("cashier", EntityKind::Cashier, Some("agent"))
                .with_commission_percent(50.0)
                .with_balances(40.0, 10.0)
                .with_win_cut_rules(vec![WinCutRule {
                    min_cards: 5,
                    max_cards: 15,
                    percent_low_bet: 30.0,
                    percent_high_bet: 10.0,
                }]),
        )
        .await
        .unwrap();
        HallService::new(Arc::new(book), Arc::new(MetricsRegistry::new()))
    }

    #[tokio::test]
    async fn test_top_up_back_calculates_and_pays_debt() {
        let service = service().await;
        let outcome = service.top_up("agent", "cashier", 25.0).await.unwrap();
        assert_eq!(outcome.increase, WalletIncrease::Credit(50.0));
        assert_eq!(outcome.payment.debt_paid, 10.0);
        assert_eq!(
            service.store().account("cashier").await.unwrap().balances,
            BalancePair::new(80.0, 0.0)
        );
    }

    #[tokio::test]
    async fn test_top_up_requires_parent() {
        let service = service().await;
        assert!(matches!(
            service.top_up("admin", "cashier", 25.0).await,
            Err(ServiceError::NotParent { .. })
        ));
    }

    #[tokio::test]
    async fn test_reduction_is_exact() {
        let service = service().await;
        let outcome = service.top_up("agent", "cashier", -15.0).await.unwrap();
        assert_eq!(outcome.increase, WalletIncrease::Reduction(15.0));
        assert_eq!(
            service.store().account("cashier").await.unwrap().balances,
            BalancePair::new(25.0, 10.0)
        );
    }

    #[tokio::test]
    async fn test_settle_round_cascades() {
        let service = service().await;
        let request = SettleRoundRequest {
            registered_numbers: 12,
            bet_amount: 20.0,
            revenue: 30.0,
        };
        let outcome = service.settle_round("cashier", request).await.unwrap();

        assert_eq!(outcome.report.status, ReportStatus::Settled);
        assert_eq!(outcome.report.total_bet, 240.0);
        assert_eq!(outcome.report.applied_win_cut_percent, 30.0);
        assert_eq!(outcome.report.cashier_commission, 30.0);
        assert_eq!(outcome.report.agent_commission, 15.0);
        assert_eq!(outcome.report.admin_commission, 3.0);

        assert_eq!(
            service.store().account("cashier").await.unwrap().balances,
            BalancePair::new(10.0, 10.0)
        );
        assert_eq!(
            service.store().account("agent").await.unwrap().balances,
            BalancePair::new(85.0, 0.0)
        );
    }

    #[tokio::test]
    async fn test_settle_round_blocked_by_auto_lock() {
        let service = service().await;
        let mut cashier = service.store().account("cashier").await.unwrap();
        cashier.auto_lock = true;
        service.store().upsert(cashier).await.unwrap();

        let request = SettleRoundRequest {
            registered_numbers: 12,
            bet_amount: 20.0,
            revenue: 100.0,
        };
        let outcome = service.settle_round("cashier", request).await.unwrap();
        assert_eq!(outcome.report.status, ReportStatus::Blocked);
        assert!(outcome.agent_payment.is_none());
        assert_eq!(
            service.store().account("agent").await.unwrap().balances,
            BalancePair::new(100.0, 0.0)
        );
    }

    #[tokio::test]
    async fn test_settle_round_rejects_loss_round() {
        let service = service().await;
        let request = SettleRoundRequest {
            registered_numbers: 12,
            bet_amount: 20.0,
            revenue: -40.0,
        };
        assert!(matches!(
            service.settle_round("cashier", request).await,
            Err(ServiceError::InvalidRequest(_))
        ));
        assert_eq!(
            service.store().account("cashier").await.unwrap().balances,
            BalancePair::new(40.0, 10.0)
        );
        assert_eq!(
            service.store().account("agent").await.unwrap().balances,
            BalancePair::new(100.0, 0.0)
        );
    }

    #[tokio::test]
    async fn test_settle_round_rejects_non_cashier() {
        let service = service().await;
        let request = SettleRoundRequest {
            registered_numbers: 1,
            bet_amount: 1.0,
            revenue: 1.0,
        };
        assert!(matches!(
            service.settle_round("agent", request).await,
            Err(ServiceError::WrongKind { .. })
        ));
    }
}
