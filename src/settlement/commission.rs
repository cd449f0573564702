//! Round financials and the commission cascade
//!
//! Round revenue flows up the ownership tree: the cashier's commission is the
//! round revenue, the agent takes a share of that, the admin a share of the
//! agent's share.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Financial outcome of one round
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoundFinancials {
    pub registered_numbers: u32,
    pub bet_amount: f64,
    pub total_bet: f64,
    pub revenue: f64,
    /// Recorded for audit; not used to derive the commission
    pub applied_win_cut_percent: f64,
    pub cashier_commission: f64,
}

/// Build a round's financials.
///
/// The cashier's commission is the revenue reported by the game layer
/// (total bet less everything actually paid out), taken verbatim. Bonus and
/// jackpot payouts make it diverge from the static tier percentage.
pub fn calculate_round_financials(
    registered_numbers: u32,
    bet_amount: f64,
    win_cut_percent: f64,
    revenue: f64,
) -> RoundFinancials {
    RoundFinancials {
        registered_numbers,
        bet_amount,
        total_bet: registered_numbers as f64 * bet_amount,
        revenue,
        applied_win_cut_percent: win_cut_percent,
        cashier_commission: revenue,
    }
}

/// Revenue the tier table alone would predict
pub fn expected_revenue(total_bet: f64, win_cut_percent: f64) -> f64 {
    total_bet * win_cut_percent / 100.0
}

/// Commission owed to each tier for one round
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommissionSplit {
    pub cashier_commission: f64,
    pub agent_commission: f64,
    pub admin_commission: f64,
}

pub fn cascade_commissions(
    cashier_commission: f64,
    agent_percent: f64,
    admin_percent: f64,
) -> CommissionSplit {
    let agent_commission = cashier_commission * agent_percent / 100.0;
    let admin_commission = agent_commission * admin_percent / 100.0;
    CommissionSplit {
        cashier_commission,
        agent_commission,
        admin_commission,
    }
}

/// Report lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Settled,
    /// Settlement refused: auto-lock on and balance insufficient
    Blocked,
}

/// Point-in-time snapshot handed to the persistence layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportDraft {
    pub id: Uuid,
    pub cashier_id: String,
    pub total_bet: f64,
    pub revenue: f64,
    pub bet_amount: f64,
    pub registered_numbers: u32,
    pub cashier_commission: f64,
    pub agent_commission: f64,
    pub admin_commission: f64,
    pub applied_win_cut_percent: f64,
    pub date: DateTime<Utc>,
    pub status: ReportStatus,
}

impl ReportDraft {
    pub fn from_round(
        cashier_id: impl Into<String>,
        financials: &RoundFinancials,
        split: &CommissionSplit,
        status: ReportStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            cashier_id: cashier_id.into(),
            total_bet: financials.total_bet,
            revenue: financials.revenue,
            bet_amount: financials.bet_amount,
            registered_numbers: financials.registered_numbers,
            cashier_commission: split.cashier_commission,
            agent_commission: split.agent_commission,
            admin_commission: split.admin_commission,
            applied_win_cut_percent: financials.applied_win_cut_percent,
            date: Utc::now(),
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revenue_taken_verbatim() {
        let financials = calculate_round_financials(12, 20.0, 30.0, 50.0);
        assert_eq!(financials.total_bet, 240.0);
        assert_eq!(financials.cashier_commission, 50.0);
        assert_eq!(financials.applied_win_cut_percent, 30.0);
        assert_eq!(expected_revenue(financials.total_bet, 30.0), 72.0);
    }

    #[test]
    fn test_cascade() {
        let split = cascade_commissions(200.0, 25.0, 40.0);
        assert_eq!(split.cashier_commission, 200.0);
        assert_eq!(split.agent_commission, 50.0);
        assert_eq!(split.admin_commission, 20.0);
    }

    #[test]
    fn test_cascade_zero_percentages() {
        let split = cascade_commissions(200.0, 0.0, 40.0);
        assert_eq!(split.agent_commission, 0.0);
        assert_eq!(split.admin_commission, 0.0);
    }

    #[test]
    fn test_report_snapshot() {
        let financials = calculate_round_financials(10, 10.0, 20.0, 20.0);
        let split = cascade_commissions(financials.cashier_commission, 50.0, 10.0);
        let report = ReportDraft::from_round("cashier-1", &financials, &split, ReportStatus::Settled);

        assert_eq!(report.cashier_id, "cashier-1");
        assert_eq!(report.total_bet, 100.0);
        assert_eq!(report.agent_commission, 10.0);
        assert_eq!(report.admin_commission, 1.0);
        assert_eq!(report.status, ReportStatus::Settled);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["appliedWinCutPercent"], 20.0);
        assert_eq!(json["status"], "settled");
    }
}
