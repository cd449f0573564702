//! API Request and Response Models

use crate::{
    games::{CardId, CardLayout, Cell, PatternKind, RoundPhase, RoundState, ShapeKind, WinnerRecord},
    ledger::EntityKind,
    settlement::{RoundFinancials, WalletIncrease, WinCutRule},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub cards_loaded: usize,
    pub uptime_seconds: u64,
}

/// Evaluate a pooled card (`cardId`) or an inline layout (`card`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    #[serde(default)]
    pub card_id: Option<CardId>,
    #[serde(default)]
    pub card: Option<CardLayout>,
    pub called_numbers: Vec<u8>,
    pub pattern: PatternKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
    pub card_id: CardId,
    pub pattern: PatternKind,
    pub is_winner: bool,
    pub winning_cells: Vec<Cell>,
    pub completed_shapes: Vec<ShapeKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinCutRequest {
    pub registered_numbers: u32,
    pub bet_amount: f64,
    pub rules: Vec<WinCutRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinCutResponse {
    pub win_cut_percent: f64,
    pub overlapping_rules: Vec<(usize, usize)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionsRequest {
    pub cashier_commission: f64,
    pub agent_percent: f64,
    pub admin_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundFinancialsRequest {
    pub registered_numbers: u32,
    pub bet_amount: f64,
    pub win_cut_percent: f64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundFinancialsResponse {
    #[serde(flatten)]
    pub financials: RoundFinancials,
    /// What the tier percentage alone would have produced
    pub expected_revenue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletIncreaseRequest {
    pub input_amount: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletIncreaseResponse {
    pub increase: WalletIncrease,
    pub signed_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtFirstRequest {
    pub amount: f64,
    pub current_debt: f64,
    pub current_wallet: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateDeductionRequest {
    pub current_balance: f64,
    pub required_amount: f64,
    #[serde(default)]
    pub auto_lock: bool,
}

/// Body of `PUT /accounts/:id`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRequest {
    pub kind: EntityKind,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub wallet_balance: f64,
    #[serde(default)]
    pub debt_balance: f64,
    #[serde(default)]
    pub commission_percent: f64,
    /// Falls back to the configured default
    #[serde(default)]
    pub auto_lock: Option<bool>,
    #[serde(default)]
    pub win_cut_rules: Vec<WinCutRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUpRequest {
    pub funder_id: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCardRequest {
    pub card_id: CardId,
}

/// Call `number`, or draw a random uncalled one when absent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallNumberRequest {
    #[serde(default)]
    pub number: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallNumberResponse {
    /// None once every number has been called
    pub number: Option<u8>,
    pub calls_made: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckCardRequest {
    pub card_id: CardId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutRequest {
    pub card_id: CardId,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutResponse {
    pub card_id: CardId,
    /// Prize plus any bonus paid with it
    pub paid: f64,
    pub total_paid_out: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSnapshot {
    pub id: Uuid,
    pub phase: RoundPhase,
    pub pattern: PatternKind,
    pub bet_amount: f64,
    pub registered_cards: Vec<CardId>,
    pub called_numbers: Vec<u8>,
    pub winners: Vec<WinnerRecord>,
    pub total_bet: f64,
    pub total_paid_out: f64,
    pub revenue: f64,
}

impl From<&RoundState> for RoundSnapshot {
    fn from(round: &RoundState) -> Self {
        Self {
            id: round.id(),
            phase: round.phase(),
            pattern: round.pattern(),
            bet_amount: round.bet_amount(),
            registered_cards: round.registered().to_vec(),
            called_numbers: round.called().as_slice().to_vec(),
            winners: round.winners().to_vec(),
            total_bet: round.total_bet(),
            total_paid_out: round.total_paid_out(),
            revenue: round.revenue(),
        }
    }
}
