//! Request Handlers
//!
//! Thin adapters: decode the typed request, call the engines or services,
//! map failures onto `ApiError`.

use super::{errors::ApiError, extract::ApiJson, middleware::RequestId, models::*};
use crate::{
    config::HallConfig,
    games::{patterns, BingoCard, CardRegistry, CheckOutcome, RoundState},
    ledger::{BalanceStore, EntityAccount, InMemoryBalanceBook},
    metrics::MetricsRegistry,
    services::{HallService, SettleRoundRequest, SettlementOutcome, TopUpOutcome},
    settlement::{
        calculate_debt_first_payment, calculate_round_financials, calculate_wallet_increase,
        calculate_win_cut, cascade_commissions, expected_revenue, find_overlaps, CommissionSplit,
        DebtFirstPayment, DeductionCheck,
    },
};
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Shared application state
pub struct AppState {
    pub service: HallService<InMemoryBalanceBook>,
    pub cards: CardRegistry,
    pub round: Mutex<RoundState>,
    pub metrics: Arc<MetricsRegistry>,
    /// Serve `/metrics` and count HTTP traffic
    pub metrics_enabled: bool,
    pub default_auto_lock: bool,
    pub version: String,
}

impl AppState {
    pub fn new(
        config: &HallConfig,
        cards: CardRegistry,
        store: Arc<InMemoryBalanceBook>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        let mut round = RoundState::new(config.game.bet_amount, config.game.default_pattern);
        if let Some(bonus) = config.game.bonus {
            round = round.with_bonus(bonus);
        }
        Self {
            service: HallService::new(store, metrics.clone()),
            cards,
            round: Mutex::new(round),
            metrics,
            metrics_enabled: config.monitoring.enable_metrics,
            default_auto_lock: config.settlement.default_auto_lock,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
        version: state.version.clone(),
        cards_loaded: state.cards.len(),
        uptime_seconds: state.metrics.uptime_seconds(),
    })
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.to_prometheus_format(),
    )
}

/// POST /patterns/evaluate
pub async fn evaluate_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, ApiError> {
    let card = match (request.card, request.card_id) {
        (Some(layout), _) => BingoCard::try_from(layout)
            .map_err(|e| ApiError::bad_request(request_id.0.clone(), e.to_string()))?,
        (None, Some(id)) => state
            .cards
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(request_id.0.clone(), format!("card {} not found", id)))?,
        (None, None) => {
            return Err(ApiError::bad_request(
                request_id.0,
                "either cardId or card is required".to_string(),
            ))
        }
    };

    let result = patterns::evaluate(&card, &request.called_numbers, request.pattern);
    let completed_shapes = patterns::completed_kinds(&card, &request.called_numbers);
    state.metrics.record_card_check(result.is_winner);
    debug!(card = %card.id(), pattern = %request.pattern, winner = result.is_winner, "card evaluated");

    Ok(Json(EvaluateResponse {
        card_id: card.id(),
        pattern: request.pattern,
        is_winner: result.is_winner,
        winning_cells: result.winning_cells,
        completed_shapes,
    }))
}

/// POST /settlement/win-cut
pub async fn win_cut_handler(ApiJson(request): ApiJson<WinCutRequest>) -> Json<WinCutResponse> {
    Json(WinCutResponse {
        win_cut_percent: calculate_win_cut(
            request.registered_numbers,
            request.bet_amount,
            &request.rules,
        ),
        overlapping_rules: find_overlaps(&request.rules),
    })
}

/// POST /settlement/commissions
pub async fn commissions_handler(ApiJson(request): ApiJson<CommissionsRequest>) -> Json<CommissionSplit> {
    Json(cascade_commissions(
        request.cashier_commission,
        request.agent_percent,
        request.admin_percent,
    ))
}

/// POST /settlement/round-financials
pub async fn round_financials_handler(
    ApiJson(request): ApiJson<RoundFinancialsRequest>,
) -> Json<RoundFinancialsResponse> {
    let financials = calculate_round_financials(
        request.registered_numbers,
        request.bet_amount,
        request.win_cut_percent,
        request.revenue,
    );
    Json(RoundFinancialsResponse {
        expected_revenue: expected_revenue(financials.total_bet, request.win_cut_percent),
        financials,
    })
}

/// POST /wallet/increase
pub async fn wallet_increase_handler(
    Extension(request_id): Extension<RequestId>,
    ApiJson(request): ApiJson<WalletIncreaseRequest>,
) -> Result<Json<WalletIncreaseResponse>, ApiError> {
    let increase = calculate_wallet_increase(request.input_amount, request.percentage)
        .map_err(|e| ApiError::from_wallet(request_id.0, e))?;
    Ok(Json(WalletIncreaseResponse {
        signed_amount: increase.signed_amount(),
        increase,
    }))
}

/// POST /wallet/debt-first
pub async fn debt_first_handler(ApiJson(request): ApiJson<DebtFirstRequest>) -> Json<DebtFirstPayment> {
    Json(calculate_debt_first_payment(
        request.amount,
        request.current_debt,
        request.current_wallet,
    ))
}

/// POST /wallet/validate-deduction
pub async fn validate_deduction_handler(
    ApiJson(request): ApiJson<ValidateDeductionRequest>,
) -> Json<DeductionCheck> {
    Json(DeductionCheck::evaluate(
        request.current_balance,
        request.required_amount,
        request.auto_lock,
    ))
}

/// PUT /accounts/:id
pub async fn put_account_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<AccountRequest>,
) -> Result<Json<EntityAccount>, ApiError> {
    let account = EntityAccount::new(id.as_str(), request.kind, request.parent.as_deref())
        .with_balances(request.wallet_balance, request.debt_balance)
        .with_commission_percent(request.commission_percent)
        .with_auto_lock(request.auto_lock.unwrap_or(state.default_auto_lock))
        .with_win_cut_rules(request.win_cut_rules);

    let store = state.service.store();
    store
        .upsert(account)
        .await
        .map_err(|e| ApiError::from_ledger(request_id.0.clone(), e))?;
    info!(account = id.as_str(), kind = ?request.kind, "account stored");

    let stored = store
        .account(&id)
        .await
        .map_err(|e| ApiError::from_ledger(request_id.0, e))?;
    Ok(Json(stored))
}

/// GET /accounts/:id
pub async fn get_account_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<EntityAccount>, ApiError> {
    let account = state
        .service
        .store()
        .account(&id)
        .await
        .map_err(|e| ApiError::from_ledger(request_id.0, e))?;
    Ok(Json(account))
}

/// POST /accounts/:id/top-up
pub async fn top_up_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<TopUpRequest>,
) -> Result<Json<TopUpOutcome>, ApiError> {
    let outcome = state
        .service
        .top_up(&request.funder_id, &id, request.amount)
        .await
        .map_err(|e| ApiError::from_service(request_id.0, e))?;
    Ok(Json(outcome))
}

/// POST /cashiers/:id/settle-round
pub async fn settle_round_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<SettleRoundRequest>,
) -> Result<Json<SettlementOutcome>, ApiError> {
    let outcome = state
        .service
        .settle_round(&id, request)
        .await
        .map_err(|e| ApiError::from_service(request_id.0, e))?;
    Ok(Json(outcome))
}

/// GET /round
pub async fn round_handler(State(state): State<Arc<AppState>>) -> Json<RoundSnapshot> {
    let round = state.round.lock().await;
    Json(RoundSnapshot::from(&*round))
}

/// POST /round/cards
pub async fn register_card_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RegisterCardRequest>,
) -> Result<Json<RoundSnapshot>, ApiError> {
    if !state.cards.contains(request.card_id) {
        return Err(ApiError::not_found(
            request_id.0,
            format!("card {} not found", request.card_id),
        ));
    }
    let mut round = state.round.lock().await;
    round
        .register_card(request.card_id)
        .map_err(|e| ApiError::from_round(request_id.0, e))?;
    Ok(Json(RoundSnapshot::from(&*round)))
}

/// POST /round/call
pub async fn call_number_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<CallNumberRequest>,
) -> Result<Json<CallNumberResponse>, ApiError> {
    let mut round = state.round.lock().await;
    let number = match request.number {
        Some(number) => round.call_number(number).map(|_| Some(number)),
        None => {
            let mut rng = rand::thread_rng();
            round.draw_next(&mut rng)
        }
    }
    .map_err(|e| ApiError::from_round(request_id.0, e))?;

    Ok(Json(CallNumberResponse {
        number,
        calls_made: round.called().len(),
    }))
}

/// POST /round/check
pub async fn check_card_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<CheckCardRequest>,
) -> Result<Json<CheckOutcome>, ApiError> {
    let card = state.cards.get(request.card_id).ok_or_else(|| {
        ApiError::not_found(request_id.0, format!("card {} not found", request.card_id))
    })?;

    let outcome = state.round.lock().await.check_card(card);
    state
        .metrics
        .record_card_check(matches!(outcome, CheckOutcome::Winner { .. }));
    info!(card = %request.card_id, ?outcome, "card checked");
    Ok(Json(outcome))
}

/// POST /round/payout
pub async fn payout_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<PayoutRequest>,
) -> Result<Json<PayoutResponse>, ApiError> {
    let mut round = state.round.lock().await;
    let paid = round
        .record_payout(request.card_id, request.amount)
        .map_err(|e| ApiError::from_round(request_id.0, e))?;
    Ok(Json(PayoutResponse {
        card_id: request.card_id,
        paid,
        total_paid_out: round.total_paid_out(),
    }))
}

/// POST /round/finish
pub async fn finish_round_handler(State(state): State<Arc<AppState>>) -> Json<RoundSnapshot> {
    let mut round = state.round.lock().await;
    round.finish();
    info!(round = %round.id(), revenue = round.revenue(), "round finished");
    Json(RoundSnapshot::from(&*round))
}

/// POST /round/next
pub async fn next_round_handler(State(state): State<Arc<AppState>>) -> Json<RoundSnapshot> {
    let mut round = state.round.lock().await;
    round.reset_for_next_round();
    Json(RoundSnapshot::from(&*round))
}
