//! Route Definitions

use super::handlers::*;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .route("/health", get(health_handler))
        // Pure engines
        .route("/patterns/evaluate", post(evaluate_handler))
        .route("/settlement/win-cut", post(win_cut_handler))
        .route("/settlement/commissions", post(commissions_handler))
        .route("/settlement/round-financials", post(round_financials_handler))
        .route("/wallet/increase", post(wallet_increase_handler))
        .route("/wallet/debt-first", post(debt_first_handler))
        .route("/wallet/validate-deduction", post(validate_deduction_handler))
        // Ledger-backed workflows
        .route(
            "/accounts/:id",
            get(get_account_handler).put(put_account_handler),
        )
        .route("/accounts/:id/top-up", post(top_up_handler))
        .route("/cashiers/:id/settle-round", post(settle_round_handler))
        // Live round
        .route("/round", get(round_handler))
        .route("/round/cards", post(register_card_handler))
        .route("/round/call", post(call_number_handler))
        .route("/round/check", post(check_card_handler))
        .route("/round/payout", post(payout_handler))
        .route("/round/finish", post(finish_round_handler))
        .route("/round/next", post(next_round_handler));

    let router = if state.metrics_enabled {
        router.route("/metrics", get(metrics_handler))
    } else {
        router
    };
    router.with_state(state)
}
