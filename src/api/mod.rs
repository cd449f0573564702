//! Bingo Hall HTTP API
//!
//! JSON endpoints over the pattern engine, the settlement engine and the
//! balance ledger.

pub mod errors;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use handlers::AppState;
pub use server::{build_app, init_tracing, ApiServer};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::HallConfig, games::CardRegistry, ledger::InMemoryBalanceBook, MetricsRegistry};
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        app_with(HallConfig::development())
    }

    fn app_with(config: HallConfig) -> Router {
        let cards = CardRegistry::generate(5, 1);
        let state = Arc::new(AppState::new(
            &config,
            cards,
            Arc::new(InMemoryBalanceBook::new()),
            Arc::new(MetricsRegistry::new()),
        ));
        build_app(state, &config.api)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health_echoes_request_id() {
        let app = app();
        let request = Request::builder()
            .uri("/health")
            .header("x-request-id", "req-42")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-request-id"], "req-42");
    }

    #[tokio::test]
    async fn test_evaluate_inline_card() {
        let app = app();
        let body = json!({
            "card": {
                "id": 9,
                "B": [1, 2, 3, 4, 5],
                "I": [16, 17, 18, 19, 20],
                "N": [31, 32, 0, 34, 35],
                "G": [46, 47, 48, 49, 50],
                "O": [61, 62, 63, 64, 65]
            },
            "calledNumbers": [1, 2, 3, 4, 5],
            "pattern": "1line"
        });
        let (status, value) = send(&app, Method::POST, "/patterns/evaluate", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["isWinner"], true);
        assert_eq!(value["winningCells"].as_array().unwrap().len(), 5);
        assert_eq!(value["completedShapes"], json!(["horizontal"]));
    }

    #[tokio::test]
    async fn test_evaluate_unknown_card_is_not_found() {
        let app = app();
        let body = json!({ "cardId": 999, "calledNumbers": [], "pattern": "x" });
        let (status, value) = send(&app, Method::POST, "/patterns/evaluate", Some(body)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(value["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_wallet_increase_rejects_bad_percentage() {
        let app = app();
        let body = json!({ "inputAmount": 10.0, "percentage": 0.0 });
        let (status, value) = send(&app, Method::POST, "/wallet/increase", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_account_settlement_flow() {
        let app = app();
        let accounts = [
            ("admin", json!({ "kind": "admin" })),
            ("agent", json!({ "kind": "agent", "parent": "admin", "walletBalance": 100.0, "commissionPercent": 10.0 })),
            ("cashier", json!({ "kind": "cashier", "parent": "agent", "walletBalance": 20.0, "commissionPercent": 50.0, "autoLock": true })),
        ];
        for (id, body) in accounts {
            let (status, _) = send(&app, Method::PUT, &format!("/accounts/{}", id), Some(body)).await;
            assert_eq!(status, StatusCode::OK);
        }

        let request = json!({ "registeredNumbers": 10, "betAmount": 10.0, "revenue": 50.0 });
        let (status, value) =
            send(&app, Method::POST, "/cashiers/cashier/settle-round", Some(request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["report"]["status"], "blocked");

        let (status, value) = send(
            &app,
            Method::POST,
            "/accounts/cashier/top-up",
            Some(json!({ "funderId": "agent", "amount": 20.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["payment"]["newWalletBalance"], 60.0);

        let request = json!({ "registeredNumbers": 10, "betAmount": 10.0, "revenue": 50.0 });
        let (_, value) =
            send(&app, Method::POST, "/cashiers/cashier/settle-round", Some(request)).await;
        assert_eq!(value["report"]["status"], "settled");
        assert_eq!(value["report"]["agentCommission"], 25.0);

        let (_, value) = send(&app, Method::GET, "/accounts/agent", None).await;
        assert_eq!(value["balances"]["walletBalance"], 75.0);
    }

    #[tokio::test]
    async fn test_top_up_by_non_parent_is_unprocessable() {
        let app = app();
        send(&app, Method::PUT, "/accounts/admin", Some(json!({ "kind": "admin" }))).await;
        send(
            &app,
            Method::PUT,
            "/accounts/agent",
            Some(json!({ "kind": "agent", "parent": "admin", "commissionPercent": 10.0 })),
        )
        .await;
        let (status, value) = send(
            &app,
            Method::POST,
            "/accounts/agent/top-up",
            Some(json!({ "funderId": "someone-else", "amount": 5.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(value["error"]["code"], "UNPROCESSABLE");
    }

    #[tokio::test]
    async fn test_round_false_claim_locks_card() {
        let app = app();
        let (status, _) =
            send(&app, Method::POST, "/round/cards", Some(json!({ "cardId": 1 }))).await;
        assert_eq!(status, StatusCode::OK);

        let (_, value) = send(&app, Method::POST, "/round/call", Some(json!({}))).await;
        assert_eq!(value["callsMade"], 1);

        let (_, value) = send(&app, Method::POST, "/round/check", Some(json!({ "cardId": 1 }))).await;
        assert_eq!(value["outcome"], "notWinner");
        let (_, value) = send(&app, Method::POST, "/round/check", Some(json!({ "cardId": 1 }))).await;
        assert_eq!(value["outcome"], "blacklisted");

        let (status, _) =
            send(&app, Method::POST, "/round/cards", Some(json!({ "cardId": 2 }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_metrics_count_requests() {
        let app = app();
        send(&app, Method::GET, "/accounts/missing", None).await;
        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("bingohall_http_errors_total 1"));
    }

    #[tokio::test]
    async fn test_metrics_disabled_hides_endpoint() {
        let mut config = HallConfig::development();
        config.monitoring.enable_metrics = false;
        let app = app_with(config);

        let (status, _) = send(&app, Method::GET, "/metrics", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_body_gets_error_envelope() {
        let app = app();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/round/call")
            .header("content-type", "application/json")
            .header("x-request-id", "req-7")
            .body(Body::from(json!({ "number": 300 }).to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()["x-request-id"], "req-7");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["request_id"], "req-7");
        assert_eq!(value["error"]["code"], "BAD_REQUEST");

        let (status, value) = send(&app, Method::POST, "/wallet/increase", Some(json!("nope"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["error"]["code"], "BAD_REQUEST");
    }
}
