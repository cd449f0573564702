//! API Server
//!
//! Builds the shared state from configuration, wraps the router in the
//! middleware stack and serves it until a shutdown signal arrives.

use super::{
    handlers::AppState,
    middleware::{create_cors_layer, metrics_middleware, request_id_middleware},
    routes::create_router,
};
use crate::{
    config::{ApiConfig, HallConfig},
    errors::HallResult,
    ledger::InMemoryBalanceBook,
    metrics::MetricsRegistry,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

/// Install the global tracing subscriber; `RUST_LOG` wins over the configured level
pub fn init_tracing(config: &HallConfig) {
    let default_filter = format!(
        "bingohall={level},bingohall_api={level},tower_http=info",
        level = config.monitoring.log_level.as_str()
    );
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .try_init();
}

/// Wrap the router in request tracking, CORS, timeout and tracing layers;
/// HTTP counting is skipped when metrics are disabled
pub fn build_app(state: Arc<AppState>, api: &ApiConfig) -> axum::Router {
    let metrics = state.metrics_enabled.then(|| state.metrics.clone());
    let router = create_router(state);
    let router = match metrics {
        Some(metrics) => {
            router.layer(axum::middleware::from_fn_with_state(metrics, metrics_middleware))
        }
        None => router,
    };
    router
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(create_cors_layer(api.allowed_origins.clone()))
        .layer(TimeoutLayer::new(Duration::from_secs(api.request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
}

pub struct ApiServer {
    config: HallConfig,
    store: Arc<InMemoryBalanceBook>,
}

impl ApiServer {
    /// Serve on a pre-populated balance book
    pub fn with_store(config: HallConfig, store: Arc<InMemoryBalanceBook>) -> Self {
        Self { config, store }
    }

    pub async fn run(self) -> HallResult<()> {
        init_tracing(&self.config);

        let cards = self.config.game.load_cards()?;
        if cards.is_empty() {
            warn!("card pool is empty; card checks will all be rejected");
        }
        let metrics = Arc::new(MetricsRegistry::new());
        let state = Arc::new(AppState::new(&self.config, cards, self.store.clone(), metrics));
        let app = build_app(state.clone(), &self.config.api);

        let addr = self.socket_addr()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        self.log_server_info(addr, state.cards.len());

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("API server stopped gracefully");
        Ok(())
    }

    fn socket_addr(&self) -> HallResult<SocketAddr> {
        let ip = self.config.api.host.parse::<std::net::IpAddr>().map_err(|e| {
            crate::errors::ConfigurationError::InvalidValue {
                field: "api.host".to_string(),
                value: self.config.api.host.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(SocketAddr::from((ip, self.config.api.port)))
    }

    fn log_server_info(&self, addr: SocketAddr, cards: usize) {
        info!("Bingo hall API listening on http://{}", addr);
        info!("   Cards loaded: {}", cards);
        info!("   Default pattern: {}", self.config.game.default_pattern);
        info!("   Bet amount: {}", self.config.game.bet_amount);
        info!("   Default auto-lock: {}", self.config.settlement.default_auto_lock);
        info!("   CORS: {:?}", self.config.api.allowed_origins);
        info!("   Request timeout: {}s", self.config.api.request_timeout_secs);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
