//! Bingo Hall - pattern evaluation and hall settlement
//!
//! Evaluates 75-ball bingo cards against the hall's winning patterns and
//! settles each round's money through the admin -> agent -> cashier tree:
//! win-cut tiers, commission cascade, and debt-first wallet arithmetic.

pub mod api;
pub mod config;
pub mod errors;
pub mod games;
pub mod ledger;
pub mod metrics;
pub mod services;
pub mod settlement;

pub use config::{ConfigLoader, HallConfig};
pub use errors::{ConfigurationError, HallError, HallResult};
pub use games::{evaluate, BingoCard, CardId, CardRegistry, PatternKind, RoundState, WinResult};
pub use ledger::{BalanceStore, EntityAccount, EntityKind, InMemoryBalanceBook};
pub use metrics::MetricsRegistry;
pub use services::{HallService, SettleRoundRequest, SettlementOutcome, TopUpOutcome};
