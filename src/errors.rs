//! Error types for the bingo hall
//!
//! Each module owns a focused error enum; `HallError` wraps them so binaries
//! and the API can propagate any of them with `?`.

use crate::{
    games::{CardPoolError, RoundError},
    ledger::LedgerError,
    services::ServiceError,
};

/// Root error type for all hall operations
#[derive(Debug, thiserror::Error)]
pub enum HallError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Card pool error: {0}")]
    CardPool(#[from] CardPoolError),

    #[error("Round error: {0}")]
    Round(#[from] RoundError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration and validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),
}

pub type HallResult<T> = Result<T, HallError>;
