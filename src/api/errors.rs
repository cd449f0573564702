//! API Error Handling
//!
//! Structured error responses with proper HTTP status codes and request tracking.

use crate::{
    games::RoundError,
    ledger::LedgerError,
    services::ServiceError,
    settlement::{DeductionError, WalletError},
};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level API error response with request tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub request_id: String,
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// NOT_FOUND, BAD_REQUEST, UNPROCESSABLE or INTERNAL_ERROR
    pub code: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub request_id: String,
}

#[derive(Debug)]
pub enum ApiErrorKind {
    NotFound(String),
    BadRequest(String),
    /// Well-formed request refused by a business rule
    Unprocessable(String),
    InternalError(String),
}

impl ApiError {
    pub fn not_found(request_id: String, message: String) -> Self {
        Self {
            kind: ApiErrorKind::NotFound(message),
            request_id,
        }
    }

    pub fn bad_request(request_id: String, message: String) -> Self {
        Self {
            kind: ApiErrorKind::BadRequest(message),
            request_id,
        }
    }

    pub fn unprocessable(request_id: String, message: String) -> Self {
        Self {
            kind: ApiErrorKind::Unprocessable(message),
            request_id,
        }
    }

    pub fn internal_error(request_id: String, message: String) -> Self {
        Self {
            kind: ApiErrorKind::InternalError(message),
            request_id,
        }
    }

    pub fn from_wallet(request_id: String, error: WalletError) -> Self {
        Self::bad_request(request_id, error.to_string())
    }

    pub fn from_ledger(request_id: String, error: LedgerError) -> Self {
        let message = error.to_string();
        match error {
            LedgerError::NotFound(_) => Self::not_found(request_id, message),
            LedgerError::Deduction(DeductionError::ZeroAmount)
            | LedgerError::InvalidParent { .. }
            | LedgerError::InvalidAccount(_)
            | LedgerError::WinCut(_) => Self::bad_request(request_id, message),
            LedgerError::Deduction(_) => Self::unprocessable(request_id, message),
        }
    }

    pub fn from_service(request_id: String, error: ServiceError) -> Self {
        match error {
            ServiceError::Ledger(e) => Self::from_ledger(request_id, e),
            ServiceError::Wallet(e) => Self::from_wallet(request_id, e),
            e @ ServiceError::NotParent { .. } => Self::unprocessable(request_id, e.to_string()),
            e @ (ServiceError::WrongKind { .. } | ServiceError::InvalidRequest(_)) => {
                Self::bad_request(request_id, e.to_string())
            }
        }
    }

    pub fn from_round(request_id: String, error: RoundError) -> Self {
        let message = error.to_string();
        match error {
            RoundError::InvalidPayout(_) | RoundError::Call(_) => {
                Self::bad_request(request_id, message)
            }
            _ => Self::unprocessable(request_id, message),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ApiErrorKind::NotFound(msg) => write!(f, "[{}] Not Found: {}", self.request_id, msg),
            ApiErrorKind::BadRequest(msg) => write!(f, "[{}] Bad Request: {}", self.request_id, msg),
            ApiErrorKind::Unprocessable(msg) => {
                write!(f, "[{}] Unprocessable: {}", self.request_id, msg)
            }
            ApiErrorKind::InternalError(msg) => {
                write!(f, "[{}] Internal Error: {}", self.request_id, msg)
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self.kind {
            ApiErrorKind::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiErrorKind::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiErrorKind::Unprocessable(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "UNPROCESSABLE", msg)
            }
            ApiErrorKind::InternalError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
        };

        let body = Json(ErrorResponse {
            request_id: self.request_id,
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}
