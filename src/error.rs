use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::ledger::models::Chain;

/// Top-level error type for the entire application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Verification failed: {0}")]
    Verification(#[from] VerificationError),

    #[error("Reconciliation failed: {0}")]
    Reconciliation(#[from] ReconciliationError),

    #[error("Upstream unavailable: {0}")]
    Upstream(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// On-chain confirmation could not be obtained.
///
/// Distinct from [`AppError::Validation`] so callers can tell
/// "try again later" apart from "fix your input". The core never
/// retries these automatically.
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Chain {0} is not supported for receipt verification")]
    UnsupportedChain(String),

    #[error("Transaction {tx_ref} not confirmed on {chain:?}")]
    NotConfirmed { chain: Chain, tx_ref: String },
}

/// The atomic ledger update could not complete. Guaranteed to leave
/// no partial mutation behind: the wrapping transaction is rolled back.
#[derive(Error, Debug)]
pub enum ReconciliationError {
    #[error("Pool not found: {0}")]
    PoolNotFound(Uuid),

    #[error("Ledger storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// API error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg,
                None,
            ),
            AppError::Verification(VerificationError::UnsupportedChain(chain)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VERIFICATION_FAILED",
                format!("Chain {} is not supported for receipt verification", chain),
                Some(serde_json::json!({"chain": chain})),
            ),
            AppError::Verification(VerificationError::NotConfirmed { chain, tx_ref }) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VERIFICATION_FAILED",
                format!("Transaction {} not confirmed on {:?}", tx_ref, chain),
                Some(serde_json::json!({"chain": chain, "tx_ref": tx_ref})),
            ),
            AppError::Reconciliation(ReconciliationError::PoolNotFound(id)) => (
                StatusCode::NOT_FOUND,
                "POOL_NOT_FOUND",
                format!("Pool not found: {}", id),
                None,
            ),
            AppError::Reconciliation(ReconciliationError::Storage(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "RECONCILIATION_FAILED",
                "Ledger update failed and was rolled back".to_string(),
                None,
            ),
            AppError::Upstream(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "UPSTREAM_UNAVAILABLE",
                msg,
                None,
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                msg,
                None,
            ),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "A database error occurred".to_string(),
                None,
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: message,
            error_code: error_code.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal(format!("Error converting: {:?}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        AppError::Upstream(format!("HTTP request error: {:?}", error))
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        AppError::Internal(format!("Migration error: {:?}", error))
    }
}

impl From<rust_decimal::Error> for AppError {
    fn from(error: rust_decimal::Error) -> Self {
        AppError::Validation(format!("Decimal conversion error: {:?}", error))
    }
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn validation_maps_to_bad_request() {
        assert_eq!(
            status_of(AppError::Validation("missing field".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn verification_maps_to_unprocessable() {
        assert_eq!(
            status_of(VerificationError::UnsupportedChain("dogecoin".into()).into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(
                VerificationError::NotConfirmed {
                    chain: Chain::Solana,
                    tx_ref: "abc".into(),
                }
                .into()
            ),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn missing_pool_maps_to_not_found() {
        assert_eq!(
            status_of(ReconciliationError::PoolNotFound(Uuid::nil()).into()),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn upstream_maps_to_service_unavailable() {
        assert_eq!(
            status_of(AppError::Upstream("quote api down".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
