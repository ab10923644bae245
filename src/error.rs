//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::DomainError;
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Server errors (5xx)
    #[error("Timed out waiting for wallet lock")]
    LockTimeout,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::WalletNotFound(id) => DomainError::WalletNotFound(id).into(),
            StoreError::TransactionNotFound(txid) => DomainError::TransactionNotFound(txid).into(),
            StoreError::DuplicateLabel(label) => DomainError::DuplicateLabel(label).into(),
            StoreError::InvalidLabel(msg) => AppError::InvalidRequest(msg),
            StoreError::LockTimeout => AppError::LockTimeout,
            StoreError::Database(e) => AppError::Database(e),
        }
    }
}

impl AppError {
    /// Stable machine-readable code for this condition
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::Domain(domain_err) => match domain_err {
                DomainError::WalletNotFound(_) => "wallet_not_found",
                DomainError::TransactionNotFound(_) => "transaction_not_found",
                DomainError::InsufficientFunds { .. } => "insufficient_funds",
                DomainError::InvalidAmount(_) => "invalid_amount",
                DomainError::DuplicateLabel(_) => "duplicate_label",
            },
            AppError::LockTimeout => "lock_timeout",
            AppError::Database(_) => "database_error",
            AppError::Migration(_) => "migration_error",
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "config_error",
        }
    }

    /// HTTP status for this condition
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Domain(domain_err) if domain_err.is_not_found() => StatusCode::NOT_FOUND,
            AppError::Domain(_) => StatusCode::BAD_REQUEST,
            AppError::LockTimeout => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Internal(_)
            | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        let details = match &self {
            AppError::InvalidRequest(msg) => Some(msg.clone()),
            AppError::Domain(domain_err) => match domain_err {
                DomainError::WalletNotFound(id) => Some(id.to_string()),
                DomainError::TransactionNotFound(txid) => Some(txid.clone()),
                DomainError::InvalidAmount(msg) => Some(msg.clone()),
                DomainError::DuplicateLabel(label) => Some(label.clone()),
                DomainError::InsufficientFunds { .. } => Some(domain_err.to_string()),
            },
            AppError::LockTimeout => {
                tracing::warn!("Wallet lock wait timed out");
                None
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                None
            }
            AppError::Migration(e) => {
                tracing::error!("Migration error: {:?}", e);
                None
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                None
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                None
            }
        };

        // Server-side failures never leak their message to clients
        let error = if status.is_server_error() {
            status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error,
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_not_found_maps_to_404() {
        let err: AppError = StoreError::WalletNotFound(666).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), "wallet_not_found");

        let err: AppError = StoreError::TransactionNotFound("random_tx_id".into()).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), "transaction_not_found");
    }

    #[test]
    fn test_client_errors_map_to_400() {
        let err = AppError::Domain(DomainError::insufficient_funds(dec!(90), dec!(0)));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "insufficient_funds");

        let err: AppError = StoreError::DuplicateLabel("test_wallet_0".into()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "duplicate_label");

        let err: AppError = StoreError::InvalidLabel("label must not be empty".into()).into();
        assert_eq!(err.error_code(), "invalid_request");
    }

    #[test]
    fn test_lock_timeout_is_retryable_server_condition() {
        let err: AppError = StoreError::LockTimeout.into();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.error_code(), "lock_timeout");
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::Internal("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = AppError::Domain(DomainError::WalletNotFound(777)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
