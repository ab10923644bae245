//! Ledger Store Errors
//!
//! Error types for store operations.

/// PostgreSQL `lock_not_available`, raised when `lock_timeout` expires
const LOCK_NOT_AVAILABLE: &str = "55P03";

/// Name of the unique constraint on `wallets.label`
const WALLET_LABEL_CONSTRAINT: &str = "wallets_label_key";

/// Errors that can occur in the ledger store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Wallet row does not exist
    #[error("Wallet not found: {0}")]
    WalletNotFound(i64),

    /// No transaction with this txid
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// Unique constraint on the wallet label was violated
    #[error("Wallet with label '{0}' already exists")]
    DuplicateLabel(String),

    /// Label is empty or too long
    #[error("Invalid label: {0}")]
    InvalidLabel(String),

    /// Waiting for a wallet row lock exceeded `lock_timeout`
    #[error("Timed out waiting for wallet lock")]
    LockTimeout,

    /// Database error
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    /// Classify a raw sqlx error. `label` is the label being written, if any.
    pub(crate) fn from_sqlx(err: sqlx::Error, label: Option<&str>) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(LOCK_NOT_AVAILABLE) {
                return StoreError::LockTimeout;
            }
            if db_err.is_unique_violation() && db_err.constraint() == Some(WALLET_LABEL_CONSTRAINT)
            {
                if let Some(label) = label {
                    return StoreError::DuplicateLabel(label.to_string());
                }
            }
        }
        StoreError::Database(err)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::from_sqlx(err, None)
    }
}
