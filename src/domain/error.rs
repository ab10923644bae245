//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;

use super::AmountError;

/// Domain-specific errors
///
/// These errors represent business rule violations and lookups of
/// entities that do not exist. They are independent of the web layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Referenced wallet does not exist
    #[error("Wallet not found: {0}")]
    WalletNotFound(i64),

    /// No transaction carries this txid
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// Withdrawal would drive the balance below zero
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        requested: Decimal,
        available: Decimal,
    },

    /// Amount is non-positive, malformed, or outside NUMERIC(18, 2)
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Another wallet already uses this label
    #[error("Wallet with label '{0}' already exists")]
    DuplicateLabel(String),
}

impl DomainError {
    /// Create an insufficient funds error
    pub fn insufficient_funds(requested: Decimal, available: Decimal) -> Self {
        Self::InsufficientFunds {
            requested,
            available,
        }
    }

    /// Check if this error names an entity that does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::WalletNotFound(_) | Self::TransactionNotFound(_)
        )
    }
}

impl From<AmountError> for DomainError {
    fn from(err: AmountError) -> Self {
        Self::InvalidAmount(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insufficient_funds_error() {
        let err = DomainError::insufficient_funds(dec!(100), dec!(50));

        assert!(!err.is_not_found());
        assert!(err.to_string().contains("100"));
        assert!(err.to_string().contains("50"));
    }

    #[test]
    fn test_not_found_errors() {
        assert!(DomainError::WalletNotFound(666).is_not_found());
        assert!(DomainError::TransactionNotFound("random_tx_id".into()).is_not_found());
        assert!(!DomainError::DuplicateLabel("savings".into()).is_not_found());
    }

    #[test]
    fn test_amount_error_becomes_invalid_amount() {
        let err: DomainError = AmountError::NotPositive(dec!(-1)).into();
        assert!(matches!(err, DomainError::InvalidAmount(ref msg) if msg.contains("positive")));
    }
}
