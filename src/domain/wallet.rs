//! Wallet and Transaction entities
//!
//! Rows of the `wallets` and `transactions` tables, plus the pure balance
//! rules applied while a wallet row is locked.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{Amount, Balance, DomainError};

/// Maximum label length (matches VARCHAR(255))
pub const MAX_LABEL_LEN: usize = 255;

/// A wallet row
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Wallet {
    pub id: i64,
    pub label: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Current balance as a validated domain value
    pub fn balance(&self) -> Result<Balance, DomainError> {
        Ok(Balance::new(self.balance)?)
    }

    /// Balance after depositing `amount`
    pub fn plan_deposit(&self, amount: &Amount) -> Result<Balance, DomainError> {
        Ok(self.balance()?.credit(amount)?)
    }

    /// Balance after withdrawing `amount`.
    ///
    /// Withdrawing down to exactly zero is allowed; anything below is
    /// `InsufficientFunds`.
    pub fn plan_withdrawal(&self, amount: &Amount) -> Result<Balance, DomainError> {
        let balance = self.balance()?;
        if !balance.is_sufficient_for(amount) {
            return Err(DomainError::insufficient_funds(
                amount.value(),
                balance.value(),
            ));
        }
        Ok(balance.debit(amount)?)
    }
}

/// An immutable transaction log entry
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Transaction {
    pub id: i64,
    pub txid: Uuid,
    pub wallet_id: i64,
    /// Signed: positive for deposits, negative for withdrawals
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_deposit(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

/// Validate and normalize a wallet label
pub fn normalize_label(label: &str) -> Result<String, String> {
    let label = label.trim();
    if label.is_empty() {
        return Err("label must not be empty".to_string());
    }
    if label.chars().count() > MAX_LABEL_LEN {
        return Err(format!("label must be at most {} characters", MAX_LABEL_LEN));
    }
    Ok(label.to_string())
}

/// Parse a public txid. Strings that are not UUIDs cannot name a transaction.
pub fn parse_txid(txid: &str) -> Option<Uuid> {
    Uuid::parse_str(txid.trim()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn wallet_with_balance(balance: Decimal) -> Wallet {
        let now = Utc::now();
        Wallet {
            id: 1,
            label: "test_wallet".to_string(),
            balance,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_plan_deposit() {
        let wallet = wallet_with_balance(dec!(0.00));
        let amount = Amount::new(dec!(100)).unwrap();

        let balance = wallet.plan_deposit(&amount).unwrap();
        assert_eq!(balance.value(), dec!(100.00));
    }

    #[test]
    fn test_plan_withdrawal_ok() {
        let wallet = wallet_with_balance(dec!(100.00));
        let amount = Amount::new(dec!(50)).unwrap();

        assert_eq!(wallet.plan_withdrawal(&amount).unwrap().value(), dec!(50.00));
    }

    #[test]
    fn test_plan_withdrawal_to_zero_allowed() {
        let wallet = wallet_with_balance(dec!(50.00));
        let amount = Amount::new(dec!(50)).unwrap();

        assert_eq!(wallet.plan_withdrawal(&amount).unwrap(), Balance::zero());
    }

    #[test]
    fn test_plan_withdrawal_insufficient() {
        let wallet = wallet_with_balance(dec!(0.00));
        let amount = Amount::new(dec!(50)).unwrap();

        match wallet.plan_withdrawal(&amount) {
            Err(DomainError::InsufficientFunds {
                requested,
                available,
            }) => {
                assert_eq!(requested, dec!(50));
                assert_eq!(available, dec!(0));
            }
            other => panic!("Expected InsufficientFunds, got: {:?}", other),
        }
    }

    #[test]
    fn test_plan_deposit_overflow_is_invalid_amount() {
        let wallet = wallet_with_balance(dec!(9999999999999999.99));
        let amount = Amount::new(dec!(1)).unwrap();

        assert!(matches!(
            wallet.plan_deposit(&amount),
            Err(DomainError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_transaction_sign() {
        let tx = Transaction {
            id: 1,
            txid: Uuid::new_v4(),
            wallet_id: 1,
            amount: dec!(-50.00),
            created_at: Utc::now(),
        };
        assert!(!tx.is_deposit());
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("  savings ").unwrap(), "savings");
        assert!(normalize_label("   ").is_err());
        assert!(normalize_label(&"x".repeat(256)).is_err());
        assert!(normalize_label(&"x".repeat(255)).is_ok());
    }

    #[test]
    fn test_parse_txid() {
        assert!(parse_txid("random_tx_id").is_none());
        let id = Uuid::new_v4();
        assert_eq!(parse_txid(&id.to_string()), Some(id));
    }
}
