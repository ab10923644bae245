//! Command definitions
//!
//! Commands represent intentions to change a wallet balance.

use serde::{Deserialize, Serialize};

use crate::domain::{Amount, DomainError, MutationKind};

/// Command to deposit into a wallet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositCommand {
    pub wallet_id: i64,
    /// Amount to deposit (as string for precise decimal)
    pub amount: String,
}

impl DepositCommand {
    pub fn new(wallet_id: i64, amount: impl Into<String>) -> Self {
        Self {
            wallet_id,
            amount: amount.into(),
        }
    }
}

/// Command to withdraw from a wallet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawCommand {
    pub wallet_id: i64,
    /// Magnitude to withdraw (as string for precise decimal)
    pub amount: String,
}

impl WithdrawCommand {
    pub fn new(wallet_id: i64, amount: impl Into<String>) -> Self {
        Self {
            wallet_id,
            amount: amount.into(),
        }
    }
}

/// A balance change that passed amount validation
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ValidatedMutation {
    pub kind: MutationKind,
    pub wallet_id: i64,
    pub amount: Amount,
}

impl TryFrom<&DepositCommand> for ValidatedMutation {
    type Error = DomainError;

    fn try_from(command: &DepositCommand) -> Result<Self, Self::Error> {
        Ok(Self {
            kind: MutationKind::Deposit,
            wallet_id: command.wallet_id,
            amount: command.amount.parse()?,
        })
    }
}

impl TryFrom<&WithdrawCommand> for ValidatedMutation {
    type Error = DomainError;

    fn try_from(command: &WithdrawCommand) -> Result<Self, Self::Error> {
        Ok(Self {
            kind: MutationKind::Withdrawal,
            wallet_id: command.wallet_id,
            amount: command.amount.parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_deposit_command_validation() {
        let cmd = DepositCommand::new(3, "100");
        let mutation = ValidatedMutation::try_from(&cmd).unwrap();

        assert_eq!(mutation.kind, MutationKind::Deposit);
        assert_eq!(mutation.wallet_id, 3);
        assert_eq!(mutation.amount.value(), dec!(100.00));
    }

    #[test]
    fn test_withdraw_command_rejects_bad_amounts() {
        for amount in ["0", "-10", "1.001", "ten", ""] {
            let cmd = WithdrawCommand::new(1, amount);
            assert!(
                matches!(ValidatedMutation::try_from(&cmd), Err(DomainError::InvalidAmount(_))),
                "amount {:?} should be rejected",
                amount
            );
        }
    }
}
