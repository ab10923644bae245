//! Balance Engine
//!
//! Deposit and withdraw, each executed as one unit of work:
//! lock the wallet row, validate, write the new balance, append the
//! transaction, commit. Any failure rolls the whole unit back.

use rust_decimal::Decimal;
use sqlx::PgPool;
use std::time::Duration;

use crate::domain::{
    Balance, MutationKind, MutationState, MutationTracker, OperationContext, Transaction, Wallet,
};
use crate::error::{AppError, AppResult};
use crate::store::{LedgerStore, UnitOfWork};

use super::commands::ValidatedMutation;
use super::{DepositCommand, WithdrawCommand};

/// Engine enforcing `balance == sum(transactions)` under concurrent mutation
#[derive(Debug, Clone)]
pub struct BalanceEngine {
    store: LedgerStore,
}

impl BalanceEngine {
    pub fn new(pool: PgPool) -> Self {
        Self {
            store: LedgerStore::new(pool),
        }
    }

    /// Create an engine whose units of work give up waiting for a row lock
    /// after `lock_timeout`
    pub fn with_lock_timeout(pool: PgPool, lock_timeout: Option<Duration>) -> Self {
        Self {
            store: LedgerStore::new(pool).with_lock_timeout(lock_timeout),
        }
    }

    pub fn from_store(store: LedgerStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    // =========================================================================
    // deposit
    // =========================================================================

    /// Credit a wallet and record a positive transaction
    pub async fn deposit(
        &self,
        command: DepositCommand,
        context: &OperationContext,
    ) -> AppResult<Transaction> {
        let mutation = ValidatedMutation::try_from(&command)?;
        self.execute(mutation, context).await
    }

    // =========================================================================
    // withdraw
    // =========================================================================

    /// Debit a wallet and record a negative transaction.
    ///
    /// Fails with `InsufficientFunds` when the balance would go below zero;
    /// nothing is written in that case.
    pub async fn withdraw(
        &self,
        command: WithdrawCommand,
        context: &OperationContext,
    ) -> AppResult<Transaction> {
        let mutation = ValidatedMutation::try_from(&command)?;
        self.execute(mutation, context).await
    }

    async fn execute(
        &self,
        mutation: ValidatedMutation,
        context: &OperationContext,
    ) -> AppResult<Transaction> {
        let mut tracker = MutationTracker::new(mutation.kind, mutation.wallet_id);

        let mut uow = match self.store.begin().await {
            Ok(uow) => uow,
            Err(e) => {
                tracker.roll_back();
                return Err(e.into());
            }
        };

        match apply(&mut uow, &mutation, &mut tracker).await {
            Ok(transaction) => {
                uow.commit().await.map_err(|e| {
                    tracker.roll_back();
                    AppError::from(e)
                })?;
                tracker.advance(MutationState::Committed);

                tracing::info!(
                    kind = %mutation.kind,
                    wallet_id = mutation.wallet_id,
                    txid = %transaction.txid,
                    amount = %transaction.amount,
                    correlation_id = ?context.correlation_id,
                    client_ip = ?context.client_ip,
                    "Balance mutation committed"
                );

                Ok(transaction)
            }
            Err(err) => {
                if let Err(rollback_err) = uow.rollback().await {
                    // The connection is discarded; Postgres aborts the transaction itself
                    tracing::error!(error = %rollback_err, "Rollback failed");
                }
                tracker.roll_back();

                tracing::warn!(
                    kind = %mutation.kind,
                    wallet_id = mutation.wallet_id,
                    amount = %mutation.amount,
                    error_code = err.error_code(),
                    correlation_id = ?context.correlation_id,
                    client_ip = ?context.client_ip,
                    "Balance mutation rolled back"
                );

                Err(err)
            }
        }
    }
}

/// Lock, validate and write inside an open unit of work
async fn apply(
    uow: &mut UnitOfWork,
    mutation: &ValidatedMutation,
    tracker: &mut MutationTracker,
) -> AppResult<Transaction> {
    let wallet = uow.get_wallet_for_update(mutation.wallet_id).await?;
    tracker.advance(MutationState::Locked);

    let (new_balance, signed_amount) = plan(&wallet, mutation)?;
    tracker.advance(MutationState::Validated);

    uow.set_balance(wallet.id, &new_balance).await?;
    let transaction = uow.append_transaction(wallet.id, signed_amount).await?;
    tracker.advance(MutationState::Applied);

    Ok(transaction)
}

/// New balance and the signed transaction amount for a mutation
fn plan(wallet: &Wallet, mutation: &ValidatedMutation) -> AppResult<(Balance, Decimal)> {
    let planned = match mutation.kind {
        MutationKind::Deposit => (
            wallet.plan_deposit(&mutation.amount)?,
            mutation.amount.value(),
        ),
        MutationKind::Withdrawal => (
            wallet.plan_withdrawal(&mutation.amount)?,
            mutation.amount.negated(),
        ),
    };
    Ok(planned)
}
