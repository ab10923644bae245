//! Unit of Work
//!
//! One database transaction. Wallet rows read through
//! [`UnitOfWork::get_wallet_for_update`] stay locked until
//! [`UnitOfWork::commit`] or [`UnitOfWork::rollback`]. Dropping an
//! uncommitted unit of work rolls it back.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction as PgTransaction};
use std::time::Duration;
use uuid::Uuid;

use crate::domain::{Balance, Transaction, Wallet};

use super::StoreError;

/// An open unit of work
pub struct UnitOfWork {
    tx: PgTransaction<'static, Postgres>,
}

impl UnitOfWork {
    /// Begin a new unit of work, optionally bounding row-lock waits.
    pub(crate) async fn begin(
        pool: &PgPool,
        lock_timeout: Option<Duration>,
    ) -> Result<Self, StoreError> {
        let mut tx = pool.begin().await?;

        if let Some(timeout) = lock_timeout {
            // SET does not accept bind parameters
            let statement = format!("SET LOCAL lock_timeout = '{}ms'", timeout.as_millis());
            sqlx::query(&statement).execute(&mut *tx).await?;
        }

        Ok(Self { tx })
    }

    // =========================================================================
    // get_wallet_for_update
    // =========================================================================

    /// Read a wallet and take an exclusive lock on its row.
    ///
    /// Blocks while another unit of work holds the lock on the same wallet.
    pub async fn get_wallet_for_update(&mut self, wallet_id: i64) -> Result<Wallet, StoreError> {
        let wallet: Option<Wallet> = sqlx::query_as(
            r#"
            SELECT id, label, balance, created_at, updated_at
            FROM wallets
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(wallet_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        wallet.ok_or(StoreError::WalletNotFound(wallet_id))
    }

    /// Overwrite the balance of a wallet locked by this unit of work.
    pub async fn set_balance(
        &mut self,
        wallet_id: i64,
        balance: &Balance,
    ) -> Result<(), StoreError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE wallets
            SET balance = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(wallet_id)
        .bind(balance.value())
        .execute(&mut *self.tx)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::WalletNotFound(wallet_id));
        }

        Ok(())
    }

    // =========================================================================
    // append_transaction
    // =========================================================================

    /// Append a transaction log entry with a freshly generated txid.
    pub async fn append_transaction(
        &mut self,
        wallet_id: i64,
        amount: Decimal,
    ) -> Result<Transaction, StoreError> {
        let transaction: Transaction = sqlx::query_as(
            r#"
            INSERT INTO transactions (txid, wallet_id, amount)
            VALUES ($1, $2, $3)
            RETURNING id, txid, wallet_id, amount, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(wallet_id)
        .bind(amount)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(transaction)
    }

    /// Commit every write and release the row locks.
    pub async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    /// Discard every write and release the row locks.
    pub async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
