//! Ledger Store Repository
//!
//! Durable storage of wallets and their transaction log in PostgreSQL.
//! Single-statement writes run directly on the pool; balance mutations go
//! through a [`UnitOfWork`].

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use std::time::Duration;

use crate::domain::wallet::{normalize_label, parse_txid};
use crate::domain::{Transaction, Wallet};

use super::{StoreError, UnitOfWork};

/// Default page size for list queries
pub const DEFAULT_PAGE_LIMIT: i64 = 50;

/// Upper bound on page size
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Limit/offset window for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: i64,
    pub offset: i64,
}

impl PageRequest {
    /// Build a page window, clamping limit to `1..=MAX_PAGE_LIMIT` and offset to `>= 0`
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
            offset: offset.max(0),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_LIMIT, 0)
    }
}

/// Stored balance compared against the sum of the wallet's transactions
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Reconciliation {
    pub wallet_id: i64,
    pub balance: Decimal,
    pub transaction_sum: Decimal,
}

impl Reconciliation {
    pub fn is_consistent(&self) -> bool {
        self.balance == self.transaction_sum
    }
}

/// Ledger Store for wallets and transactions
#[derive(Debug, Clone)]
pub struct LedgerStore {
    pool: PgPool,
    lock_timeout: Option<Duration>,
}

impl LedgerStore {
    /// Create a new LedgerStore with a database pool
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            lock_timeout: None,
        }
    }

    /// Bound how long a unit of work waits for a wallet row lock
    pub fn with_lock_timeout(mut self, lock_timeout: Option<Duration>) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Begin a unit of work
    pub async fn begin(&self) -> Result<UnitOfWork, StoreError> {
        UnitOfWork::begin(&self.pool, self.lock_timeout).await
    }

    // =========================================================================
    // Wallets
    // =========================================================================

    /// Create a wallet with a zero balance
    pub async fn create_wallet(&self, label: &str) -> Result<Wallet, StoreError> {
        let label = normalize_label(label).map_err(StoreError::InvalidLabel)?;

        let wallet: Wallet = sqlx::query_as(
            r#"
            INSERT INTO wallets (label)
            VALUES ($1)
            RETURNING id, label, balance, created_at, updated_at
            "#,
        )
        .bind(&label)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::from_sqlx(e, Some(&label)))?;

        tracing::info!(wallet_id = wallet.id, label = %wallet.label, "Wallet created");

        Ok(wallet)
    }

    /// Get a wallet by id
    pub async fn get_wallet(&self, wallet_id: i64) -> Result<Wallet, StoreError> {
        let wallet: Option<Wallet> = sqlx::query_as(
            r#"
            SELECT id, label, balance, created_at, updated_at
            FROM wallets
            WHERE id = $1
            "#,
        )
        .bind(wallet_id)
        .fetch_optional(&self.pool)
        .await?;

        wallet.ok_or(StoreError::WalletNotFound(wallet_id))
    }

    /// Change a wallet's label
    pub async fn rename_wallet(&self, wallet_id: i64, label: &str) -> Result<Wallet, StoreError> {
        let label = normalize_label(label).map_err(StoreError::InvalidLabel)?;

        let wallet: Option<Wallet> = sqlx::query_as(
            r#"
            UPDATE wallets
            SET label = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, label, balance, created_at, updated_at
            "#,
        )
        .bind(wallet_id)
        .bind(&label)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::from_sqlx(e, Some(&label)))?;

        wallet.ok_or(StoreError::WalletNotFound(wallet_id))
    }

    /// List wallets ordered by id
    pub async fn list_wallets(&self, page: PageRequest) -> Result<Vec<Wallet>, StoreError> {
        let wallets: Vec<Wallet> = sqlx::query_as(
            r#"
            SELECT id, label, balance, created_at, updated_at
            FROM wallets
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(wallets)
    }

    pub async fn count_wallets(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM wallets")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Look up a transaction by its public txid
    pub async fn get_transaction_by_txid(&self, txid: &str) -> Result<Transaction, StoreError> {
        let not_found = || StoreError::TransactionNotFound(txid.to_string());
        let parsed = parse_txid(txid).ok_or_else(not_found)?;

        let transaction: Option<Transaction> = sqlx::query_as(
            r#"
            SELECT id, txid, wallet_id, amount, created_at
            FROM transactions
            WHERE txid = $1
            "#,
        )
        .bind(parsed)
        .fetch_optional(&self.pool)
        .await?;

        transaction.ok_or_else(not_found)
    }

    /// List all transactions in creation order
    pub async fn list_transactions(&self, page: PageRequest) -> Result<Vec<Transaction>, StoreError> {
        let transactions: Vec<Transaction> = sqlx::query_as(
            r#"
            SELECT id, txid, wallet_id, amount, created_at
            FROM transactions
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    pub async fn count_transactions(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// List one wallet's transactions in creation order
    pub async fn list_wallet_transactions(
        &self,
        wallet_id: i64,
        page: PageRequest,
    ) -> Result<Vec<Transaction>, StoreError> {
        // Distinguish "no such wallet" from "no transactions yet"
        self.get_wallet(wallet_id).await?;

        let transactions: Vec<Transaction> = sqlx::query_as(
            r#"
            SELECT id, txid, wallet_id, amount, created_at
            FROM transactions
            WHERE wallet_id = $1
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(wallet_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    pub async fn count_wallet_transactions(&self, wallet_id: i64) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE wallet_id = $1")
            .bind(wallet_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // Balance invariant
    // =========================================================================

    /// Compare a wallet's balance with the sum of its transactions
    pub async fn reconcile_wallet(&self, wallet_id: i64) -> Result<Reconciliation, StoreError> {
        let reconciliation: Option<Reconciliation> = sqlx::query_as(
            r#"
            SELECT w.id AS wallet_id,
                   w.balance,
                   COALESCE(SUM(t.amount), 0)::NUMERIC(18, 2) AS transaction_sum
            FROM wallets w
            LEFT JOIN transactions t ON t.wallet_id = w.id
            WHERE w.id = $1
            GROUP BY w.id, w.balance
            "#,
        )
        .bind(wallet_id)
        .fetch_optional(&self.pool)
        .await?;

        reconciliation.ok_or(StoreError::WalletNotFound(wallet_id))
    }

    /// Every wallet whose balance differs from its transaction sum
    pub async fn find_inconsistent_wallets(&self) -> Result<Vec<Reconciliation>, StoreError> {
        let rows: Vec<Reconciliation> = sqlx::query_as(
            r#"
            SELECT w.id AS wallet_id,
                   w.balance,
                   COALESCE(SUM(t.amount), 0)::NUMERIC(18, 2) AS transaction_sum
            FROM wallets w
            LEFT JOIN transactions t ON t.wallet_id = w.id
            GROUP BY w.id, w.balance
            HAVING w.balance <> COALESCE(SUM(t.amount), 0)
            ORDER BY w.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
