//! Common test utilities

#![allow(dead_code)]

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use wallet_ledger::{LedgerStore, Wallet};

/// Connect to the test database and apply migrations.
///
/// Returns `None` when `DATABASE_URL` is not set so database tests can be
/// skipped on machines without Postgres.
pub async fn setup_test_db() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    wallet_ledger::db::MIGRATOR
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    Some(pool)
}

/// Label that will not collide with other tests running in parallel
pub fn unique_label(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4())
}

/// Create a fresh zero-balance wallet
pub async fn create_wallet(store: &LedgerStore, prefix: &str) -> Wallet {
    store
        .create_wallet(&unique_label(prefix))
        .await
        .expect("Failed to create wallet")
}

/// Wallet id that is never allocated by the BIGSERIAL sequence in tests
pub const MISSING_WALLET_ID: i64 = i64::MAX;
