//! Balance Engine Integration Tests
//!
//! Require PostgreSQL via DATABASE_URL; skipped when it is unset.

use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use wallet_ledger::jobs::reconcile_balances;
use wallet_ledger::store::PageRequest;
use wallet_ledger::{AppError, BalanceEngine, DepositCommand, DomainError, OperationContext};
use wallet_ledger::{StoreError, WithdrawCommand};

mod common;

use common::MISSING_WALLET_ID;

fn ctx() -> OperationContext {
    OperationContext::new().with_correlation_id(uuid::Uuid::new_v4())
}

async fn wallet_amounts(engine: &BalanceEngine, wallet_id: i64) -> Vec<Decimal> {
    engine
        .store()
        .list_wallet_transactions(wallet_id, PageRequest::default())
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.amount)
        .collect()
}

#[tokio::test]
async fn test_deposit_then_withdraw() {
    let Some(pool) = common::setup_test_db().await else { return };
    let engine = BalanceEngine::new(pool);
    let wallet = common::create_wallet(engine.store(), "deposit-withdraw").await;
    assert_eq!(wallet.balance, dec!(0.00));

    let deposit = engine
        .deposit(DepositCommand::new(wallet.id, "100"), &ctx())
        .await
        .unwrap();
    assert_eq!(deposit.amount, dec!(100.00));
    assert_eq!(deposit.wallet_id, wallet.id);
    assert!(deposit.is_deposit());

    let withdrawal = engine
        .withdraw(WithdrawCommand::new(wallet.id, "50"), &ctx())
        .await
        .unwrap();
    assert_eq!(withdrawal.amount, dec!(-50.00));
    assert_ne!(withdrawal.txid, deposit.txid);

    let wallet = engine.store().get_wallet(wallet.id).await.unwrap();
    assert_eq!(wallet.balance, dec!(50.00));
    assert_eq!(wallet.balance.to_string(), "50.00");

    assert_eq!(
        wallet_amounts(&engine, wallet.id).await,
        vec![dec!(100.00), dec!(-50.00)]
    );
}

#[tokio::test]
async fn test_withdraw_from_empty_wallet_is_rejected() {
    let Some(pool) = common::setup_test_db().await else { return };
    let engine = BalanceEngine::new(pool);
    let wallet = common::create_wallet(engine.store(), "empty").await;

    let err = engine
        .withdraw(WithdrawCommand::new(wallet.id, "50"), &ctx())
        .await
        .unwrap_err();
    assert!(
        matches!(err, AppError::Domain(DomainError::InsufficientFunds { .. })),
        "unexpected error: {:?}",
        err
    );

    let wallet = engine.store().get_wallet(wallet.id).await.unwrap();
    assert_eq!(wallet.balance, dec!(0.00));
    assert!(wallet_amounts(&engine, wallet.id).await.is_empty());
}

#[tokio::test]
async fn test_failed_withdraw_leaves_wallet_untouched() {
    let Some(pool) = common::setup_test_db().await else { return };
    let engine = BalanceEngine::new(pool);
    let wallet = common::create_wallet(engine.store(), "atomic").await;

    engine
        .deposit(DepositCommand::new(wallet.id, "20.50"), &ctx())
        .await
        .unwrap();

    let err = engine
        .withdraw(WithdrawCommand::new(wallet.id, "20.51"), &ctx())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "insufficient_funds");

    let wallet = engine.store().get_wallet(wallet.id).await.unwrap();
    assert_eq!(wallet.balance, dec!(20.50));
    assert_eq!(engine.store().count_wallet_transactions(wallet.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_withdraw_to_exactly_zero() {
    let Some(pool) = common::setup_test_db().await else { return };
    let engine = BalanceEngine::new(pool);
    let wallet = common::create_wallet(engine.store(), "zero").await;

    engine
        .deposit(DepositCommand::new(wallet.id, "0.01"), &ctx())
        .await
        .unwrap();
    engine
        .withdraw(WithdrawCommand::new(wallet.id, "0.01"), &ctx())
        .await
        .unwrap();

    let reconciliation = engine.store().reconcile_wallet(wallet.id).await.unwrap();
    assert_eq!(reconciliation.balance, Decimal::ZERO);
    assert!(reconciliation.is_consistent());
}

#[tokio::test]
async fn test_invalid_amounts_write_nothing() {
    let Some(pool) = common::setup_test_db().await else { return };
    let engine = BalanceEngine::new(pool);
    let wallet = common::create_wallet(engine.store(), "invalid").await;

    for amount in ["0", "-5", "1.001", "abc", ""] {
        let err = engine
            .deposit(DepositCommand::new(wallet.id, amount), &ctx())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "invalid_amount", "amount {:?}", amount);
    }

    let err = engine
        .withdraw(WithdrawCommand::new(wallet.id, "-1"), &ctx())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "invalid_amount");

    assert_eq!(engine.store().count_wallet_transactions(wallet.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_wallet() {
    let Some(pool) = common::setup_test_db().await else { return };
    let engine = BalanceEngine::new(pool);

    let err = engine
        .deposit(DepositCommand::new(MISSING_WALLET_ID, "10"), &ctx())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Domain(DomainError::WalletNotFound(id)) if id == MISSING_WALLET_ID
    ));

    let err = engine
        .withdraw(WithdrawCommand::new(MISSING_WALLET_ID, "10"), &ctx())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "wallet_not_found");

    let err = engine.store().get_wallet(MISSING_WALLET_ID).await.unwrap_err();
    assert!(matches!(err, StoreError::WalletNotFound(_)));
}

#[tokio::test]
async fn test_transaction_lookup_by_txid() {
    let Some(pool) = common::setup_test_db().await else { return };
    let engine = BalanceEngine::new(pool);
    let wallet = common::create_wallet(engine.store(), "lookup").await;

    let deposit = engine
        .deposit(DepositCommand::new(wallet.id, "12.34"), &ctx())
        .await
        .unwrap();

    let found = engine
        .store()
        .get_transaction_by_txid(&deposit.txid.to_string())
        .await
        .unwrap();
    assert_eq!(found.id, deposit.id);
    assert_eq!(found.amount, dec!(12.34));

    let unknown = uuid::Uuid::new_v4().to_string();
    for txid in [unknown.as_str(), "not-a-uuid"] {
        let err = engine.store().get_transaction_by_txid(txid).await.unwrap_err();
        assert!(matches!(err, StoreError::TransactionNotFound(_)), "txid {:?}", txid);
    }
}

#[tokio::test]
async fn test_balance_matches_transaction_sum() {
    let Some(pool) = common::setup_test_db().await else { return };
    let engine = BalanceEngine::new(pool);
    let wallet = common::create_wallet(engine.store(), "sequence").await;

    for amount in ["1000", "99", "40"] {
        engine
            .deposit(DepositCommand::new(wallet.id, amount), &ctx())
            .await
            .unwrap();
    }
    engine
        .withdraw(WithdrawCommand::new(wallet.id, "14"), &ctx())
        .await
        .unwrap();
    let err = engine
        .withdraw(WithdrawCommand::new(wallet.id, "2000"), &ctx())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "insufficient_funds");

    let reconciliation = engine.store().reconcile_wallet(wallet.id).await.unwrap();
    assert_eq!(reconciliation.balance, dec!(1125.00));
    assert_eq!(reconciliation.transaction_sum, dec!(1125.00));

    let mismatches = reconcile_balances(engine.store()).await.unwrap();
    assert!(mismatches.iter().all(|m| m.wallet_id != wallet.id));
}

#[tokio::test]
async fn test_concurrent_withdrawals_never_double_spend() {
    let Some(pool) = common::setup_test_db().await else { return };
    let engine = BalanceEngine::new(pool);
    let wallet = common::create_wallet(engine.store(), "concurrent").await;

    const WITHDRAWALS: usize = 10;
    engine
        .deposit(
            DepositCommand::new(wallet.id, (10 * (WITHDRAWALS - 1)).to_string()),
            &ctx(),
        )
        .await
        .unwrap();

    let handles: Vec<_> = (0..WITHDRAWALS)
        .map(|_| {
            let engine = engine.clone();
            let wallet_id = wallet.id;
            tokio::spawn(async move {
                engine
                    .withdraw(WithdrawCommand::new(wallet_id, "10"), &ctx())
                    .await
            })
        })
        .collect();

    let mut successes = 0;
    let mut insufficient = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(AppError::Domain(DomainError::InsufficientFunds { .. })) => insufficient += 1,
            Err(e) => panic!("unexpected error: {:?}", e),
        }
    }

    assert_eq!(successes, WITHDRAWALS - 1);
    assert_eq!(insufficient, 1);

    let reconciliation = engine.store().reconcile_wallet(wallet.id).await.unwrap();
    assert_eq!(reconciliation.balance, dec!(0.00));
    assert!(reconciliation.is_consistent());
    assert_eq!(
        engine.store().count_wallet_transactions(wallet.id).await.unwrap(),
        WITHDRAWALS as i64
    );
}

#[tokio::test]
async fn test_duplicate_and_renamed_labels() {
    let Some(pool) = common::setup_test_db().await else { return };
    let engine = BalanceEngine::new(pool);
    let store = engine.store();

    let first = common::create_wallet(store, "label").await;
    let err = store.create_wallet(&first.label).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateLabel(_)));

    let second = common::create_wallet(store, "label").await;
    let err = store.rename_wallet(second.id, &first.label).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateLabel(_)));

    let new_label = common::unique_label("renamed");
    let renamed = store.rename_wallet(second.id, &new_label).await.unwrap();
    assert_eq!(renamed.label, new_label);
    assert!(renamed.updated_at >= second.updated_at);
}

#[tokio::test]
async fn test_lock_timeout_aborts_without_writing() {
    let Some(pool) = common::setup_test_db().await else { return };
    let engine = BalanceEngine::new(pool.clone());
    let impatient = BalanceEngine::with_lock_timeout(pool, Some(Duration::from_millis(100)));
    let wallet = common::create_wallet(engine.store(), "lock-timeout").await;

    // Hold the row lock in a separate unit of work
    let mut holder = engine.store().begin().await.unwrap();
    holder.get_wallet_for_update(wallet.id).await.unwrap();

    let err = impatient
        .deposit(DepositCommand::new(wallet.id, "10"), &ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::LockTimeout), "unexpected error: {:?}", err);
    assert_eq!(err.error_code(), "lock_timeout");
    assert_eq!(err.status_code(), axum::http::StatusCode::SERVICE_UNAVAILABLE);

    let unchanged = engine.store().get_wallet(wallet.id).await.unwrap();
    assert_eq!(unchanged.balance, dec!(0.00));
    assert_eq!(engine.store().count_wallet_transactions(wallet.id).await.unwrap(), 0);

    holder.rollback().await.unwrap();

    impatient
        .deposit(DepositCommand::new(wallet.id, "10"), &ctx())
        .await
        .unwrap();
    let reconciliation = engine.store().reconcile_wallet(wallet.id).await.unwrap();
    assert_eq!(reconciliation.balance, dec!(10.00));
    assert!(reconciliation.is_consistent());
}
