//! wallet-ledger Library
//!
//! Re-exports modules for integration testing and external use.

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod jobs;
pub mod store;

mod error;

pub use config::Config;
pub use domain::{Amount, AmountError, Balance, DomainError, OperationContext};
pub use domain::{Transaction, Wallet};
pub use engine::{BalanceEngine, DepositCommand, WithdrawCommand};
pub use error::{AppError, AppResult, ErrorResponse};
pub use store::{LedgerStore, StoreError, UnitOfWork};
