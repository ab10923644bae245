//! Ledger Store module
//!
//! Persistence layer for wallets and their transaction log.
//! Handles storing and retrieving rows from PostgreSQL.

mod error;
mod repository;
mod unit_of_work;

pub use error::StoreError;
pub use repository::{LedgerStore, PageRequest, Reconciliation, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
pub use unit_of_work::UnitOfWork;
