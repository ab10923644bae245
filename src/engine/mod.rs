//! Balance Engine module
//!
//! The two mutating operations on wallet balances.
//! Each call owns its unit of work; no session state is shared between calls.

mod balance_engine;
mod commands;

pub use balance_engine::BalanceEngine;
pub use commands::{DepositCommand, WithdrawCommand};
