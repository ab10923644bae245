//! Domain module
//!
//! Core domain types and business rules.

pub mod amount;
pub mod context;
pub mod error;
pub mod mutation;
pub mod wallet;

pub use amount::{Amount, AmountError, Balance};
pub use context::OperationContext;
pub use error::DomainError;
pub use mutation::{MutationKind, MutationState, MutationTracker};
pub use wallet::{Transaction, Wallet};
