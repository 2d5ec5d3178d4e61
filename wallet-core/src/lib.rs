//! Wallet Ledger Core
//!
//! Custodial wallet ledger: wallet lifecycle plus atomic balance mutations.
//!
//! # Architecture
//!
//! - **Store**: narrow transactional interface ([`storage::WalletStore`]), with
//!   in-memory and PostgreSQL backends
//! - **Lifecycle**: wallet status state machine and the active-status guard
//! - **Ledger Engine**: deposit/withdraw protocol, one transaction per mutation
//! - **History**: read path over the append-only mutation log
//!
//! # Invariants
//!
//! - Non-negative balance: a withdrawal never commits when `amount > balance`
//! - Paired writes: every balance change commits together with the mutation that caused it
//! - Append-only: mutations are never updated or deleted
//! - Rejected operations never reach the store

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod history;
pub mod ledger;
pub mod lifecycle;
pub mod storage;
pub mod token;
pub mod types;

// Re-exports
pub use error::{Result, WalletError};
pub use history::MutationHistory;
pub use ledger::LedgerEngine;
pub use lifecycle::{Transition, WalletLifecycle};
pub use storage::{MemoryStore, PostgresStore, StoreTransaction, WalletStore};
pub use token::TokenIssuer;
pub use types::{Mutation, MutationAction, MutationStatus, Wallet, WalletStatus};
