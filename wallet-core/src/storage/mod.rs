//! Wallet store
//!
//! The store is the only owner of persisted state. Balance-changing work goes
//! through a [`StoreTransaction`]: the wallet is locked when read and stays locked
//! until `commit`, so a read-modify-write cannot interleave with another one on
//! the same wallet. Dropping a transaction without committing rolls it back.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use crate::error::Result;
use crate::types::{Mutation, Wallet, WalletStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Point lookups, wallet creation and transaction entry point
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// Insert a new wallet. Fails with `WalletAlreadyExists` if the owner has one.
    async fn create_wallet(&self, wallet: &Wallet) -> Result<()>;

    /// Look up a wallet by its bearer token
    async fn find_by_token(&self, token: &str) -> Result<Option<Wallet>>;

    /// All mutations of an owner, most recent first
    async fn list_mutations(&self, owner: &str) -> Result<Vec<Mutation>>;

    /// Open an atomic unit of work
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;
}

/// Atomic unit of work over one wallet
#[async_trait]
pub trait StoreTransaction: Send {
    /// Read the wallet and hold it exclusively until commit or rollback
    async fn lock_wallet(&mut self, token: &str) -> Result<Option<Wallet>>;

    /// Whether the owner already recorded a mutation with this reference id
    async fn reference_exists(&mut self, owner: &str, reference_id: &str) -> Result<bool>;

    /// Append a mutation record
    async fn insert_mutation(&mut self, mutation: &Mutation) -> Result<()>;

    /// Overwrite the balance and stamp `updated_at`
    async fn set_balance(&mut self, token: &str, balance: Decimal, at: DateTime<Utc>)
        -> Result<()>;

    /// Overwrite the status and stamp `updated_at`
    async fn set_status(&mut self, token: &str, status: WalletStatus, at: DateTime<Utc>)
        -> Result<()>;

    /// Make every staged write visible at once
    async fn commit(self: Box<Self>) -> Result<()>;
}
