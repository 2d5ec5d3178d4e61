//! In-process store
//!
//! A transaction owns the store-wide lock for its whole lifetime and stages its
//! writes; they are applied to the shared state only on `commit`. That gives
//! serializable transactions, and dropping a transaction discards its writes.

use super::{StoreTransaction, WalletStore};
use crate::error::{Result, WalletError};
use crate::types::{Mutation, Wallet, WalletStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
struct MemoryState {
    /// Wallets keyed by token
    wallets: HashMap<String, Wallet>,
    /// Mutations in commit order
    mutations: Vec<Mutation>,
}

/// Store kept entirely in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed mutations across all owners
    pub async fn mutation_count(&self) -> usize {
        self.state.lock().await.mutations.len()
    }
}

#[async_trait]
impl WalletStore for MemoryStore {
    async fn create_wallet(&self, wallet: &Wallet) -> Result<()> {
        let mut state = self.state.lock().await;

        if state.wallets.values().any(|w| w.owner == wallet.owner) {
            return Err(WalletError::WalletAlreadyExists(wallet.owner.clone()));
        }
        if state.wallets.contains_key(&wallet.token) {
            return Err(WalletError::TokenGeneration("token collision".to_string()));
        }

        state.wallets.insert(wallet.token.clone(), wallet.clone());
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Wallet>> {
        Ok(self.state.lock().await.wallets.get(token).cloned())
    }

    async fn list_mutations(&self, owner: &str) -> Result<Vec<Mutation>> {
        let state = self.state.lock().await;

        // Newest insert first so equal timestamps keep commit order reversed
        let mut mutations: Vec<Mutation> = state
            .mutations
            .iter()
            .rev()
            .filter(|m| m.owner == owner)
            .cloned()
            .collect();
        mutations.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(mutations)
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let guard = self.state.clone().lock_owned().await;
        Ok(Box::new(MemoryTransaction {
            guard,
            wallets: HashMap::new(),
            mutations: Vec::new(),
        }))
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    /// Staged wallet rows keyed by token
    wallets: HashMap<String, Wallet>,
    /// Staged mutations
    mutations: Vec<Mutation>,
}

impl MemoryTransaction {
    fn current(&self, token: &str) -> Option<Wallet> {
        self.wallets
            .get(token)
            .or_else(|| self.guard.wallets.get(token))
            .cloned()
    }

    fn update<F>(&mut self, token: &str, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Wallet),
    {
        let mut wallet = self.current(token).ok_or(WalletError::WalletNotFound)?;
        apply(&mut wallet);
        self.wallets.insert(token.to_string(), wallet);
        Ok(())
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn lock_wallet(&mut self, token: &str) -> Result<Option<Wallet>> {
        Ok(self.current(token))
    }

    async fn reference_exists(&mut self, owner: &str, reference_id: &str) -> Result<bool> {
        Ok(self
            .guard
            .mutations
            .iter()
            .chain(self.mutations.iter())
            .any(|m| m.owner == owner && m.reference_id == reference_id))
    }

    async fn insert_mutation(&mut self, mutation: &Mutation) -> Result<()> {
        if self
            .reference_exists(&mutation.owner, &mutation.reference_id)
            .await?
        {
            return Err(WalletError::DuplicateReference(mutation.reference_id.clone()));
        }
        self.mutations.push(mutation.clone());
        Ok(())
    }

    async fn set_balance(
        &mut self,
        token: &str,
        balance: Decimal,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.update(token, |wallet| {
            wallet.balance = balance;
            wallet.updated_at = Some(at);
        })
    }

    async fn set_status(
        &mut self,
        token: &str,
        status: WalletStatus,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.update(token, |wallet| {
            wallet.status = status;
            wallet.updated_at = Some(at);
        })
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryTransaction {
            mut guard,
            wallets,
            mutations,
        } = *self;

        guard.wallets.extend(wallets);
        guard.mutations.extend(mutations);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MutationAction;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    async fn store_with_wallet() -> (MemoryStore, Wallet) {
        let store = MemoryStore::new();
        let wallet = Wallet::new("cust-1", "tok-1");
        store.create_wallet(&wallet).await.unwrap();
        (store, wallet)
    }

    #[tokio::test]
    async fn test_one_wallet_per_owner() {
        let (store, _) = store_with_wallet().await;
        let result = store.create_wallet(&Wallet::new("cust-1", "tok-2")).await;
        assert!(matches!(result, Err(WalletError::WalletAlreadyExists(owner)) if owner == "cust-1"));
    }

    #[tokio::test]
    async fn test_commit_applies_staged_writes() {
        let (store, wallet) = store_with_wallet().await;
        let now = Utc::now();

        let mut tx = store.begin().await.unwrap();
        tx.set_balance(&wallet.token, dec!(25), now).await.unwrap();
        tx.insert_mutation(&Mutation::success(
            "cust-1",
            "r1",
            MutationAction::Deposit,
            dec!(25),
            now,
        ))
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let stored = store.find_by_token(&wallet.token).await.unwrap().unwrap();
        assert_eq!(stored.balance, dec!(25));
        assert_eq!(stored.updated_at, Some(now));
        assert_eq!(store.mutation_count().await, 1);
    }

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let (store, wallet) = store_with_wallet().await;

        {
            let mut tx = store.begin().await.unwrap();
            tx.set_balance(&wallet.token, dec!(99), Utc::now()).await.unwrap();
            tx.set_status(&wallet.token, WalletStatus::Active, Utc::now())
                .await
                .unwrap();
        }

        let stored = store.find_by_token(&wallet.token).await.unwrap().unwrap();
        assert_eq!(stored.balance, Decimal::ZERO);
        assert_eq!(stored.status, WalletStatus::NewlyCreated);
    }

    #[tokio::test]
    async fn test_duplicate_reference_rejected() {
        let (store, _) = store_with_wallet().await;
        let now = Utc::now();
        let mutation = Mutation::success("cust-1", "r1", MutationAction::Deposit, dec!(1), now);

        let mut tx = store.begin().await.unwrap();
        tx.insert_mutation(&mutation).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(tx.reference_exists("cust-1", "r1").await.unwrap());
        assert!(!tx.reference_exists("cust-2", "r1").await.unwrap());
        let again = Mutation::success("cust-1", "r1", MutationAction::Deposit, dec!(1), now);
        assert!(matches!(
            tx.insert_mutation(&again).await,
            Err(WalletError::DuplicateReference(_))
        ));
    }

    #[tokio::test]
    async fn test_list_mutations_newest_first() {
        let (store, _) = store_with_wallet().await;
        let base = Utc::now();

        let mut tx = store.begin().await.unwrap();
        for (i, reference) in ["a", "b", "c"].iter().enumerate() {
            let at = base + Duration::seconds(i as i64);
            tx.insert_mutation(&Mutation::success(
                "cust-1",
                *reference,
                MutationAction::Deposit,
                dec!(1),
                at,
            ))
            .await
            .unwrap();
        }
        tx.insert_mutation(&Mutation::success(
            "cust-2",
            "x",
            MutationAction::Deposit,
            dec!(1),
            base,
        ))
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let refs: Vec<String> = store
            .list_mutations("cust-1")
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.reference_id)
            .collect();
        assert_eq!(refs, vec!["c", "b", "a"]);
        assert!(store.list_mutations("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_wallet() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        assert!(tx.lock_wallet("missing").await.unwrap().is_none());
        assert!(matches!(
            tx.set_balance("missing", dec!(1), Utc::now()).await,
            Err(WalletError::WalletNotFound)
        ));
    }
}
