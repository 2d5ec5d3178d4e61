//! Mutation history read path

use crate::error::{Result, WalletError};
use crate::lifecycle::ensure_active;
use crate::storage::WalletStore;
use crate::types::Mutation;
use std::sync::Arc;

/// Reads the append-only mutation log
#[derive(Clone)]
pub struct MutationHistory {
    store: Arc<dyn WalletStore>,
}

impl MutationHistory {
    pub fn new(store: Arc<dyn WalletStore>) -> Self {
        Self { store }
    }

    /// Every mutation of `owner`, most recent first. Unbounded.
    pub async fn list(&self, owner: &str) -> Result<Vec<Mutation>> {
        self.store.list_mutations(owner).await
    }

    /// History of the active wallet behind `token`
    pub async fn list_for_token(&self, token: &str) -> Result<Vec<Mutation>> {
        let wallet = self
            .store
            .find_by_token(token)
            .await?
            .ok_or(WalletError::WalletNotFound)?;
        ensure_active(&wallet)?;

        self.list(&wallet.owner).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerEngine;
    use crate::lifecycle::WalletLifecycle;
    use crate::storage::MemoryStore;
    use crate::types::MutationAction;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_history_order_and_gate() {
        let store = Arc::new(MemoryStore::new());
        let lifecycle = WalletLifecycle::new(store.clone());
        let engine = LedgerEngine::new(store.clone());
        let history = MutationHistory::new(store.clone());

        let wallet = lifecycle.create("cust-1").await.unwrap();
        assert!(matches!(
            history.list_for_token(&wallet.token).await,
            Err(WalletError::WalletNotActive)
        ));
        assert!(tokio_test::assert_ok!(history.list("cust-1").await).is_empty());

        lifecycle.enable(&wallet.token).await.unwrap();
        engine.deposit(&wallet.token, "r1", dec!(50)).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        engine.withdraw(&wallet.token, "r2", dec!(20)).await.unwrap();

        let mutations = history.list_for_token(&wallet.token).await.unwrap();
        assert_eq!(mutations.len(), 2);
        assert_eq!(mutations[0].reference_id, "r2");
        assert_eq!(mutations[0].action, MutationAction::Withdraw);
        assert_eq!(mutations[1].reference_id, "r1");
        assert!(mutations[0].created_at >= mutations[1].created_at);

        assert!(matches!(
            history.list_for_token("missing").await,
            Err(WalletError::WalletNotFound)
        ));
    }
}
