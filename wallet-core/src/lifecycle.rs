//! Wallet lifecycle state machine
//!
//! ```text
//! create ──> NewlyCreated ──enable──> Active <──enable── Inactive
//!                                       │                   ^
//!                                       └──────disable──────┘
//! ```
//!
//! Enabling an already active wallet is a no-op. Only `Active` wallets may be
//! read for balance or mutated; [`ensure_active`] is the guard for that.

use crate::error::{Result, WalletError};
use crate::storage::WalletStore;
use crate::token::TokenIssuer;
use crate::types::{Wallet, WalletStatus};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Fail with `WalletNotActive` unless the wallet is active
pub fn ensure_active(wallet: &Wallet) -> Result<()> {
    if wallet.is_active() {
        Ok(())
    } else {
        Err(WalletError::WalletNotActive)
    }
}

/// Result of a status change request
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Wallet after the request
    pub wallet: Wallet,
    /// False when the wallet was already in the target status
    pub changed: bool,
}

/// Creates wallets and moves them between statuses
#[derive(Clone)]
pub struct WalletLifecycle {
    store: Arc<dyn WalletStore>,
    issuer: TokenIssuer,
}

impl WalletLifecycle {
    pub fn new(store: Arc<dyn WalletStore>) -> Self {
        Self {
            store,
            issuer: TokenIssuer::new(),
        }
    }

    /// Open a wallet for `owner` in `NewlyCreated` status with a fresh token
    #[instrument(skip(self))]
    pub async fn create(&self, owner: &str) -> Result<Wallet> {
        let owner = owner.trim();
        if owner.is_empty() {
            return Err(WalletError::Validation("customer id is required".to_string()));
        }

        let token = self.issuer.issue()?;
        let wallet = Wallet::new(owner, token);
        self.store.create_wallet(&wallet).await?;

        info!(wallet_id = %wallet.id, "Wallet created");
        Ok(wallet)
    }

    /// NewlyCreated | Inactive -> Active
    pub async fn enable(&self, token: &str) -> Result<Wallet> {
        Ok(self.enable_transition(token).await?.wallet)
    }

    /// Like [`enable`](Self::enable), also reporting whether the status changed
    #[instrument(skip_all)]
    pub async fn enable_transition(&self, token: &str) -> Result<Transition> {
        self.transition(
            token,
            &[WalletStatus::NewlyCreated, WalletStatus::Inactive],
            WalletStatus::Active,
        )
        .await
    }

    /// Active -> Inactive; the caller must confirm explicitly
    #[instrument(skip(self, token))]
    pub async fn disable(&self, token: &str, confirmed: bool) -> Result<Wallet> {
        if !confirmed {
            return Err(WalletError::Validation(
                "is_disabled must be true to disable a wallet".to_string(),
            ));
        }

        let transition = self
            .transition(token, &[WalletStatus::Active], WalletStatus::Inactive)
            .await?;
        Ok(transition.wallet)
    }

    async fn transition(
        &self,
        token: &str,
        from: &[WalletStatus],
        to: WalletStatus,
    ) -> Result<Transition> {
        let mut tx = self.store.begin().await?;
        let mut wallet = tx
            .lock_wallet(token)
            .await?
            .ok_or(WalletError::WalletNotFound)?;

        if wallet.status == to && to == WalletStatus::Active {
            return Ok(Transition {
                wallet,
                changed: false,
            });
        }

        if !from.contains(&wallet.status) {
            warn!(
                wallet_id = %wallet.id,
                "Rejected transition {:?} -> {:?}",
                wallet.status, to
            );
            return Err(WalletError::WalletNotActive);
        }

        let now = Utc::now();
        tx.set_status(token, to, now).await?;
        tx.commit().await?;

        info!(wallet_id = %wallet.id, "Wallet {:?} -> {:?}", wallet.status, to);

        wallet.status = to;
        wallet.updated_at = Some(now);
        Ok(Transition {
            wallet,
            changed: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use rust_decimal::Decimal;

    async fn created() -> (WalletLifecycle, Arc<MemoryStore>, Wallet) {
        let store = Arc::new(MemoryStore::new());
        let lifecycle = WalletLifecycle::new(store.clone());
        let wallet = lifecycle.create("cust-1").await.unwrap();
        (lifecycle, store, wallet)
    }

    #[tokio::test]
    async fn test_create() {
        let (_, store, wallet) = created().await;
        assert_eq!(wallet.status, WalletStatus::NewlyCreated);
        assert_eq!(wallet.balance, Decimal::ZERO);
        assert_eq!(wallet.token.len(), crate::token::TOKEN_LENGTH);

        let stored = store.find_by_token(&wallet.token).await.unwrap().unwrap();
        assert_eq!(stored, wallet);
    }

    #[tokio::test]
    async fn test_create_requires_owner() {
        let store = Arc::new(MemoryStore::new());
        let lifecycle = WalletLifecycle::new(store);
        assert!(matches!(
            lifecycle.create("  ").await,
            Err(WalletError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_create_twice_for_owner() {
        let (lifecycle, _, _) = created().await;
        assert!(matches!(
            lifecycle.create("cust-1").await,
            Err(WalletError::WalletAlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_enable_disable_enable() {
        let (lifecycle, _, wallet) = created().await;

        let enabled = lifecycle.enable(&wallet.token).await.unwrap();
        assert_eq!(enabled.status, WalletStatus::Active);
        assert!(enabled.updated_at.is_some());

        let disabled = lifecycle.disable(&wallet.token, true).await.unwrap();
        assert_eq!(disabled.status, WalletStatus::Inactive);

        let enabled = lifecycle.enable(&wallet.token).await.unwrap();
        assert_eq!(enabled.status, WalletStatus::Active);
    }

    #[tokio::test]
    async fn test_enable_active_is_noop() {
        let (lifecycle, store, wallet) = created().await;
        let first = lifecycle.enable(&wallet.token).await.unwrap();
        let second = lifecycle.enable(&wallet.token).await.unwrap();

        assert_eq!(second.status, WalletStatus::Active);
        assert_eq!(second.updated_at, first.updated_at);
        let stored = store.find_by_token(&wallet.token).await.unwrap().unwrap();
        assert_eq!(stored.updated_at, first.updated_at);
    }

    #[tokio::test]
    async fn test_enable_transition_reports_change() {
        let (lifecycle, _, wallet) = created().await;

        let first = lifecycle.enable_transition(&wallet.token).await.unwrap();
        assert!(first.changed);
        assert_eq!(first.wallet.status, WalletStatus::Active);

        let second = lifecycle.enable_transition(&wallet.token).await.unwrap();
        assert!(!second.changed);
        assert_eq!(second.wallet, first.wallet);

        lifecycle.disable(&wallet.token, true).await.unwrap();
        assert!(lifecycle.enable_transition(&wallet.token).await.unwrap().changed);
    }

    #[tokio::test]
    async fn test_disable_requires_confirmation() {
        let (lifecycle, store, wallet) = created().await;
        lifecycle.enable(&wallet.token).await.unwrap();

        assert!(matches!(
            lifecycle.disable(&wallet.token, false).await,
            Err(WalletError::Validation(_))
        ));
        let stored = store.find_by_token(&wallet.token).await.unwrap().unwrap();
        assert_eq!(stored.status, WalletStatus::Active);
    }

    #[tokio::test]
    async fn test_disable_requires_active() {
        let (lifecycle, _, wallet) = created().await;
        assert!(matches!(
            lifecycle.disable(&wallet.token, true).await,
            Err(WalletError::WalletNotActive)
        ));
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let (lifecycle, _, _) = created().await;
        assert!(matches!(
            lifecycle.enable("nope").await,
            Err(WalletError::WalletNotFound)
        ));
    }

    #[test]
    fn test_ensure_active() {
        let mut wallet = Wallet::new("o", "t");
        assert!(matches!(ensure_active(&wallet), Err(WalletError::WalletNotActive)));
        wallet.status = WalletStatus::Active;
        assert!(ensure_active(&wallet).is_ok());
        wallet.status = WalletStatus::Inactive;
        assert!(ensure_active(&wallet).is_err());
    }
}
