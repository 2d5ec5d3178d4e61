//! Ledger engine
//!
//! Applies deposits and withdrawals. Each mutation is one store transaction:
//!
//! 1. lock the wallet row
//! 2. check status, reference id and (for withdrawals) funds
//! 3. append the mutation and write the new balance
//! 4. commit
//!
//! Rejections return before step 3, so nothing is written for them. The engine
//! holds no locks of its own and never retries; the store transaction is the
//! only serialization point.

use crate::error::{Result, WalletError};
use crate::lifecycle::ensure_active;
use crate::storage::WalletStore;
use crate::types::{Mutation, MutationAction, Wallet};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Balance-changing operations and the balance view
#[derive(Clone)]
pub struct LedgerEngine {
    store: Arc<dyn WalletStore>,
}

impl LedgerEngine {
    pub fn new(store: Arc<dyn WalletStore>) -> Self {
        Self { store }
    }

    /// Add `amount` to the wallet balance
    #[instrument(skip(self, token))]
    pub async fn deposit(
        &self,
        token: &str,
        reference_id: &str,
        amount: Decimal,
    ) -> Result<Mutation> {
        self.apply(token, reference_id, MutationAction::Deposit, amount)
            .await
    }

    /// Remove `amount` from the wallet balance; fails if it exceeds the balance
    #[instrument(skip(self, token))]
    pub async fn withdraw(
        &self,
        token: &str,
        reference_id: &str,
        amount: Decimal,
    ) -> Result<Mutation> {
        self.apply(token, reference_id, MutationAction::Withdraw, amount)
            .await
    }

    /// Current wallet state; only active wallets can be viewed
    pub async fn view_balance(&self, token: &str) -> Result<Wallet> {
        let wallet = self
            .store
            .find_by_token(token)
            .await?
            .ok_or(WalletError::WalletNotFound)?;
        ensure_active(&wallet)?;

        Ok(wallet)
    }

    async fn apply(
        &self,
        token: &str,
        reference_id: &str,
        action: MutationAction,
        amount: Decimal,
    ) -> Result<Mutation> {
        validate_request(reference_id, amount)?;

        let mut tx = self.store.begin().await?;
        let wallet = tx
            .lock_wallet(token)
            .await?
            .ok_or(WalletError::WalletNotFound)?;
        ensure_active(&wallet)?;

        if tx.reference_exists(&wallet.owner, reference_id).await? {
            warn!(wallet_id = %wallet.id, reference_id, "Duplicate reference id");
            return Err(WalletError::DuplicateReference(reference_id.to_string()));
        }

        let new_balance = next_balance(wallet.balance, action, amount)?;

        let now = Utc::now();
        let mutation = Mutation::success(&wallet.owner, reference_id, action, amount, now);
        tx.insert_mutation(&mutation).await?;
        tx.set_balance(token, new_balance, now).await?;
        tx.commit().await?;

        info!(
            wallet_id = %wallet.id,
            mutation_id = %mutation.id,
            "{} of {} committed, balance {} -> {}",
            action, amount, wallet.balance, new_balance
        );

        Ok(mutation)
    }
}

fn validate_request(reference_id: &str, amount: Decimal) -> Result<()> {
    if reference_id.trim().is_empty() {
        return Err(WalletError::Validation("reference_id is required".to_string()));
    }
    if amount <= Decimal::ZERO {
        return Err(WalletError::InvalidAmount(amount));
    }
    Ok(())
}

/// Balance after applying `action`, never negative and exact to the last digit
fn next_balance(balance: Decimal, action: MutationAction, amount: Decimal) -> Result<Decimal> {
    let next = match action {
        MutationAction::Deposit => balance.checked_add(amount),
        MutationAction::Withdraw if amount > balance => {
            return Err(WalletError::InsufficientFunds {
                required: amount,
                available: balance,
            })
        }
        MutationAction::Withdraw => balance.checked_sub(amount),
    };

    // Decimal rounds once a result needs more than 28 significant digits
    match next {
        Some(next) if (next - balance).abs() == amount => Ok(next),
        _ => Err(WalletError::BalanceOverflow { balance, amount }),
    }
}
