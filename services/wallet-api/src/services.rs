use crate::errors::Result;
use crate::metrics;
use crate::models::{DisableRequest, InitializeRequest, MutationRequest};
use rust_decimal::prelude::ToPrimitive;
use std::sync::Arc;
use tracing::{info, warn};
use wallet_core::{
    LedgerEngine, Mutation, MutationAction, MutationHistory, Wallet, WalletError,
    WalletLifecycle, WalletStatus, WalletStore,
};

/// Request-level façade over lifecycle, ledger and history
pub struct WalletService {
    lifecycle: WalletLifecycle,
    ledger: LedgerEngine,
    history: MutationHistory,
}

impl WalletService {
    pub fn new(store: Arc<dyn WalletStore>) -> Self {
        WalletService {
            lifecycle: WalletLifecycle::new(store.clone()),
            ledger: LedgerEngine::new(store.clone()),
            history: MutationHistory::new(store),
        }
    }

    /// Open a wallet and return its token
    pub async fn initialize(&self, request: InitializeRequest) -> Result<String> {
        let customer_id = request.into_customer_id()?;
        let wallet = self.lifecycle.create(&customer_id).await?;

        metrics::WALLETS_CREATED.inc();
        info!("Initialized wallet {} for customer {}", wallet.id, wallet.owner);

        Ok(wallet.token)
    }

    pub async fn enable(&self, token: &str) -> Result<Wallet> {
        let transition = self.lifecycle.enable_transition(token).await?;
        if transition.changed {
            metrics::STATUS_TRANSITIONS
                .with_label_values(&[WalletStatus::Active.label()])
                .inc();
        }
        Ok(transition.wallet)
    }

    pub async fn disable(&self, token: &str, request: DisableRequest) -> Result<Wallet> {
        let confirmed = request.into_confirmation()?;
        let wallet = self.lifecycle.disable(token, confirmed).await?;
        metrics::STATUS_TRANSITIONS
            .with_label_values(&[WalletStatus::Inactive.label()])
            .inc();
        Ok(wallet)
    }

    pub async fn view_balance(&self, token: &str) -> Result<Wallet> {
        Ok(self.ledger.view_balance(token).await?)
    }

    pub async fn deposit(&self, token: &str, request: MutationRequest) -> Result<Mutation> {
        self.mutate(token, request, MutationAction::Deposit).await
    }

    pub async fn withdraw(&self, token: &str, request: MutationRequest) -> Result<Mutation> {
        self.mutate(token, request, MutationAction::Withdraw).await
    }

    /// Mutation history of the wallet, most recent first
    pub async fn transactions(&self, token: &str) -> Result<Vec<Mutation>> {
        Ok(self.history.list_for_token(token).await?)
    }

    async fn mutate(
        &self,
        token: &str,
        request: MutationRequest,
        action: MutationAction,
    ) -> Result<Mutation> {
        let result = match request.into_parts() {
            Ok((reference_id, amount)) => match action {
                MutationAction::Deposit => self.ledger.deposit(token, &reference_id, amount).await,
                MutationAction::Withdraw => {
                    self.ledger.withdraw(token, &reference_id, amount).await
                }
            },
            Err(e) => Err(e),
        };

        match result {
            Ok(mutation) => {
                metrics::MUTATIONS_TOTAL
                    .with_label_values(&[action.label()])
                    .inc();
                metrics::MUTATION_AMOUNT.observe(mutation.amount.to_f64().unwrap_or_default());
                Ok(mutation)
            }
            Err(e) => {
                record_rejection(action, &e);
                Err(e.into())
            }
        }
    }
}

fn record_rejection(action: MutationAction, error: &WalletError) {
    metrics::MUTATIONS_REJECTED
        .with_label_values(&[action.label(), error.kind()])
        .inc();

    match error {
        WalletError::Store(_) | WalletError::CorruptRecord(_) => {
            tracing::error!("{} failed: {}", action, error)
        }
        _ => warn!("{} rejected: {}", action, error),
    }
}
