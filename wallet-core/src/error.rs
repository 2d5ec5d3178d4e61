//! Error types for the wallet ledger

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type for wallet operations
pub type Result<T> = std::result::Result<T, WalletError>;

/// Wallet ledger errors
#[derive(Error, Debug)]
pub enum WalletError {
    /// Malformed or missing input, rejected before touching the store
    #[error("Validation error: {0}")]
    Validation(String),

    /// Amount is zero or negative
    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// No wallet is registered under the token
    #[error("Wallet not found")]
    WalletNotFound,

    /// Wallet status does not allow the operation
    #[error("Wallet is not active")]
    WalletNotActive,

    /// Withdrawal larger than the current balance
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        /// Requested amount
        required: Decimal,
        /// Balance at the time of the check
        available: Decimal,
    },

    /// New balance is not representable exactly
    #[error("Balance overflow: {amount} cannot be applied to {balance} exactly")]
    BalanceOverflow {
        /// Balance before the mutation
        balance: Decimal,
        /// Requested amount
        amount: Decimal,
    },

    /// Reference id already used by this owner
    #[error("Duplicate reference id: {0}")]
    DuplicateReference(String),

    /// Owner already has a wallet
    #[error("Wallet already exists for owner: {0}")]
    WalletAlreadyExists(String),

    /// Randomness source failed while issuing a token
    #[error("Token generation failed: {0}")]
    TokenGeneration(String),

    /// Transaction or connectivity failure
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    /// Persisted record holds a value outside its domain
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),
}

impl WalletError {
    /// True for errors caused by the caller's input rather than wallet state or the store
    pub fn is_validation(&self) -> bool {
        matches!(self, WalletError::Validation(_) | WalletError::InvalidAmount(_))
    }

    /// Short machine-readable label, used for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            WalletError::Validation(_) => "validation",
            WalletError::InvalidAmount(_) => "invalid_amount",
            WalletError::WalletNotFound => "not_found",
            WalletError::WalletNotActive => "not_active",
            WalletError::InsufficientFunds { .. } => "insufficient_funds",
            WalletError::BalanceOverflow { .. } => "balance_overflow",
            WalletError::DuplicateReference(_) => "duplicate_reference",
            WalletError::WalletAlreadyExists(_) => "duplicate_wallet",
            WalletError::TokenGeneration(_) => "token_generation",
            WalletError::Store(_) => "store",
            WalletError::CorruptRecord(_) => "corrupt_record",
        }
    }
}
