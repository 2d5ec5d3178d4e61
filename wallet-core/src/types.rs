//! Core types for the wallet ledger
//!
//! Statuses and actions are closed enums. Their integer codes exist only for
//! persistence; conversions from stored integers are fallible so an out-of-range
//! value is rejected at the storage boundary.

use crate::error::{Result, WalletError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Wallet status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WalletStatus {
    /// Disabled by the owner
    Inactive,
    /// Created, never enabled
    NewlyCreated,
    /// Enabled; the only status that allows balance reads and mutations
    Active,
}

impl WalletStatus {
    /// Persisted code
    pub fn as_code(&self) -> i16 {
        match self {
            WalletStatus::Inactive => 0,
            WalletStatus::NewlyCreated => 1,
            WalletStatus::Active => 2,
        }
    }

    /// Display label used in API responses
    pub fn label(&self) -> &'static str {
        match self {
            WalletStatus::Inactive => "disabled",
            WalletStatus::NewlyCreated => "created",
            WalletStatus::Active => "enabled",
        }
    }
}

impl TryFrom<i16> for WalletStatus {
    type Error = WalletError;

    fn try_from(code: i16) -> Result<Self> {
        match code {
            0 => Ok(WalletStatus::Inactive),
            1 => Ok(WalletStatus::NewlyCreated),
            2 => Ok(WalletStatus::Active),
            other => Err(WalletError::CorruptRecord(format!(
                "unknown wallet status code {}",
                other
            ))),
        }
    }
}

impl fmt::Display for WalletStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Balance-changing action recorded by a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationAction {
    /// Funds added
    Deposit,
    /// Funds removed
    Withdraw,
}

impl MutationAction {
    /// Persisted code
    pub fn as_code(&self) -> i16 {
        match self {
            MutationAction::Deposit => 1,
            MutationAction::Withdraw => 2,
        }
    }

    /// Display label used in API responses
    pub fn label(&self) -> &'static str {
        match self {
            MutationAction::Deposit => "deposit",
            MutationAction::Withdraw => "withdrawal",
        }
    }
}

impl TryFrom<i16> for MutationAction {
    type Error = WalletError;

    fn try_from(code: i16) -> Result<Self> {
        match code {
            1 => Ok(MutationAction::Deposit),
            2 => Ok(MutationAction::Withdraw),
            other => Err(WalletError::CorruptRecord(format!(
                "unknown mutation action code {}",
                other
            ))),
        }
    }
}

impl fmt::Display for MutationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Recorded outcome of a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationStatus {
    /// Applied to the balance
    Success,
    /// Reserved in the schema; the engine never persists it
    Failed,
}

impl MutationStatus {
    /// Persisted code
    pub fn as_code(&self) -> i16 {
        match self {
            MutationStatus::Success => 1,
            MutationStatus::Failed => 2,
        }
    }

    /// Display label used in API responses
    pub fn label(&self) -> &'static str {
        match self {
            MutationStatus::Success => "success",
            MutationStatus::Failed => "fail",
        }
    }
}

impl TryFrom<i16> for MutationStatus {
    type Error = WalletError;

    fn try_from(code: i16) -> Result<Self> {
        match code {
            1 => Ok(MutationStatus::Success),
            2 => Ok(MutationStatus::Failed),
            other => Err(WalletError::CorruptRecord(format!(
                "unknown mutation status code {}",
                other
            ))),
        }
    }
}

/// A per-owner wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    /// Unique wallet id
    pub id: Uuid,

    /// External customer id, one wallet per owner
    pub owner: String,

    /// Bearer credential, sole lookup key
    pub token: String,

    /// Lifecycle status
    pub status: WalletStatus,

    /// Current balance, never negative
    pub balance: Decimal,

    /// Last status or balance change, `None` until the first one
    pub updated_at: Option<DateTime<Utc>>,
}

impl Wallet {
    /// New wallet in `NewlyCreated` status with zero balance
    pub fn new(owner: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            token: token.into(),
            status: WalletStatus::NewlyCreated,
            balance: Decimal::ZERO,
            updated_at: None,
        }
    }

    /// Whether balance reads and mutations are allowed
    pub fn is_active(&self) -> bool {
        self.status == WalletStatus::Active
    }
}

/// Immutable ledger entry for one committed balance change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    /// Unique mutation id
    pub id: Uuid,

    /// Caller-supplied correlation id, unique per owner
    pub reference_id: String,

    /// Commit time
    pub created_at: DateTime<Utc>,

    /// Wallet owner (denormalized)
    pub owner: String,

    /// Deposit or withdraw
    pub action: MutationAction,

    /// Recorded outcome
    pub status: MutationStatus,

    /// Amount moved, always positive
    pub amount: Decimal,
}

impl Mutation {
    /// Successful mutation stamped at `at`
    pub fn success(
        owner: impl Into<String>,
        reference_id: impl Into<String>,
        action: MutationAction,
        amount: Decimal,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            reference_id: reference_id.into(),
            created_at: at,
            owner: owner.into(),
            action,
            status: MutationStatus::Success,
            amount,
        }
    }

    /// Signed effect on the balance
    pub fn signed_amount(&self) -> Decimal {
        match self.action {
            MutationAction::Deposit => self.amount,
            MutationAction::Withdraw => -self.amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_wallet_status_codes() {
        for status in [
            WalletStatus::Inactive,
            WalletStatus::NewlyCreated,
            WalletStatus::Active,
        ] {
            assert_eq!(WalletStatus::try_from(status.as_code()).unwrap(), status);
        }
        assert_eq!(WalletStatus::Inactive.as_code(), 0);
        assert_eq!(WalletStatus::Active.as_code(), 2);
    }

    #[test]
    fn test_out_of_range_codes_rejected() {
        assert!(matches!(
            WalletStatus::try_from(3),
            Err(WalletError::CorruptRecord(_))
        ));
        assert!(matches!(
            MutationAction::try_from(0),
            Err(WalletError::CorruptRecord(_))
        ));
        assert!(matches!(
            MutationStatus::try_from(-1),
            Err(WalletError::CorruptRecord(_))
        ));
    }

    #[test]
    fn test_labels() {
        assert_eq!(WalletStatus::Active.label(), "enabled");
        assert_eq!(WalletStatus::Inactive.label(), "disabled");
        assert_eq!(MutationAction::Withdraw.label(), "withdrawal");
        assert_eq!(MutationStatus::Success.label(), "success");
    }

    #[test]
    fn test_new_wallet() {
        let wallet = Wallet::new("cust-1", "abc");
        assert_eq!(wallet.status, WalletStatus::NewlyCreated);
        assert_eq!(wallet.balance, Decimal::ZERO);
        assert!(wallet.updated_at.is_none());
        assert!(!wallet.is_active());
    }

    #[test]
    fn test_signed_amount() {
        let now = Utc::now();
        let deposit = Mutation::success("o", "r1", MutationAction::Deposit, dec!(10.5), now);
        let withdraw = Mutation::success("o", "r2", MutationAction::Withdraw, dec!(4), now);
        assert_eq!(deposit.signed_amount(), dec!(10.5));
        assert_eq!(withdraw.signed_amount(), dec!(-4));
        assert_eq!(deposit.status, MutationStatus::Success);
    }
}
