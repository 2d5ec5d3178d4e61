use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use wallet_core::{Mutation, Wallet, WalletError};

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_FAIL: &str = "fail";

/// Response wrapper shared by every wallet route
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    pub data: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(data: T) -> Self {
        Envelope {
            status: STATUS_SUCCESS.to_string(),
            data,
        }
    }
}

impl Envelope<ErrorBody> {
    pub fn fail(message: impl Into<String>) -> Self {
        Envelope {
            status: STATUS_FAIL.to_string(),
            data: ErrorBody {
                error: message.into(),
            },
        }
    }
}

/// Wallet initialization form
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct InitializeRequest {
    #[validate(required, length(min = 1, max = 255))]
    pub customer_xid: Option<String>,
}

/// Wallet disable form
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct DisableRequest {
    #[validate(required)]
    pub is_disabled: Option<bool>,
}

/// Deposit and withdrawal form
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct MutationRequest {
    #[validate(required, length(min = 1, max = 255))]
    pub reference_id: Option<String>,
    #[validate(required)]
    pub amount: Option<Decimal>,
}

fn invalid(errors: validator::ValidationErrors) -> WalletError {
    WalletError::Validation(errors.to_string())
}

fn missing(field: &str) -> WalletError {
    WalletError::Validation(format!("{} is required", field))
}

impl InitializeRequest {
    pub fn into_customer_id(self) -> Result<String, WalletError> {
        self.validate().map_err(invalid)?;
        self.customer_xid.ok_or_else(|| missing("customer_xid"))
    }
}

impl DisableRequest {
    pub fn into_confirmation(self) -> Result<bool, WalletError> {
        self.validate().map_err(invalid)?;
        self.is_disabled.ok_or_else(|| missing("is_disabled"))
    }
}

impl MutationRequest {
    pub fn into_parts(self) -> Result<(String, Decimal), WalletError> {
        self.validate().map_err(invalid)?;
        let reference_id = self.reference_id.ok_or_else(|| missing("reference_id"))?;
        let amount = self.amount.ok_or_else(|| missing("amount"))?;
        Ok((reference_id, amount))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Wallet as shown to its owner
#[derive(Debug, Serialize, Deserialize)]
pub struct WalletView {
    pub id: Uuid,
    pub owned_by: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_at: Option<DateTime<Utc>>,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

impl WalletView {
    pub fn enabled(wallet: &Wallet) -> Self {
        Self {
            enabled_at: wallet.updated_at,
            disabled_at: None,
            ..Self::base(wallet)
        }
    }

    pub fn disabled(wallet: &Wallet) -> Self {
        Self {
            enabled_at: None,
            disabled_at: wallet.updated_at,
            ..Self::base(wallet)
        }
    }

    fn base(wallet: &Wallet) -> Self {
        Self {
            id: wallet.id,
            owned_by: wallet.owner.clone(),
            status: wallet.status.label().to_string(),
            enabled_at: None,
            disabled_at: None,
            balance: wallet.balance,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WalletResponse {
    pub wallet: WalletView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DepositView {
    pub id: Uuid,
    pub deposited_by: String,
    pub status: String,
    pub deposited_at: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub reference_id: String,
}

impl From<&Mutation> for DepositView {
    fn from(m: &Mutation) -> Self {
        Self {
            id: m.id,
            deposited_by: m.owner.clone(),
            status: m.status.label().to_string(),
            deposited_at: m.created_at,
            amount: m.amount,
            reference_id: m.reference_id.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DepositResponse {
    pub deposit: DepositView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WithdrawalView {
    pub id: Uuid,
    pub withdrawn_by: String,
    pub status: String,
    pub withdrawn_at: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub reference_id: String,
}

impl From<&Mutation> for WithdrawalView {
    fn from(m: &Mutation) -> Self {
        Self {
            id: m.id,
            withdrawn_by: m.owner.clone(),
            status: m.status.label().to_string(),
            withdrawn_at: m.created_at,
            amount: m.amount,
            reference_id: m.reference_id.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WithdrawalResponse {
    pub withdrawal: WithdrawalView,
}

/// One entry of the transaction history
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionView {
    pub id: Uuid,
    pub status: String,
    pub transacted_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub reference_id: String,
}

impl From<&Mutation> for TransactionView {
    fn from(m: &Mutation) -> Self {
        Self {
            id: m.id,
            status: m.status.label().to_string(),
            transacted_at: m.created_at,
            kind: m.action.label().to_string(),
            amount: m.amount,
            reference_id: m.reference_id.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<TransactionView>,
}
