use crate::models::{Envelope, ErrorBody};
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;
use wallet_core::WalletError;

pub type Result<T> = std::result::Result<T, WalletApiError>;

#[derive(Error, Debug)]
pub enum WalletApiError {
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("Invalid request header: {0}")]
    BadHeader(String),

    #[error("Invalid request body: {0}")]
    BadForm(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ResponseError for WalletApiError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(Envelope::<ErrorBody>::fail(self.to_string()))
    }

    /// Caller mistakes are 400; everything else, wallet state included, is 500
    fn status_code(&self) -> StatusCode {
        match self {
            WalletApiError::Wallet(e) if e.is_validation() => StatusCode::BAD_REQUEST,
            WalletApiError::Wallet(_) => StatusCode::INTERNAL_SERVER_ERROR,
            WalletApiError::BadHeader(_) => StatusCode::BAD_REQUEST,
            WalletApiError::BadForm(_) => StatusCode::BAD_REQUEST,
            WalletApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl WalletApiError {
    pub fn error_type(&self) -> &'static str {
        match self {
            WalletApiError::Wallet(e) => e.kind(),
            WalletApiError::BadHeader(_) => "bad_header",
            WalletApiError::BadForm(_) => "bad_form",
            WalletApiError::Internal(_) => "internal_error",
        }
    }
}
