//! `Authorization: Token <token>` extraction

use crate::errors::WalletApiError;
use actix_web::{dev::Payload, http::header, FromRequest, HttpRequest};
use std::future::{ready, Ready};

const SCHEME: &str = "Token";

/// Wallet token taken from the request header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletToken(pub String);

impl WalletToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse a header value of the form `Token <token>`
    pub fn parse(value: &str) -> Result<Self, WalletApiError> {
        let mut parts = value.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(SCHEME), Some(token), None) => Ok(WalletToken(token.to_string())),
            _ => Err(WalletApiError::BadHeader(
                "expected 'Authorization: Token <token>'".to_string(),
            )),
        }
    }
}

impl FromRequest for WalletToken {
    type Error = WalletApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = match req.headers().get(header::AUTHORIZATION) {
            Some(value) => value
                .to_str()
                .map_err(|_| WalletApiError::BadHeader("Authorization is not ASCII".to_string()))
                .and_then(WalletToken::parse),
            None => Err(WalletApiError::BadHeader(
                "missing Authorization header".to_string(),
            )),
        };

        if let Err(e) = &result {
            tracing::warn!("Rejected request header: {}", e);
        }

        ready(result)
    }
}
