//! Wallet token issuance
//!
//! Tokens are 20 bytes from the OS CSPRNG, hex-encoded to 40 characters.

use crate::error::{Result, WalletError};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::error;

/// Random bytes per token
pub const TOKEN_BYTES: usize = 20;

/// Hex length of an issued token
pub const TOKEN_LENGTH: usize = TOKEN_BYTES * 2;

/// Issues unguessable bearer tokens
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenIssuer;

impl TokenIssuer {
    pub fn new() -> Self {
        Self
    }

    /// Issue a token from the OS randomness source
    pub fn issue(&self) -> Result<String> {
        self.issue_from(&mut OsRng)
    }

    /// Issue a token from the given randomness source
    pub fn issue_from<R: RngCore + ?Sized>(&self, rng: &mut R) -> Result<String> {
        let mut bytes = [0u8; TOKEN_BYTES];
        rng.try_fill_bytes(&mut bytes).map_err(|e| {
            error!("Randomness source failed: {}", e);
            WalletError::TokenGeneration(e.to_string())
        })?;

        Ok(hex::encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
            Err(rand::Error::new(std::io::Error::new(
                std::io::ErrorKind::Other,
                "entropy unavailable",
            )))
        }
    }

    #[test]
    fn test_token_format() {
        let token = TokenIssuer::new().issue().unwrap();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_tokens_are_unique() {
        let issuer = TokenIssuer::new();
        let tokens: HashSet<String> = (0..1000).map(|_| issuer.issue().unwrap()).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn test_randomness_failure() {
        let result = TokenIssuer::new().issue_from(&mut BrokenRng);
        assert!(matches!(result, Err(WalletError::TokenGeneration(_))));
    }
}
