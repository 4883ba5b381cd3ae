//! Signed token generation and inspection
//!
//! A [`TokenProvider`] turns an [`Account`] into an opaque, signed token and
//! back without contacting the account store. The only implementation is
//! [`jwt::JwtProvider`], which signs RS256 JWTs.

pub mod jwt;

pub use jwt::{JwtProvider, KeyPair};

use crate::error::Result;
use crate::types::Account;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Signed token produced by a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Opaque token string
    pub token: String,
    pub created: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
}

/// Generates and inspects self-contained account tokens
pub trait TokenProvider: Send + Sync {
    /// Sign a token for the account, valid for `expiry`
    ///
    /// Fails with [`AuthError::EncodingToken`](crate::AuthError::EncodingToken).
    fn generate(&self, account: &Account, expiry: Duration) -> Result<Token>;

    /// Recover the account a token was generated for
    ///
    /// Fails with [`AuthError::InvalidToken`](crate::AuthError::InvalidToken)
    /// for malformed, wrongly signed and expired tokens alike.
    fn inspect(&self, token: &str) -> Result<Account>;

    /// Provider name
    fn name(&self) -> &'static str;
}

/// Whether `token` has the `header.claims.signature` shape a local provider
/// can verify
///
/// Only the shape is checked. Tokens from other providers are opaque and
/// must go to the account store.
pub fn is_locally_verifiable(token: &str) -> bool {
    let mut segments = 0;
    for part in token.split('.') {
        if part.is_empty() {
            return false;
        }
        segments += 1;
    }
    segments == 3
}
