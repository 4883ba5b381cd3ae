//! RS256 JSON Web Token provider

use super::{is_locally_verifiable, Token, TokenProvider};
use crate::error::{AuthError, Result};
use crate::types::Account;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

const PEM_HEADER: &str = "-----BEGIN";

/// Claims embedded in every token
#[derive(Debug, Serialize, Deserialize)]
struct AuthClaims {
    #[serde(rename = "type", default)]
    account_type: String,
    #[serde(default)]
    scopes: Option<Vec<String>>,
    #[serde(default)]
    metadata: Option<HashMap<String, String>>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    sub: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    iss: String,
    exp: i64,
    #[serde(default)]
    iat: i64,
}

/// Key material for signing and verifying tokens
///
/// Each key is PEM text, or PEM text encoded with standard base64 (the form
/// keys usually take in environment variables).
#[derive(Clone, Default)]
pub struct KeyPair {
    /// Verification key
    pub public_key: Option<String>,
    /// Signing key
    pub private_key: Option<String>,
}

impl KeyPair {
    pub fn new(public_key: Option<String>, private_key: Option<String>) -> Self {
        Self {
            public_key: public_key.filter(|k| !k.trim().is_empty()),
            private_key: private_key.filter(|k| !k.trim().is_empty()),
        }
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key.as_ref().map(|_| "<set>"))
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Token provider signing RS256 JWTs
///
/// Keys are decoded once at construction. Without a private key
/// [`generate`](TokenProvider::generate) fails with `EncodingToken`; without a
/// public key [`inspect`](TokenProvider::inspect) fails with `InvalidToken`.
pub struct JwtProvider {
    encoding_key: Option<EncodingKey>,
    decoding_key: Option<DecodingKey>,
    validation: Validation,
}

impl JwtProvider {
    /// Create a provider from the given keys
    ///
    /// # Errors
    ///
    /// * `EncodingToken` - the private key is not a valid RSA PEM
    /// * `Config` - the public key is not a valid RSA PEM
    pub fn new(keys: &KeyPair) -> Result<Self> {
        let encoding_key = match &keys.private_key {
            Some(key) => {
                let pem = decode_pem(key).map_err(|_| AuthError::EncodingToken)?;
                Some(EncodingKey::from_rsa_pem(&pem).map_err(|_| AuthError::EncodingToken)?)
            }
            None => None,
        };

        let decoding_key = match &keys.public_key {
            Some(key) => {
                let pem = decode_pem(key)
                    .map_err(|e| AuthError::Config(format!("public key is not base64: {}", e)))?;
                Some(
                    DecodingKey::from_rsa_pem(&pem)
                        .map_err(|e| AuthError::Config(format!("invalid public key: {}", e)))?,
                )
            }
            None => None,
        };

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = 0;
        validation.validate_aud = false;

        Ok(Self {
            encoding_key,
            decoding_key,
            validation,
        })
    }

    /// Whether tokens can be signed locally
    pub fn can_sign(&self) -> bool {
        self.encoding_key.is_some()
    }

    /// Whether tokens can be verified locally
    pub fn can_verify(&self) -> bool {
        self.decoding_key.is_some()
    }
}

impl fmt::Debug for JwtProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtProvider")
            .field("can_sign", &self.can_sign())
            .field("can_verify", &self.can_verify())
            .finish()
    }
}

impl TokenProvider for JwtProvider {
    fn generate(&self, account: &Account, expiry: Duration) -> Result<Token> {
        let key = self.encoding_key.as_ref().ok_or(AuthError::EncodingToken)?;

        // unnamed accounts carry their id as the name
        let name = if account.name.is_empty() {
            account.id.clone()
        } else {
            account.name.clone()
        };

        let created = Utc::now();
        let expires_at = created
            .checked_add_signed(expiry)
            .ok_or(AuthError::EncodingToken)?;

        let claims = AuthClaims {
            account_type: account.account_type.clone(),
            scopes: Some(account.scopes.clone()),
            metadata: Some(account.metadata.clone()),
            name,
            sub: account.id.clone(),
            iss: account.issuer.clone(),
            exp: expires_at.timestamp(),
            iat: created.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::RS256), &claims, key)
            .map_err(|_| AuthError::EncodingToken)?;

        Ok(Token {
            token,
            created,
            expiry: expires_at,
        })
    }

    fn inspect(&self, token: &str) -> Result<Account> {
        if !is_locally_verifiable(token) {
            return Err(AuthError::InvalidToken);
        }
        let key = self.decoding_key.as_ref().ok_or(AuthError::InvalidToken)?;

        let data = decode::<AuthClaims>(token, key, &self.validation)
            .map_err(|_| AuthError::InvalidToken)?;
        let claims = data.claims;

        let name = if claims.name.is_empty() {
            claims.sub.clone()
        } else {
            claims.name
        };

        Ok(Account {
            id: claims.sub,
            account_type: claims.account_type,
            issuer: claims.iss,
            metadata: claims.metadata.unwrap_or_default(),
            scopes: claims.scopes.unwrap_or_default(),
            secret: String::new(),
            name,
        })
    }

    fn name(&self) -> &'static str {
        "jwt"
    }
}

/// PEM bytes from PEM text or base64-encoded PEM
fn decode_pem(key: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let key = key.trim();
    if key.starts_with(PEM_HEADER) {
        Ok(key.as_bytes().to_vec())
    } else {
        STANDARD.decode(key)
    }
}
