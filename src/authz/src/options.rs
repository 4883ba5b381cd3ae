//! Per-call options for the auth facade

use chrono::Duration;
use std::collections::HashMap;

/// Options for [`Auth::generate`](crate::Auth::generate)
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub account_type: String,
    pub secret: String,
    pub scopes: Vec<String>,
    pub metadata: HashMap<String, String>,
    pub provider: String,
    /// Namespace minting the account; the facade's issuer when empty
    pub issuer: String,
    pub name: String,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, account_type: impl Into<String>) -> Self {
        self.account_type = account_type.into();
        self
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = secret.into();
        self
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for scope in scopes {
            let scope = scope.into();
            if !self.scopes.contains(&scope) {
                self.scopes.push(scope);
            }
        }
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Options for [`Auth::token`](crate::Auth::token)
///
/// Either credentials (`id` + `secret`) or a refresh token. When both are
/// set the secret wins.
#[derive(Debug, Clone, Default)]
pub struct TokenOptions {
    pub id: String,
    pub secret: String,
    pub refresh_token: String,
    /// Lifetime of the access token; the configured default when unset
    pub expiry: Option<Duration>,
    /// Namespace issuing the token; the facade's issuer when empty
    pub issuer: String,
}

impl TokenOptions {
    /// Exchange account credentials
    pub fn credentials(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Exchange a refresh token
    pub fn refresh(refresh_token: impl Into<String>) -> Self {
        Self {
            refresh_token: refresh_token.into(),
            ..Default::default()
        }
    }

    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = Some(expiry);
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Token presented to the provider: the secret if set, else the refresh token
    pub fn credential(&self) -> &str {
        if self.secret.is_empty() {
            &self.refresh_token
        } else {
            &self.secret
        }
    }
}

/// Options for [`Auth::verify`](crate::Auth::verify)
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    /// Namespace whose rules apply; the facade's issuer when unset
    pub namespace: Option<String>,
}

impl VerifyOptions {
    pub fn namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
        }
    }
}
