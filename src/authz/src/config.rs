//! Auth configuration loading and validation

use crate::error::{AuthError, Result};
use crate::token::KeyPair;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Complete auth configuration
#[derive(Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Namespace this process belongs to
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Public key (PEM or base64 PEM) for verifying tokens locally
    #[serde(default)]
    pub public_key: Option<String>,

    /// Private key (PEM or base64 PEM) for signing tokens locally
    #[serde(default)]
    pub private_key: Option<String>,

    /// Service account id used when a refresh token is rejected
    #[serde(default)]
    pub id: Option<String>,

    /// Service account secret
    #[serde(default)]
    pub secret: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    #[serde(default)]
    pub cache: CacheSection,

    #[serde(default)]
    pub refresh: RefreshSection,

    #[serde(default)]
    pub tokens: TokensSection,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheSection {
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RefreshSection {
    #[serde(default = "default_refresh_interval")]
    pub interval_secs: u64,
    #[serde(default = "default_refresh_window")]
    pub window_secs: u64,
    #[serde(default = "default_refreshed_token_expiry")]
    pub token_expiry_secs: u64,
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokensSection {
    /// Lifetime of the self-signed secret of locally generated accounts
    #[serde(default = "default_account_expiry")]
    pub account_expiry_secs: u64,
    /// Lifetime of access tokens when the caller gives none
    #[serde(default = "default_token_expiry")]
    pub default_expiry_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self { ttl_secs: default_cache_ttl() }
    }
}

impl Default for RefreshSection {
    fn default() -> Self {
        Self {
            interval_secs: default_refresh_interval(),
            window_secs: default_refresh_window(),
            token_expiry_secs: default_refreshed_token_expiry(),
            max_backoff_secs: default_max_backoff(),
            max_failures: default_max_failures(),
        }
    }
}

impl Default for TokensSection {
    fn default() -> Self {
        Self {
            account_expiry_secs: default_account_expiry(),
            default_expiry_secs: default_token_expiry(),
        }
    }
}

// Default value functions
fn default_issuer() -> String { "micro".to_string() }
fn default_request_timeout() -> u64 { 5_000 }
fn default_cache_ttl() -> u64 { 120 }
fn default_refresh_interval() -> u64 { 15 }
fn default_refresh_window() -> u64 { 60 }
fn default_refreshed_token_expiry() -> u64 { 600 }
fn default_max_backoff() -> u64 { 300 }
fn default_max_failures() -> u32 { 10 }
fn default_account_expiry() -> u64 { 365 * 24 * 60 * 60 }
fn default_token_expiry() -> u64 { 60 }

/// Longest duration any setting may hold, one hundred years
pub const MAX_DURATION_SECS: i64 = 100 * 365 * 24 * 60 * 60;

/// Seconds as a chrono duration, saturating at [`MAX_DURATION_SECS`]
fn chrono_secs(secs: u64) -> chrono::Duration {
    let secs = i64::try_from(secs).map_or(MAX_DURATION_SECS, |s| s.min(MAX_DURATION_SECS));
    chrono::Duration::seconds(secs)
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: default_issuer(),
            public_key: None,
            private_key: None,
            id: None,
            secret: None,
            request_timeout_ms: default_request_timeout(),
            cache: CacheSection::default(),
            refresh: RefreshSection::default(),
            tokens: TokensSection::default(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("issuer", &self.issuer)
            .field("keys", &self.key_pair())
            .field("id", &self.id)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("cache", &self.cache)
            .field("refresh", &self.refresh)
            .field("tokens", &self.tokens)
            .finish()
    }
}

impl AuthConfig {
    /// Configuration for the given namespace with every other value defaulted
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            ..Default::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate TOML configuration
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AuthConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_keys(mut self, public_key: Option<String>, private_key: Option<String>) -> Self {
        self.public_key = public_key;
        self.private_key = private_key;
        self
    }

    pub fn with_credentials(mut self, id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self.secret = Some(secret.into());
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.issuer.trim().is_empty() {
            return Err(AuthError::Config("issuer must not be empty".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(AuthError::Config("request_timeout_ms must be positive".to_string()));
        }
        if self.refresh.interval_secs == 0 {
            return Err(AuthError::Config("refresh.interval_secs must be positive".to_string()));
        }
        if self.refresh.max_backoff_secs < self.refresh.interval_secs {
            return Err(AuthError::Config(
                "refresh.max_backoff_secs must be at least refresh.interval_secs".to_string(),
            ));
        }
        if self.refresh.max_failures == 0 {
            return Err(AuthError::Config("refresh.max_failures must be positive".to_string()));
        }
        if self.tokens.default_expiry_secs == 0 || self.tokens.account_expiry_secs == 0 {
            return Err(AuthError::Config("token expiries must be positive".to_string()));
        }

        let durations = [
            ("request_timeout_ms", self.request_timeout_ms / 1_000),
            ("cache.ttl_secs", self.cache.ttl_secs),
            ("refresh.interval_secs", self.refresh.interval_secs),
            ("refresh.window_secs", self.refresh.window_secs),
            ("refresh.token_expiry_secs", self.refresh.token_expiry_secs),
            ("refresh.max_backoff_secs", self.refresh.max_backoff_secs),
            ("tokens.account_expiry_secs", self.tokens.account_expiry_secs),
            ("tokens.default_expiry_secs", self.tokens.default_expiry_secs),
        ];
        for (name, secs) in durations {
            if i64::try_from(secs).map_or(true, |s| s > MAX_DURATION_SECS) {
                return Err(AuthError::Config(format!(
                    "{} exceeds the maximum of {} seconds",
                    name, MAX_DURATION_SECS
                )));
            }
        }
        Ok(())
    }

    pub fn key_pair(&self) -> KeyPair {
        KeyPair::new(self.public_key.clone(), self.private_key.clone())
    }

    /// Service credentials, when both parts are configured
    pub fn credentials(&self) -> Option<(String, String)> {
        match (&self.id, &self.secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some((id.clone(), secret.clone()))
            }
            _ => None,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn rule_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh.interval_secs)
    }

    pub fn refresh_window(&self) -> chrono::Duration {
        chrono_secs(self.refresh.window_secs)
    }

    pub fn refreshed_token_expiry(&self) -> chrono::Duration {
        chrono_secs(self.refresh.token_expiry_secs)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.refresh.max_backoff_secs)
    }

    pub fn account_expiry(&self) -> chrono::Duration {
        chrono_secs(self.tokens.account_expiry_secs)
    }

    pub fn default_token_expiry(&self) -> chrono::Duration {
        chrono_secs(self.tokens.default_expiry_secs)
    }
}
