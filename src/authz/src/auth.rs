//! Auth facade
//!
//! Orchestrates the token provider, the rule cache and the remote rule and
//! account stores. Operations take a local fast path whenever the configured
//! keys allow it and fall back to the account store otherwise.
//!
//! # Architecture
//!
//! ```text
//! verify  → RuleCache ──miss──→ RuleStore.list
//!              ↓
//!          rules::verify_access
//!
//! generate / token → JwtProvider (private key) ──or──→ AccountStore
//! inspect          → JwtProvider (public key)  ──or──→ AccountStore
//! grant / revoke   → RuleStore.create/delete ──spawn──→ cache refresh
//! ```

use crate::cache::RuleCache;
use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::options::{GenerateOptions, TokenOptions, VerifyOptions};
use crate::rules::verify_access;
use crate::store::{AccountStore, GenerateRequest, RuleStore, TokenRequest};
use crate::token::{is_locally_verifiable, JwtProvider, TokenProvider};
use crate::types::{Account, AccountToken, Resource, Rule};

use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Authentication and authorization facade
///
/// Constructed once per process and shared by reference (usually inside an
/// `Arc`). Every method takes `&self` and may be called concurrently.
pub struct Auth {
    config: AuthConfig,
    provider: JwtProvider,
    rule_store: Arc<dyn RuleStore>,
    account_store: Arc<dyn AccountStore>,
    cache: Arc<RuleCache>,
    token: RwLock<Option<AccountToken>>,
}

impl Auth {
    /// Create the facade
    ///
    /// # Errors
    ///
    /// * `Config` - the configuration or the public key is invalid
    /// * `EncodingToken` - the private key cannot be decoded
    pub fn new(
        config: AuthConfig,
        rule_store: Arc<dyn RuleStore>,
        account_store: Arc<dyn AccountStore>,
    ) -> Result<Self> {
        config.validate()?;

        let provider = JwtProvider::new(&config.key_pair())?;
        let cache = Arc::new(RuleCache::new(config.rule_cache_ttl()));

        info!(
            "Auth initialized with issuer={}, local_signing={}, local_verification={}",
            config.issuer,
            provider.can_sign(),
            provider.can_verify()
        );

        Ok(Self {
            config,
            provider,
            rule_store,
            account_store,
            cache,
            token: RwLock::new(None),
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Namespace this facade issues for
    pub fn issuer(&self) -> &str {
        &self.config.issuer
    }

    pub fn cache(&self) -> &RuleCache {
        &self.cache
    }

    /// Generate a new account
    ///
    /// With a private key the account is built locally and its `secret` is a
    /// self-signed token valid for a year, usable as a credential in
    /// [`token`](Self::token). Otherwise the account store creates it.
    pub async fn generate(&self, id: &str, options: GenerateOptions) -> Result<Account> {
        let issuer = self.resolve_issuer(&options.issuer);

        if self.provider.can_sign() {
            let mut account = Account {
                id: id.to_string(),
                account_type: options.account_type,
                issuer,
                metadata: options.metadata,
                scopes: options.scopes,
                secret: String::new(),
                name: options.name,
            };

            let token = self.provider.generate(&account, self.config.account_expiry())?;
            account.secret = token.token;

            debug!(account = %account.id, issuer = %account.issuer, "Generated account locally");
            return Ok(account);
        }

        let request = GenerateRequest {
            id: id.to_string(),
            account_type: options.account_type,
            secret: options.secret,
            scopes: options.scopes,
            metadata: options.metadata,
            provider: options.provider,
            issuer,
            name: options.name,
        };

        debug!(account = %request.id, "Generating account via account store");
        self.remote(self.account_store.generate(request)).await
    }

    /// Issue an access token from credentials or a refresh token
    ///
    /// When the credential is a locally signed token and a private key is
    /// configured, the token is refreshed without a network call and the
    /// credential is echoed back as the refresh token.
    pub async fn token(&self, options: TokenOptions) -> Result<AccountToken> {
        let issuer = self.resolve_issuer(&options.issuer);
        let expiry = options
            .expiry
            .unwrap_or_else(|| self.config.default_token_expiry());
        let credential = options.credential();

        if self.provider.can_sign() && is_locally_verifiable(credential) {
            let account = self.provider.inspect(credential)?;
            let token = self.provider.generate(&account, expiry)?;

            debug!(account = %account.id, "Issued access token locally");
            return Ok(AccountToken {
                access_token: token.token,
                refresh_token: credential.to_string(),
                created: token.created,
                expiry: token.expiry,
            });
        }

        let request = TokenRequest {
            id: options.id.clone(),
            secret: options.secret.clone(),
            refresh_token: options.refresh_token.clone(),
            expiry_secs: expiry.num_seconds(),
            issuer,
        };

        debug!("Requesting access token from account store");
        match self.remote(self.account_store.token(request)).await {
            Err(AuthError::Remote(err)) if err.is_invalid_token() => Err(AuthError::InvalidToken),
            other => other,
        }
    }

    /// Verify an account has access to a resource using the namespace's rules
    pub async fn verify(
        &self,
        account: Option<&Account>,
        resource: &Resource,
        options: VerifyOptions,
    ) -> Result<()> {
        let namespace = options
            .namespace
            .filter(|ns| !ns.is_empty())
            .unwrap_or_else(|| self.config.issuer.clone());

        let rules = self.rules(&namespace).await?;
        verify_access(&rules, account, resource, &namespace)
    }

    /// Resolve the account a token belongs to
    pub async fn inspect(&self, token: &str) -> Result<Account> {
        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        if self.provider.can_verify() && is_locally_verifiable(token) {
            debug!("Inspecting token locally");
            return self.provider.inspect(token);
        }

        debug!("Inspecting token via account store");
        self.remote(self.account_store.inspect(token, &self.config.issuer))
            .await
    }

    /// Grant access to a resource
    ///
    /// The rule cache of the issuer namespace is refreshed in the background;
    /// reads right after this call may still see the previous rules.
    pub async fn grant(&self, rule: Rule) -> Result<()> {
        let namespace = self.config.issuer.clone();
        let result = self
            .remote(self.rule_store.create(rule, &namespace))
            .await;
        self.schedule_rules_refresh(namespace);
        result
    }

    /// Revoke a rule
    pub async fn revoke(&self, rule: &Rule) -> Result<()> {
        let namespace = self.config.issuer.clone();
        let result = self
            .remote(self.rule_store.delete(&rule.id, &namespace))
            .await;
        self.schedule_rules_refresh(namespace);
        result
    }

    /// Rules of a namespace, from the cache when fresh
    pub async fn rules(&self, namespace: &str) -> Result<Arc<Vec<Rule>>> {
        if let Some(rules) = self.cache.get(namespace) {
            debug!(namespace, "Rule cache hit");
            return Ok(rules);
        }

        debug!(namespace, "Rule cache miss");
        refresh_rules(
            self.rule_store.as_ref(),
            &self.cache,
            namespace,
            self.config.request_timeout(),
        )
        .await
    }

    /// Replace the held access token
    pub fn set_token(&self, token: AccountToken) {
        *self.token.write() = Some(token);
    }

    /// The held access token, if any
    pub fn current_token(&self) -> Option<AccountToken> {
        self.token.read().clone()
    }

    /// Service credentials from the configuration
    pub fn credentials(&self) -> Option<(String, String)> {
        self.config.credentials()
    }

    /// Spawn a detached refresh of a namespace's cached rules
    fn schedule_rules_refresh(&self, namespace: String) {
        let store = Arc::clone(&self.rule_store);
        let cache = Arc::clone(&self.cache);
        let timeout = self.config.request_timeout();

        tokio::spawn(async move {
            if let Err(e) = refresh_rules(store.as_ref(), &cache, &namespace, timeout).await {
                error!(namespace = %namespace, "Error refreshing rules cache: {}", e);
            }
        });
    }

    fn resolve_issuer(&self, issuer: &str) -> String {
        if issuer.is_empty() {
            self.config.issuer.clone()
        } else {
            issuer.to_string()
        }
    }

    async fn remote<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        with_timeout(self.config.request_timeout(), call).await
    }
}

/// Fetch a namespace's rules from the store and cache them
async fn refresh_rules(
    store: &dyn RuleStore,
    cache: &RuleCache,
    namespace: &str,
    timeout: Duration,
) -> Result<Arc<Vec<Rule>>> {
    let rules = with_timeout(timeout, store.list(namespace)).await?;
    debug!(namespace, count = rules.len(), "Refreshed rules cache");
    Ok(cache.put(namespace, rules))
}

async fn with_timeout<T, F>(timeout: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(AuthError::Timeout(timeout)),
    }
}
