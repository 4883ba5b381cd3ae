//! Shared fixtures and test doubles for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use keel_authz::store::{AccountStore, GenerateRequest, RuleStore, TokenRequest};
use keel_authz::{
    Account, AccountToken, Auth, AuthConfig, AuthError, InMemoryRuleStore, Result, Rule,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub const PRIVATE_KEY: &str = include_str!("../fixtures/sample_key");
pub const PUBLIC_KEY: &str = include_str!("../fixtures/sample_key.pub");

/// Route library logs to the test writer, honoring RUST_LOG
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keel_authz=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Config able to sign and verify tokens locally
pub fn local_config(issuer: &str) -> AuthConfig {
    AuthConfig::new(issuer).with_keys(Some(PUBLIC_KEY.to_string()), Some(PRIVATE_KEY.to_string()))
}

/// Rule store counting list calls, optionally failing or stalling them
pub struct CountingRuleStore {
    inner: InMemoryRuleStore,
    lists: AtomicUsize,
    fail_lists: AtomicBool,
    list_delay: Option<std::time::Duration>,
}

impl CountingRuleStore {
    pub fn new(namespace: &str, rules: Vec<Rule>) -> Self {
        Self {
            inner: InMemoryRuleStore::with_rules(namespace, rules),
            lists: AtomicUsize::new(0),
            fail_lists: AtomicBool::new(false),
            list_delay: None,
        }
    }

    pub fn empty() -> Self {
        Self::new("micro", vec![])
    }

    pub fn stalling(delay: std::time::Duration) -> Self {
        Self {
            list_delay: Some(delay),
            ..Self::empty()
        }
    }

    pub fn list_calls(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    pub fn fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RuleStore for CountingRuleStore {
    async fn list(&self, namespace: &str) -> Result<Vec<Rule>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(AuthError::remote("auth.Rules.List", 500, "store unavailable"));
        }
        self.inner.list(namespace).await
    }

    async fn create(&self, rule: Rule, namespace: &str) -> Result<()> {
        self.inner.create(rule, namespace).await
    }

    async fn delete(&self, id: &str, namespace: &str) -> Result<()> {
        self.inner.delete(id, namespace).await
    }
}

/// How the mock account store answers token requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenMode {
    /// Issue a token for every request
    Issue,
    /// Reject refresh tokens as invalid, accept credentials
    RejectRefreshTokens,
    /// Reject everything as invalid
    RejectAll,
    /// Fail with an internal error
    Fail,
}

/// Account store recording every call
pub struct MockAccountStore {
    mode: Mutex<TokenMode>,
    pub generate_requests: Mutex<Vec<GenerateRequest>>,
    pub token_requests: Mutex<Vec<TokenRequest>>,
    pub inspect_requests: Mutex<Vec<(String, String)>>,
    issued: AtomicUsize,
}

impl MockAccountStore {
    pub fn new(mode: TokenMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            generate_requests: Mutex::new(Vec::new()),
            token_requests: Mutex::new(Vec::new()),
            inspect_requests: Mutex::new(Vec::new()),
            issued: AtomicUsize::new(0),
        }
    }

    pub fn set_mode(&self, mode: TokenMode) {
        *self.mode.lock() = mode;
    }

    pub fn calls(&self) -> usize {
        self.generate_requests.lock().len()
            + self.token_requests.lock().len()
            + self.inspect_requests.lock().len()
    }

    fn invalid_token() -> AuthError {
        AuthError::remote("auth.Auth.Token", 401, AuthError::InvalidToken.to_string())
    }
}

impl Default for MockAccountStore {
    fn default() -> Self {
        Self::new(TokenMode::Issue)
    }
}

#[async_trait]
impl AccountStore for MockAccountStore {
    async fn generate(&self, request: GenerateRequest) -> Result<Account> {
        self.generate_requests.lock().push(request.clone());
        Ok(Account {
            id: request.id,
            account_type: request.account_type,
            issuer: request.issuer,
            metadata: request.metadata,
            scopes: request.scopes,
            secret: "remote-secret".to_string(),
            name: request.name,
        })
    }

    async fn token(&self, request: TokenRequest) -> Result<AccountToken> {
        self.token_requests.lock().push(request.clone());

        let mode = *self.mode.lock();
        match mode {
            TokenMode::RejectAll => return Err(Self::invalid_token()),
            TokenMode::RejectRefreshTokens if request.secret.is_empty() => {
                return Err(Self::invalid_token())
            }
            TokenMode::Fail => {
                return Err(AuthError::remote("auth.Auth.Token", 500, "internal error"))
            }
            _ => {}
        }

        let n = self.issued.fetch_add(1, Ordering::SeqCst);
        let created = Utc::now();
        Ok(AccountToken {
            access_token: format!("remote-access-{}", n),
            refresh_token: format!("remote-refresh-{}", n),
            created,
            expiry: created + Duration::seconds(request.expiry_secs),
        })
    }

    async fn inspect(&self, token: &str, issuer: &str) -> Result<Account> {
        self.inspect_requests
            .lock()
            .push((token.to_string(), issuer.to_string()));
        Ok(Account::new("remote").with_issuer(issuer))
    }
}

/// Facade wired to fresh test doubles
pub fn auth_with(
    config: AuthConfig,
    rules: Arc<CountingRuleStore>,
    accounts: Arc<MockAccountStore>,
) -> Arc<Auth> {
    init_tracing();
    Arc::new(Auth::new(config, rules, accounts).expect("valid test config"))
}

/// Poll `condition` until it holds or about a second has passed
pub async fn eventually<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    condition()
}
