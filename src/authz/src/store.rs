//! Remote rule and account stores
//!
//! The facade talks to the services owning rules and accounts through these
//! traits. Transports implement them; [`InMemoryRuleStore`] keeps rules in
//! process for embedded use and tests.

use crate::error::{AuthError, Result};
use crate::types::{Account, AccountToken, Rule};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Request to create an account in the account store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateRequest {
    pub id: String,
    pub account_type: String,
    pub secret: String,
    pub scopes: Vec<String>,
    pub metadata: HashMap<String, String>,
    /// Identity provider, e.g. "oauth"
    pub provider: String,
    pub issuer: String,
    pub name: String,
}

/// Request to exchange credentials or a refresh token for an access token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenRequest {
    pub id: String,
    pub secret: String,
    pub refresh_token: String,
    /// Requested lifetime of the access token
    pub expiry_secs: i64,
    pub issuer: String,
}

/// Rule storage service
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// List the rules of a namespace
    async fn list(&self, namespace: &str) -> Result<Vec<Rule>>;

    /// Create a rule in a namespace
    async fn create(&self, rule: Rule, namespace: &str) -> Result<()>;

    /// Delete a rule from a namespace
    async fn delete(&self, id: &str, namespace: &str) -> Result<()>;
}

/// Account storage service
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Create an account
    async fn generate(&self, request: GenerateRequest) -> Result<Account>;

    /// Issue an access token
    async fn token(&self, request: TokenRequest) -> Result<AccountToken>;

    /// Resolve the account a token belongs to
    async fn inspect(&self, token: &str, issuer: &str) -> Result<Account>;
}

/// In-memory rule store
///
/// Rules are listed in creation order.
pub struct InMemoryRuleStore {
    rules: Arc<RwLock<HashMap<String, Vec<Rule>>>>,
}

impl InMemoryRuleStore {
    /// Create a new in-memory rule store
    pub fn new() -> Self {
        Self {
            rules: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a store seeded with the rules of one namespace
    pub fn with_rules(namespace: impl Into<String>, rules: Vec<Rule>) -> Self {
        let mut map = HashMap::new();
        map.insert(namespace.into(), rules);
        Self {
            rules: Arc::new(RwLock::new(map)),
        }
    }
}

impl Default for InMemoryRuleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RuleStore for InMemoryRuleStore {
    async fn list(&self, namespace: &str) -> Result<Vec<Rule>> {
        let rules = self.rules.read().await;
        Ok(rules.get(namespace).cloned().unwrap_or_default())
    }

    async fn create(&self, rule: Rule, namespace: &str) -> Result<()> {
        let mut rules = self.rules.write().await;
        let existing = rules.entry(namespace.to_string()).or_default();

        if existing.iter().any(|r| r.id == rule.id) {
            return Err(AuthError::remote(
                "auth.Rules.Create",
                409,
                format!("rule {} already exists", rule.id),
            ));
        }

        existing.push(rule);
        Ok(())
    }

    async fn delete(&self, id: &str, namespace: &str) -> Result<()> {
        let mut rules = self.rules.write().await;
        let existing = rules.entry(namespace.to_string()).or_default();

        let before = existing.len();
        existing.retain(|r| r.id != id);

        if existing.len() == before {
            return Err(AuthError::remote(
                "auth.Rules.Delete",
                404,
                format!("rule {} not found", id),
            ));
        }
        Ok(())
    }
}
