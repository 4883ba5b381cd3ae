//! Core authorization types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Unique rule identifier
pub type RuleId = String;

/// Account provided by an auth provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account identifier, e.g. a UUID. Never changes
    pub id: String,

    /// Account type, e.g. "service" or "user"
    #[serde(rename = "type", default)]
    pub account_type: String,

    /// Namespace that minted the account
    #[serde(default)]
    pub issuer: String,

    /// Arbitrary key/value metadata
    #[serde(default)]
    pub metadata: HashMap<String, String>,

    /// Scopes the account holds
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Credential, e.g. a password or a self-signed token
    #[serde(default)]
    pub secret: String,

    /// User friendly name that might change, e.g. a username or email
    #[serde(default)]
    pub name: String,
}

impl Account {
    /// Create an account with the given id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn with_type(mut self, account_type: impl Into<String>) -> Self {
        self.account_type = account_type.into();
        self
    }

    /// Add a scope, keeping scopes unique
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        let scope = scope.into();
        if !self.scopes.contains(&scope) {
            self.scopes.push(scope);
        }
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Case-insensitive scope membership
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| eq_fold(s, scope))
    }
}

/// Entity being protected, e.g. a service endpoint or a web path
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resource {
    /// Resource type, e.g. "service"
    #[serde(rename = "type")]
    pub resource_type: String,

    /// Resource name, e.g. "go.micro.service.notes"
    pub name: String,

    /// Endpoint, e.g. "Notes.Create" or "/notes/list"
    pub endpoint: String,
}

impl Resource {
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Resource matching every type, name and endpoint
    pub fn catch_all() -> Self {
        Self::new("*", "*", "*")
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.resource_type, self.name, self.endpoint)
    }
}

/// Scope a rule requires
///
/// Serialized as its wire string: `""` for public, `"*"` for any account in
/// the verifying namespace, `"+"` for any account in any namespace, anything
/// else names a scope the account must hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Scope {
    /// Applies to everyone, including callers without an account
    Public,
    /// Any account issued by the verifying namespace
    Account,
    /// Any account, whatever namespace issued it
    AnyNamespaceAccount,
    /// A named scope the account must hold
    Named(String),
}

impl Scope {
    pub const PUBLIC: &'static str = "";
    pub const ACCOUNT: &'static str = "*";
    pub const ANY_NAMESPACE_ACCOUNT: &'static str = "+";

    pub fn parse(s: &str) -> Self {
        match s {
            Self::PUBLIC => Scope::Public,
            Self::ACCOUNT => Scope::Account,
            Self::ANY_NAMESPACE_ACCOUNT => Scope::AnyNamespaceAccount,
            other => Scope::Named(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Scope::Public => Self::PUBLIC,
            Scope::Account => Self::ACCOUNT,
            Scope::AnyNamespaceAccount => Self::ANY_NAMESPACE_ACCOUNT,
            Scope::Named(name) => name,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::parse(&name.into())
    }

    /// Whether the rule applies to any account rather than a named scope
    pub fn is_any_account(&self) -> bool {
        matches!(self, Scope::Account | Scope::AnyNamespaceAccount)
    }
}

impl From<String> for Scope {
    fn from(s: String) -> Self {
        Scope::parse(&s)
    }
}

impl From<&str> for Scope {
    fn from(s: &str) -> Self {
        Scope::parse(s)
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::Named(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Public => write!(f, "<public>"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// Access a rule grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    #[default]
    Granted,
    Denied,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Granted => write!(f, "granted"),
            Access::Denied => write!(f, "denied"),
        }
    }
}

/// Rule used to verify access to a resource
///
/// Rules are immutable: changing one means creating a rule with a new id and
/// deleting the old one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Rule identifier, e.g. "public"
    pub id: RuleId,

    /// Scope the rule requires
    pub scope: Scope,

    /// Resource pattern the rule applies to
    pub resource: Resource,

    /// Whether the rule grants or denies access
    pub access: Access,

    /// Higher priorities are applied first
    #[serde(default)]
    pub priority: i32,
}

impl Rule {
    pub fn new(id: impl Into<RuleId>, scope: impl Into<Scope>, resource: Resource) -> Self {
        Self {
            id: id.into(),
            scope: scope.into(),
            resource,
            access: Access::Granted,
            priority: 0,
        }
    }

    pub fn granted(mut self) -> Self {
        self.access = Access::Granted;
        self
    }

    pub fn denied(mut self) -> Self {
        self.access = Access::Denied;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Access token paired with a longer lived refresh token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountToken {
    /// Token used to access resources
    pub access_token: String,

    /// Token used to obtain a new access token
    pub refresh_token: String,

    pub created: DateTime<Utc>,

    pub expiry: DateTime<Utc>,
}

impl AccountToken {
    /// Whether the access token has already expired
    pub fn expired(&self) -> bool {
        self.expiry < Utc::now()
    }

    /// Whether the access token expires within `window` from now
    pub fn expires_within(&self, window: Duration) -> bool {
        self.expiry <= Utc::now() + window
    }
}

/// Unicode case-insensitive comparison
pub(crate) fn eq_fold(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}
