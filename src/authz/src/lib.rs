//! # Keel Authorization
//!
//! Client-side authorization engine and signed-token service.
//!
//! ## Features
//!
//! - **Rule evaluation**: priority-ordered, wildcard-aware access rules with
//!   namespace isolation and default deny
//! - **Namespace checks**: accounts stay in their issuing namespace unless
//!   they administer the default one
//! - **Signed tokens**: RS256 JWT generation and inspection without a network
//!   round trip
//! - **TTL rule cache**: per-namespace rule sets, refreshed in the background
//!   after grants and revocations
//! - **Local/remote fallback**: remote account and rule stores are only
//!   contacted when the configured keys cannot serve a request locally
//! - **Token renewal**: a background task keeps the held access token fresh
//!
//! ## Example
//!
//! ```rust,no_run
//! use keel_authz::{Account, Auth, AuthConfig, InMemoryRuleStore, Resource, Rule, Scope, VerifyOptions};
//! # use keel_authz::store::{AccountStore, GenerateRequest, TokenRequest};
//! # use keel_authz::{AccountToken, Result as AuthResult};
//! # struct Accounts;
//! # #[async_trait::async_trait]
//! # impl AccountStore for Accounts {
//! #     async fn generate(&self, _: GenerateRequest) -> AuthResult<Account> { unimplemented!() }
//! #     async fn token(&self, _: TokenRequest) -> AuthResult<AccountToken> { unimplemented!() }
//! #     async fn inspect(&self, _: &str, _: &str) -> AuthResult<Account> { unimplemented!() }
//! # }
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let rules = InMemoryRuleStore::with_rules(
//!         "micro",
//!         vec![Rule::new("public", Scope::Public, Resource::catch_all())],
//!     );
//!     let auth = Auth::new(AuthConfig::new("micro"), Arc::new(rules), Arc::new(Accounts))?;
//!
//!     let resource = Resource::new("service", "notes", "Notes.List");
//!     auth.verify(None, &resource, VerifyOptions::default()).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod namespace;
pub mod options;
pub mod refresh;
pub mod rules;
pub mod store;
pub mod token;
pub mod types;

// Re-export commonly used types
pub use auth::Auth;
pub use cache::{CacheStats, RuleCache};
pub use config::AuthConfig;
pub use error::{AuthError, RemoteError, Result};
pub use namespace::{authorize, authorize_admin, DEFAULT_NAMESPACE};
pub use options::{GenerateOptions, TokenOptions, VerifyOptions};
pub use refresh::{RefreshPolicy, TokenRefresher};
pub use rules::verify_access;
pub use store::{AccountStore, InMemoryRuleStore, RuleStore};
pub use token::{is_locally_verifiable, JwtProvider, KeyPair, Token, TokenProvider};
pub use types::{Access, Account, AccountToken, Resource, Rule, RuleId, Scope};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
