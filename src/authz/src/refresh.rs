//! Background renewal of the held access token
//!
//! Every tick the refresher looks at the token held by [`Auth`]. Once it is
//! within the refresh window of its expiry, the refresh token is exchanged
//! for a new access token which replaces the old one. A rejected refresh
//! token falls back to the configured service credentials.
//!
//! Failures back off exponentially from the tick interval up to a cap, and
//! the refresher gives up after a bounded number of consecutive failures.

use crate::auth::Auth;
use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::options::TokenOptions;
use crate::types::AccountToken;

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// When and how the held token is renewed
#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    /// Time between checks
    pub interval: Duration,
    /// Renew once the token expires within this window
    pub window: chrono::Duration,
    /// Lifetime requested for renewed tokens
    pub token_expiry: chrono::Duration,
    /// Upper bound on the delay after failures
    pub max_backoff: Duration,
    /// Consecutive failures before the refresher stops
    pub max_failures: u32,
}

impl RefreshPolicy {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            interval: config.refresh_interval(),
            window: config.refresh_window(),
            token_expiry: config.refreshed_token_expiry(),
            max_backoff: config.max_backoff(),
            max_failures: config.refresh.max_failures,
        }
    }

    /// Delay before the next check after `failures` consecutive failures
    pub fn delay(&self, failures: u32) -> Duration {
        let factor = 1u32 << failures.min(16);
        self.interval
            .saturating_mul(factor)
            .min(self.max_backoff.max(self.interval))
    }
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self::from_config(&AuthConfig::default())
    }
}

/// Handle to a running refresher
///
/// Dropping the handle stops the task.
pub struct TokenRefresher {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl TokenRefresher {
    /// Start renewing the token held by `auth` using its configured policy
    pub fn spawn(auth: Arc<Auth>) -> Self {
        let policy = RefreshPolicy::from_config(auth.config());
        Self::with_policy(auth, policy)
    }

    pub fn with_policy(auth: Arc<Auth>, policy: RefreshPolicy) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(auth, policy, cancel.clone()));

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Whether the task has ended, by cancellation or by giving up
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Stop the refresher and wait for it to exit
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TokenRefresher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(auth: Arc<Auth>, policy: RefreshPolicy, cancel: CancellationToken) {
    // can't refresh a token we don't have
    if auth.current_token().is_none() {
        debug!("No auth token held, token refresher not started");
        return;
    }

    info!(interval = ?policy.interval, "Token refresher started");
    let mut failures = 0u32;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Token refresher stopped");
                return;
            }
            _ = tokio::time::sleep(policy.delay(failures)) => {}
        }

        match refresh_if_needed(&auth, &policy).await {
            Ok(Some(token)) => {
                info!(expiry = %token.expiry, "Auth token refreshed");
                failures = 0;
            }
            Ok(None) => {}
            Err(e) => {
                failures += 1;
                warn!(failures, "Error refreshing auth token: {}", e);

                if failures >= policy.max_failures {
                    error!(failures, "Giving up refreshing auth token");
                    return;
                }
            }
        }
    }
}

/// Renew the held token if it is close to expiring
///
/// Returns the new token when one was swapped in, `None` when no renewal was
/// needed.
pub async fn refresh_if_needed(auth: &Auth, policy: &RefreshPolicy) -> Result<Option<AccountToken>> {
    let Some(current) = auth.current_token() else {
        return Ok(None);
    };

    if !current.expires_within(policy.window) {
        return Ok(None);
    }

    let options = TokenOptions::refresh(current.refresh_token.clone()).with_expiry(policy.token_expiry);

    let token = match auth.token(options).await {
        Err(AuthError::InvalidToken) => {
            let Some((id, secret)) = auth.credentials() else {
                return Err(AuthError::InvalidToken);
            };

            warn!("Refresh token expired, regenerating using account credentials");
            auth.token(TokenOptions::credentials(id, secret).with_expiry(policy.token_expiry))
                .await?
        }
        other => other?,
    };

    auth.set_token(token.clone());
    Ok(Some(token))
}
