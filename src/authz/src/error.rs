//! Error types for the authorization engine and token service

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Message carried by [`AuthError::InvalidToken`].
///
/// Remote account stores report an invalid token with this exact detail, which
/// is how the facade recognises it on the remote path.
pub const INVALID_TOKEN_MESSAGE: &str = "invalid token provided";

/// Authorization and token errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// No rule grants access, or a denying rule matched
    #[error("resource forbidden")]
    Forbidden,

    /// Caller has no account, or lacks the admin rights an operation needs
    #[error("unauthorized")]
    Unauthorized,

    /// Token is malformed, wrongly signed or expired
    #[error("{}", INVALID_TOKEN_MESSAGE)]
    InvalidToken,

    /// Local key decoding or signing failed
    #[error("error encoding the token")]
    EncodingToken,

    /// Error returned by a remote rule or account store
    #[error("remote error: {0}")]
    Remote(RemoteError),

    /// A remote call did not complete within the configured timeout
    #[error("remote call timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl AuthError {
    /// Build a remote error from its parts
    pub fn remote(id: impl Into<String>, code: u16, detail: impl Into<String>) -> Self {
        AuthError::Remote(RemoteError {
            id: id.into(),
            code,
            detail: detail.into(),
        })
    }

    /// Whether the caller should re-authenticate rather than retry
    pub fn is_invalid_token(&self) -> bool {
        matches!(self, AuthError::InvalidToken)
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, AuthError::Forbidden)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AuthError::Unauthorized)
    }
}

/// Opaque error reported by a collaborator service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    /// Service or method that produced the error
    pub id: String,
    /// Status code, HTTP-like
    pub code: u16,
    /// Human readable detail
    pub detail: String,
}

impl RemoteError {
    /// Whether the remote side rejected the token itself
    pub fn is_invalid_token(&self) -> bool {
        self.detail == INVALID_TOKEN_MESSAGE
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.id, self.code, self.detail)
    }
}

impl std::error::Error for RemoteError {}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthError>;
