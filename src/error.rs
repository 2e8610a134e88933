//! Error taxonomy shared across the portal core.
//!
//! DESIGN
//! ======
//! Each layer owns a small `thiserror` enum. `PortalError` is what callers
//! of [`crate::portal::Portal`] see; lower layers convert into it with `?`.
//! Route-guard denials are not errors: they come back as redirect outcomes.

use crate::config::ConfigError;
use crate::session::StorageError;

// =============================================================================
// API ERROR
// =============================================================================

/// Failures talking to the REST backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The backend declined the submitted credentials.
    #[error("login rejected by backend (status {status})")]
    AuthRejected { status: u16 },

    /// Transport-level failure: DNS, connect, timeout, reset.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// A bearer token was sent but the backend no longer accepts it.
    #[error("session token rejected by backend")]
    StaleSession,

    /// Any other non-success status.
    #[error("backend returned status {status}: {body}")]
    Backend { status: u16, body: String },

    /// Response body did not match the expected shape.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

impl ApiError {
    /// Whether the failure means the stored token is no longer valid.
    #[must_use]
    pub fn is_stale_session(&self) -> bool {
        matches!(self, Self::StaleSession)
    }
}

// =============================================================================
// PORTAL ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A newer login (or a cancel) was issued while this one was in flight.
    #[error("login attempt {sequence} superseded by a newer request")]
    Superseded { sequence: u64 },

    /// An authenticated call was attempted without a token.
    #[error("not logged in")]
    NotAuthenticated,

    /// The call needs a role the current session does not hold.
    #[error("operation requires the {required} role")]
    WrongRole { required: crate::session::Role },

    /// A required field was empty or missing.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// The session cannot hand anything to the signing library.
    #[error("signing unavailable: {0}")]
    SigningUnavailable(&'static str),
}

impl PortalError {
    /// Message suitable for a toast or a CLI error line.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(ApiError::AuthRejected { .. }) => "Login failed. Please check your credentials.".to_owned(),
            Self::Api(ApiError::NetworkFailure(_)) => "Could not reach the server. Please try again.".to_owned(),
            Self::Api(ApiError::StaleSession) => "Your session has expired. Please log in again.".to_owned(),
            Self::NotAuthenticated => "You are not logged in.".to_owned(),
            other => other.to_string(),
        }
    }
}
