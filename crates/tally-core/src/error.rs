//! Shared error type across tally crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Counter name failed validation.
    InvalidArgument,
    /// Malformed message or unknown operation.
    BadRequest,
    /// Presented credentials were rejected.
    AuthFailed,
    /// Rate limited.
    RateLimited,
    /// Payload too large.
    PayloadTooLarge,
    /// Unsupported protocol version.
    UnsupportedVersion,
    /// Session closed after sitting idle.
    Timeout,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::InvalidArgument => "INVALID_ARGUMENT",
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::AuthFailed => "AUTH_FAILED",
            ClientCode::RateLimited => "RATE_LIMITED",
            ClientCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Timeout => "TIMEOUT",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, TallyError>;

/// Unified error type used by core and server.
///
/// The counter core only ever produces `InvalidArgument`; every other variant
/// belongs to the layers that expose it.
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("authentication failed")]
    AuthenticationFailed,
    #[error("rate limited")]
    RateLimited,
    #[error("payload too large")]
    PayloadTooLarge,
    #[error("unsupported protocol version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl TallyError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            TallyError::InvalidArgument(_) => ClientCode::InvalidArgument,
            TallyError::BadRequest(_) => ClientCode::BadRequest,
            TallyError::AuthenticationFailed => ClientCode::AuthFailed,
            TallyError::RateLimited => ClientCode::RateLimited,
            TallyError::PayloadTooLarge => ClientCode::PayloadTooLarge,
            TallyError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            TallyError::Internal(_) => ClientCode::Internal,
        }
    }
}
