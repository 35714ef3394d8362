//! Error taxonomy for API client operations

/// Errors from the busyness API client.
///
/// `InvalidAuth` demands new credentials from the user — the same ones are
/// never silently retried. Everything else (transport failures, unexpected
/// statuses, malformed payloads) is `Transient`: callers keep serving the
/// last good data and retry on their own schedule.
///
/// Session expiry has no variant here. A 401/403 on fetch is resolved
/// inside the client by a single re-login and retried fetch; it surfaces
/// as either a snapshot or one of the two kinds above.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid credentials: {0}")]
    InvalidAuth(String),

    #[error("transient API failure: {0}")]
    Transient(String),
}

/// Result alias for API client operations.
pub type Result<T> = std::result::Result<T, ApiError>;
