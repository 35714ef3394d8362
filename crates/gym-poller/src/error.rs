//! Error types for coordinator startup

/// Hard failure from the eager startup refresh.
///
/// Steady-state refresh failures are reported through `RefreshOutcome`
/// instead — only the very first refresh, with no cached snapshot to fall
/// back on, escalates to an error and aborts setup.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("update failed: {0}")]
    Transient(String),
}

/// Result alias for coordinator operations.
pub type Result<T> = std::result::Result<T, PollError>;
