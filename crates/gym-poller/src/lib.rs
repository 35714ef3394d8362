//! Polling coordinator for the gym busyness client
//!
//! Drives a busyness source on a fixed schedule and normalizes client
//! outcomes into the vocabulary a host observer consumes. The coordinator
//! caches the latest good snapshot and pushes change notifications; it
//! never inherits from a host framework — hosts subscribe.
//!
//! Lifecycle:
//! 1. Host wraps an API client in a `Coordinator`
//! 2. Startup calls `first_refresh()` — a failure here is a hard setup
//!    error, since no stale snapshot exists yet to fall back on
//! 3. `spawn_poll_task` refreshes on the configured interval
//! 4. Readers use `snapshot()`; subscribers use `subscribe()`
//! 5. `AuthFailure` means the host must obtain new credentials;
//!    `TransientFailure` keeps serving the last good snapshot as stale

pub mod coordinator;
pub mod error;
pub mod poll;
pub mod source;

pub use coordinator::{Coordinator, PollerStatus, RefreshOutcome};
pub use error::{PollError, Result};
pub use poll::spawn_poll_task;
pub use source::BusynessSource;
