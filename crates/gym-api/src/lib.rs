//! Gym busyness API client
//!
//! Session-cookie authentication and busyness fetching for the upstream
//! gym-occupancy API. This crate is a standalone library with no dependency
//! on the agent binary — it can be tested and used independently.
//!
//! Session flow:
//! 1. Host builds a cookie-bearing HTTP client via `build_http_client()`
//! 2. `GymApiClient::login()` posts the credentials and stores the
//!    server-issued identity token; the transport stores the session cookie
//! 3. `GymApiClient::get_busyness()` fetches the per-user busyness resource
//! 4. A 401/403 on fetch means the session expired server-side — the client
//!    re-logs-in once and retries the fetch once, transparently

pub mod client;
pub mod constants;
pub mod error;
pub mod model;

pub use client::{GymApiClient, build_http_client};
pub use constants::*;
pub use error::{ApiError, Result};
pub use model::BusynessSnapshot;
