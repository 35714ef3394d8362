//! API payload types

use serde::{Deserialize, Serialize};

/// One fetched busyness payload at a point in time.
///
/// Immutable once fetched; the coordinator replaces its cached snapshot
/// wholesale on each successful refresh. `current_capacity` and `status`
/// are the two host-facing observables and map 1:1 onto the payload fields.
/// `historical` is carried verbatim as opaque JSON — no history is kept
/// beyond what the payload itself embeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusynessSnapshot {
    pub gym_location_id: String,
    pub gym_location_name: String,
    pub current_capacity: u32,
    pub current_percentage: f64,
    #[serde(default)]
    pub historical: serde_json::Value,
    pub status: String,
}

/// Login endpoint response. Only the identity token matters; any shape
/// without a usable `uuid` is a failed login.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub uuid: Option<String>,
}
