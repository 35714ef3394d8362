//! Upstream API constants
//!
//! Endpoint paths and the fixed device-emulation header set the upstream
//! API requires. These values are not secrets — they identify the mobile
//! client the API expects to talk to. The actual secrets (credentials,
//! session cookie) are managed by the client and the transport.

/// Production API host
pub const DEFAULT_BASE_URL: &str = "https://thegymgroup.netpulse.com";

/// Login endpoint path (POST, URL-encoded credentials)
pub const LOGIN_PATH: &str = "/np/exerciser/login";

/// Default request timeout. The upstream publishes no latency contract, so
/// a poll cycle must not be allowed to hang on transport defaults.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Fixed header set sent on every request. The upstream rejects clients
/// that don't present the mobile-app identity; `host` is derived from the
/// request URL by the transport and `content-type` is set per request.
pub const BASE_HEADERS: &[(&str, &str)] = &[
    ("accept", "application/json"),
    ("accept-encoding", "gzip"),
    ("connection", "Keep-Alive"),
    ("user-agent", "okhttp/3.12.3"),
    ("x-np-api-version", "1.5"),
    ("x-np-app-version", "6.10"),
    (
        "x-np-user-agent",
        "clientType=MOBILE_DEVICE; devicePlatform=ANDROID; deviceUid=; applicationName=The Gym Group; applicationVersion=6.10; applicationVersionCode=38",
    ),
];

/// Per-user busyness resource path.
pub fn busyness_path(user_id: &str) -> String {
    format!("/np/thegymgroup/v1.0/exerciser/{user_id}/gym-busyness")
}
