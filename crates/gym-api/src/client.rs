//! Authenticated busyness API client
//!
//! Owns the credentials and the session identity token. The injected
//! `reqwest::Client` must carry a cookie store (`build_http_client`); a
//! successful login sets the session cookie through the transport and the
//! client never manipulates cookies itself.
//!
//! Local session state is optimistic: a stored `user_id` can be stale from
//! the server's point of view with no local transition. The only expiry
//! signal is a 401/403 on fetch, answered by exactly one re-login and one
//! retried fetch per call — never a loop.

use std::time::Duration;

use common::Secret;
use reqwest::StatusCode;
use tracing::{error, info, warn};

use crate::constants::{BASE_HEADERS, DEFAULT_BASE_URL, LOGIN_PATH, busyness_path};
use crate::error::{ApiError, Result};
use crate::model::{BusynessSnapshot, LoginResponse};

/// Build the standard HTTP client for the upstream API.
///
/// Cookie store enabled (the session cookie must survive across requests),
/// the fixed device-emulation headers installed as defaults, and an
/// explicit request timeout so a poll cycle cannot hang on transport
/// defaults.
pub fn build_http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();
    for &(name, value) in BASE_HEADERS {
        headers.insert(name, reqwest::header::HeaderValue::from_static(value));
    }
    reqwest::Client::builder()
        .cookie_store(true)
        .default_headers(headers)
        .timeout(timeout)
        .build()
}

/// Client for the gym busyness API.
///
/// One instance per account; it issues at most one request at a time on
/// its own behalf and expects its caller to serialize calls.
pub struct GymApiClient {
    username: String,
    password: Secret<String>,
    http: reqwest::Client,
    base_url: String,
    user_id: String,
}

impl GymApiClient {
    /// Create a client against the production API.
    pub fn new(
        username: impl Into<String>,
        password: Secret<String>,
        http: reqwest::Client,
    ) -> Self {
        Self::with_base_url(username, password, http, DEFAULT_BASE_URL)
    }

    /// Create a client against an alternate base URL (staging, tests).
    pub fn with_base_url(
        username: impl Into<String>,
        password: Secret<String>,
        http: reqwest::Client,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            username: username.into(),
            password,
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            user_id: String::new(),
        }
    }

    /// Seed an already-known identity token to skip the initial login.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Identity token from the most recent successful login, if any.
    pub fn user_id(&self) -> Option<&str> {
        if self.user_id.is_empty() {
            None
        } else {
            Some(&self.user_id)
        }
    }

    /// Log in and store the server-issued identity token.
    ///
    /// On success the transport holds the fresh session cookie and
    /// `user_id` holds the token from the response body. On any failure
    /// the previously held token is left untouched.
    pub async fn login(&mut self) -> Result<()> {
        let url = format!("{}{}", self.base_url, LOGIN_PATH);
        let response = self
            .http
            .post(&url)
            .form(&[
                ("username", self.username.as_str()),
                ("password", self.password.expose().as_str()),
            ])
            .send()
            .await
            .map_err(|e| ApiError::Transient(format!("login request failed: {e}")))?;

        let status = response.status();
        if status != StatusCode::OK {
            if status.is_client_error() {
                error!(%status, "login rejected");
                return Err(ApiError::InvalidAuth(format!(
                    "login rejected with status {status}"
                )));
            }
            error!(%status, "login failed");
            return Err(ApiError::Transient(format!(
                "login returned status {status}"
            )));
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidAuth(format!("malformed login response: {e}")))?;

        match body.uuid {
            Some(uuid) if !uuid.is_empty() => {
                self.user_id = uuid;
                info!("login successful, session cookie stored");
                Ok(())
            }
            _ => {
                error!("login response missing identity token");
                Err(ApiError::InvalidAuth(
                    "login response missing identity token".into(),
                ))
            }
        }
    }

    /// Fetch the current busyness snapshot for the logged-in account.
    ///
    /// Logs in first if no identity token is held; a login failure is
    /// returned directly without issuing the fetch. A 401/403 means the
    /// session expired server-side: one forced re-login, then the fetch is
    /// retried exactly once. Repeated rejection after the retry is
    /// transient — the next poll cycle starts the sequence over.
    pub async fn get_busyness(&mut self) -> Result<BusynessSnapshot> {
        self.ensure_logged_in().await?;

        let response = self.fetch_busyness().await?;
        let status = response.status();

        if status == StatusCode::OK {
            return parse_snapshot(response).await;
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(%status, "session likely expired, re-logging in");
            self.login().await?;

            let retry = self.fetch_busyness().await?;
            let retry_status = retry.status();
            if retry_status == StatusCode::OK {
                return parse_snapshot(retry).await;
            }
            error!(status = %retry_status, "busyness fetch failed after re-login");
            return Err(ApiError::Transient(format!(
                "busyness fetch returned status {retry_status} after re-login"
            )));
        }

        error!(%status, "busyness fetch failed");
        Err(ApiError::Transient(format!(
            "busyness fetch returned status {status}"
        )))
    }

    /// Log in only if no identity token is held yet.
    async fn ensure_logged_in(&mut self) -> Result<()> {
        if !self.user_id.is_empty() {
            return Ok(());
        }
        warn!("no identity token held, logging in");
        self.login().await
    }

    /// One GET of the per-user busyness resource. The transport attaches
    /// the session cookie; the URL embeds whatever token is currently held.
    async fn fetch_busyness(&self) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, busyness_path(&self.user_id));
        self.http
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Transient(format!("busyness request failed: {e}")))
    }
}

/// Parse a 200 busyness response. A body that doesn't match the expected
/// shape (including an error-shaped body on a silent auth loss) is a
/// transient failure, not an auth failure.
async fn parse_snapshot(response: reqwest::Response) -> Result<BusynessSnapshot> {
    response
        .json::<BusynessSnapshot>()
        .await
        .map_err(|e| ApiError::Transient(format!("malformed busyness payload: {e}")))
}
