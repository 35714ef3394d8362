//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The account password is loaded from the GYM_PASSWORD env var or
//! password_file, never stored in the TOML directly to avoid leaking
//! secrets.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use common::Secret;
use gym_triggers::TriggerRule;
use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub api: ApiConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub triggers: Vec<TriggerRule>,
}

/// Upstream account and polling settings
#[derive(Debug, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Account email address
    pub username: String,
    #[serde(skip)]
    pub password: Option<Secret<String>>,
    /// Path to a file containing the password (alternative to GYM_PASSWORD env var)
    #[serde(default)]
    pub password_file: Option<PathBuf>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// HTTP surface settings
#[derive(Debug, Deserialize, Serialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

fn default_base_url() -> String {
    gym_api::DEFAULT_BASE_URL.to_string()
}

fn default_poll_interval() -> u64 {
    300
}

fn default_timeout() -> u64 {
    gym_api::DEFAULT_TIMEOUT_SECS
}

fn default_max_connections() -> usize {
    64
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Password resolution order:
    /// 1. GYM_PASSWORD env var
    /// 2. password_file path from config
    ///
    /// A config without a resolvable password is rejected — the agent
    /// cannot do anything without credentials.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if !config.api.base_url.starts_with("http://")
            && !config.api.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                config.api.base_url
            )));
        }

        if config.api.poll_interval_secs == 0 {
            return Err(common::Error::Config(
                "poll_interval_secs must be greater than 0".into(),
            ));
        }

        if config.api.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if config.server.max_connections == 0 {
            return Err(common::Error::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        for rule in &config.triggers {
            rule.validate()
                .map_err(|e| common::Error::Config(format!("invalid trigger: {e}")))?;
        }

        // Resolve password: env var takes precedence over file
        if let Ok(password) = std::env::var("GYM_PASSWORD") {
            config.api.password = Some(Secret::new(password));
        } else if let Some(ref password_file) = config.api.password_file {
            let password = std::fs::read_to_string(password_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read password_file {}: {e}",
                    password_file.display()
                ))
            })?;
            let password = password.trim().to_owned();
            if !password.is_empty() {
                config.api.password = Some(Secret::new(password));
            }
        }

        if config.api.password.is_none() {
            return Err(common::Error::Config(
                "no password configured — set GYM_PASSWORD or password_file".into(),
            ));
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("gym-busyness-agent.toml")
    }

    /// Poll cadence as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.api.poll_interval_secs)
    }

    /// Request timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }
}
