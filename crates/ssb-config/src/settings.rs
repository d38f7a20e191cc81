use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8899";
pub const DEFAULT_STORE_TOKEN_ENV: &str = "SSB_STORE_TOKEN";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 8;
pub const DEFAULT_ADMIN_PASSWORD_ENV: &str = "SSB_ADMIN_PASSWORD";
pub const DEFAULT_INITIAL_PASSWORD_ENV: &str = "SSB_INITIAL_PASSWORD";

/// Typed view over the merged config. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub accounts: AccountsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Rest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Base URL of the REST backend. Required when `backend: rest`.
    pub database_url: Option<String>,
    /// Env var NAME holding the store auth token.
    pub auth_token_env: String,
    pub poll_interval_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            database_url: None,
            auth_token_env: DEFAULT_STORE_TOKEN_ENV.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountsConfig {
    pub session_ttl_hours: i64,
    /// Account created at daemon start when set.
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_password_env: String,
    /// Env var NAME holding the password given to accounts created without one.
    pub initial_password_env: String,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            bootstrap_admin_email: None,
            bootstrap_admin_password_env: DEFAULT_ADMIN_PASSWORD_ENV.to_string(),
            initial_password_env: DEFAULT_INITIAL_PASSWORD_ENV.to_string(),
        }
    }
}

impl DashboardConfig {
    pub fn from_json(config_json: &Value) -> Result<Self> {
        let cfg: DashboardConfig =
            serde_json::from_value(config_json.clone()).context("CONFIG_INVALID: typed view")?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.server.bind_addr.trim().is_empty() {
            bail!("CONFIG_INVALID: /server/bind_addr must not be empty");
        }
        if self.store.backend == StoreBackend::Rest
            && self
                .store
                .database_url
                .as_deref()
                .map_or(true, |u| u.trim().is_empty())
        {
            bail!("CONFIG_INVALID: /store/database_url is required when /store/backend is 'rest'");
        }
        if self.store.poll_interval_ms == 0 {
            bail!("CONFIG_INVALID: /store/poll_interval_ms must be > 0");
        }
        if self.accounts.session_ttl_hours < 1 {
            bail!("CONFIG_INVALID: /accounts/session_ttl_hours must be >= 1");
        }
        Ok(())
    }
}
