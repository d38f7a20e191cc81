//! Runtime secret resolution.
//!
//! Config YAML stores only env var NAMES (`auth_token_env: "SSB_STORE_TOKEN"`).
//! Binaries call [`resolve_secrets`] once at startup and pass the result to
//! constructors. `Debug` redacts every value, and error messages name the
//! variable, never its content.
//!
//! | secret                    | required when                         |
//! |---------------------------|---------------------------------------|
//! | store auth token          | never (a public database needs none)  |
//! | bootstrap admin password  | `accounts.bootstrap_admin_email` set  |
//! | initial password          | never                                 |

use anyhow::{bail, Result};

use crate::DashboardConfig;

#[derive(Clone, Default)]
pub struct ResolvedSecrets {
    pub store_auth_token: Option<String>,
    pub bootstrap_admin_password: Option<String>,
    /// Password for accounts created without an explicit one.
    pub initial_password: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field(
                "store_auth_token",
                &self.store_auth_token.as_ref().map(|_| "<REDACTED>"),
            )
            .field(
                "bootstrap_admin_password",
                &self.bootstrap_admin_password.as_ref().map(|_| "<REDACTED>"),
            )
            .field(
                "initial_password",
                &self.initial_password.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

/// `None` if the variable is unset or blank.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name.trim()) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

pub fn resolve_secrets(cfg: &DashboardConfig) -> Result<ResolvedSecrets> {
    let store_auth_token = resolve_env(&cfg.store.auth_token_env);
    let bootstrap_admin_password = resolve_env(&cfg.accounts.bootstrap_admin_password_env);
    let initial_password = resolve_env(&cfg.accounts.initial_password_env);

    let wants_admin = cfg
        .accounts
        .bootstrap_admin_email
        .as_deref()
        .is_some_and(|e| !e.trim().is_empty());
    if wants_admin && bootstrap_admin_password.is_none() {
        bail!(
            "SECRETS_MISSING: required env var '{}' (bootstrap admin password) is not set or empty",
            cfg.accounts.bootstrap_admin_password_env,
        );
    }

    Ok(ResolvedSecrets {
        store_auth_token,
        bootstrap_admin_password,
        initial_password,
    })
}
