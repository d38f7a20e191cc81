//! Command handler modules for ssb-cli.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod synthesis;
pub mod zones;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use ssb_config::{
    load_layered_yaml, paths_from_env, report_unused_keys, secrets::resolve_secrets, Component,
    DashboardConfig, StoreBackend, UnusedKeyPolicy,
};
use ssb_inventory::LiveStore;
use ssb_store::{MemoryStore, RestStore};
use tracing::warn;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Explicit `--config` paths win; otherwise the `SSB_CONFIG` layers are used.
pub fn config_paths(explicit: Vec<String>) -> Vec<String> {
    if explicit.is_empty() {
        paths_from_env()
    } else {
        explicit
    }
}

/// Load the layered config, warn about keys the CLI ignores, and open the
/// configured store backend.
pub fn open_store(paths: &[String]) -> Result<Arc<dyn LiveStore>> {
    let path_refs: Vec<&str> = paths.iter().map(String::as_str).collect();
    let loaded = load_layered_yaml(&path_refs)?;
    let report = report_unused_keys(Component::Cli, &loaded.config_json, UnusedKeyPolicy::Warn)?;
    for ptr in &report.unused_leaf_pointers {
        warn!(pointer = %ptr, "config key not used by the cli");
    }
    let cfg = loaded.dashboard()?;
    let secrets = resolve_secrets(&cfg)?;
    Ok(build_store(&cfg, secrets.store_auth_token))
}

fn build_store(cfg: &DashboardConfig, auth_token: Option<String>) -> Arc<dyn LiveStore> {
    match cfg.store.backend {
        StoreBackend::Memory => {
            warn!("memory store backend: the cli sees an empty store");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Rest => {
            let url = cfg.store.database_url.clone().unwrap_or_default();
            Arc::new(
                RestStore::new(url, auth_token)
                    .with_poll_interval(Duration::from_millis(cfg.store.poll_interval_ms)),
            )
        }
    }
}

/// Quote a value for `key=value` output when it contains whitespace.
pub fn kv(value: &str) -> String {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        format!("{value:?}")
    } else {
        value.to_string()
    }
}

pub fn non_negative(flag: &str, v: i64) -> Result<u64> {
    u64::try_from(v).with_context(|| format!("--{flag} must be >= 0 (got {v})"))
}
