//! ssb-config
//!
//! Layered YAML configuration for the dashboard binaries.
//!
//! - later layers override earlier ones (deep merge of mappings)
//! - literal secret values are refused (`CONFIG_SECRET_DETECTED`)
//! - the merged document is rendered as canonical JSON and hashed (SHA-256)
//! - `report_unused_keys` lists leaves no component reads
//!
//! Typed access goes through [`DashboardConfig`]; secrets through
//! [`secrets::resolve_secrets`].

pub mod secrets;
mod settings;

pub use settings::{AccountsConfig, DashboardConfig, ServerConfig, StoreBackend, StoreConfig};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;

/// Env var holding a comma-separated list of config layer paths.
pub const CONFIG_PATHS_ENV: &str = "SSB_CONFIG";

/// If any leaf string in the merged config starts with one of these, loading
/// aborts with CONFIG_SECRET_DETECTED.
const SECRET_PREFIXES: &[&str] = &[
    "AIza",       // Google API key
    "ya29.",      // Google OAuth access token
    "sk-",        // OpenAI style
    "sk_live",    // Stripe live
    "sk_test",    // Stripe test
    "AKIA",       // AWS access key ID
    "-----BEGIN", // PEM private keys
    "ghp_",       // GitHub PAT
    "glpat-",     // GitLab PAT
    "xoxb-",      // Slack bot token
];

// ---------------------------------------------------------------------------
// Unused-key report
// ---------------------------------------------------------------------------

/// Binary whose config reads are being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Daemon,
    Cli,
}

impl Component {
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Daemon => "DAEMON",
            Component::Cli => "CLI",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    pub component: String,
    /// Sorted JSON pointers of leaves the component never reads.
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// JSON-pointer prefixes each component actually reads. A leaf under any
/// prefix counts as consumed; "/a/b" covers "/a/b/c" but not "/a/bc".
pub fn consumed_pointers_for(component: Component) -> &'static [&'static str] {
    match component {
        Component::Daemon => &[
            "/server/bind_addr",
            "/store/backend",
            "/store/database_url",
            "/store/auth_token_env",
            "/store/poll_interval_ms",
            "/accounts/session_ttl_hours",
            "/accounts/bootstrap_admin_email",
            "/accounts/bootstrap_admin_password_env",
            "/accounts/initial_password_env",
        ],
        // The CLI talks to the store directly and never opens sessions.
        Component::Cli => &[
            "/store/backend",
            "/store/database_url",
            "/store/auth_token_env",
            "/store/poll_interval_ms",
        ],
    }
}

/// With `Fail`, unused keys are an error; with `Warn` the report is returned.
pub fn report_unused_keys(
    component: Component,
    config_json: &Value,
    policy: UnusedKeyPolicy,
) -> Result<UnusedKeyReport> {
    let consumed = consumed_pointers_for(component);
    let mut unused: Vec<String> = leaves(config_json)
        .into_iter()
        .map(|(ptr, _)| ptr)
        .filter(|ptr| !consumed.iter().any(|c| covers(c, ptr)))
        .collect();
    unused.sort();

    let report = UnusedKeyReport {
        component: component.as_str().to_string(),
        unused_leaf_pointers: unused,
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        let first: Vec<&String> = report.unused_leaf_pointers.iter().take(12).collect();
        bail!(
            "CONFIG_UNUSED_KEYS (component={}): {} unused config leaf key(s) detected. \
            Remove them or update the consumed registry. First few: {:?}",
            report.component,
            report.unused_leaf_pointers.len(),
            first
        );
    }

    Ok(report)
}

/// "/a/b" covers "/a/b" and "/a/b/c" but not "/a/bc".
fn covers(prefix: &str, leaf: &str) -> bool {
    leaf == prefix
        || leaf
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Non-mapping values of the document with their JSON pointers. The
/// dashboard config has no list-valued keys, so a list is one leaf.
fn leaves(v: &Value) -> Vec<(String, &Value)> {
    fn walk<'a>(v: &'a Value, at: String, out: &mut Vec<(String, &'a Value)>) {
        match v {
            Value::Object(map) => {
                for (k, child) in map {
                    let token = k.replace('~', "~0").replace('/', "~1");
                    walk(child, format!("{at}/{token}"), out);
                }
            }
            _ if at.is_empty() => out.push(("/".to_string(), v)),
            _ => out.push((at, v)),
        }
    }
    let mut out = Vec::new();
    walk(v, String::new(), &mut out);
    out
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    /// Typed view with defaults for missing keys.
    pub fn dashboard(&self) -> Result<DashboardConfig> {
        DashboardConfig::from_json(&self.config_json)
    }
}

/// Layer paths from `SSB_CONFIG` (comma-separated, blanks skipped).
pub fn paths_from_env() -> Vec<String> {
    std::env::var(CONFIG_PATHS_ENV)
        .map(|raw| split_paths(&raw))
        .unwrap_or_default()
}

fn split_paths(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// No paths means an empty document: every key takes its default.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        // An empty document parses as null and contributes nothing.
        if v_json.is_null() {
            continue;
        }
        merged = deep_merge(merged, v_json);
    }

    enforce_no_secret_literals(&merged)?;

    let canonical_json = canonicalize_json(&merged)?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

/// serde_json's default map is ordered by key, so compact serialization is
/// already canonical.
fn canonicalize_json(v: &Value) -> Result<String> {
    serde_json::to_string(v).context("canonical json serialize failed")
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn enforce_no_secret_literals(v: &Value) -> Result<()> {
    for (ptr, leaf) in leaves(v) {
        let hit = match leaf {
            Value::String(s) => looks_like_secret(s),
            Value::Array(items) => items.iter().filter_map(Value::as_str).any(looks_like_secret),
            _ => false,
        };
        if hit {
            bail!("CONFIG_SECRET_DETECTED leaf={} value=REDACTED", ptr);
        }
    }
    Ok(())
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    if t.len() < 8 {
        return false;
    }
    SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}
