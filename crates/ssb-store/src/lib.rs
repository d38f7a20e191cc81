//! ssb-store
//!
//! Live key-value store boundary.
//!
//! This crate owns the store trait and the two concrete backends. It knows
//! nothing about products, zones or synthesis: records are plain JSON values
//! addressed as `<collection>/<id>`. Callers (ssb-inventory) decode them.

mod memory;
mod rest;
mod subscription;

pub use memory::MemoryStore;
pub use rest::RestStore;
pub use subscription::Subscription;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Full collection snapshot: record id -> record.
pub type Snapshot = BTreeMap<String, Value>;

/// Change callback. Receives the whole collection on every change.
pub type OnChange = Arc<dyn Fn(Snapshot) + Send + Sync>;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors a [`LiveStore`] backend may return. Never retried here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Network or transport failure.
    Transport(String),
    /// The backend answered with a non-success status.
    Api { status: u16, message: String },
    /// A response payload could not be decoded.
    Decode(String),
    /// A path did not have the `<collection>/<id>` shape.
    InvalidPath(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Transport(msg) => write!(f, "store transport error: {msg}"),
            StoreError::Api { status, message } => {
                write!(f, "store api error status={status}: {message}")
            }
            StoreError::Decode(msg) => write!(f, "store decode error: {msg}"),
            StoreError::InvalidPath(p) => write!(f, "invalid store path: '{p}'"),
        }
    }
}

impl std::error::Error for StoreError {}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// Hosted real-time document store contract.
///
/// Implementations must be object-safe (`Arc<dyn LiveStore>`) and
/// `Send + Sync` so commands can run from any async task.
#[async_trait::async_trait]
pub trait LiveStore: Send + Sync {
    /// Short backend name for logs and health output (`"memory"`, `"rest"`).
    fn backend_name(&self) -> &'static str;

    /// Deliver the current snapshot of `collection` immediately, then again on
    /// every change, until the returned [`Subscription`] is released.
    async fn subscribe(&self, collection: &str, on_change: OnChange)
        -> Result<Subscription, StoreError>;

    /// One-shot full read. A missing collection is an empty snapshot.
    async fn read_once(&self, collection: &str) -> Result<Snapshot, StoreError>;

    /// Read a single record at `<collection>/<id>`.
    async fn read_record(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Full replace of the record at `path`.
    async fn write_record(&self, path: &str, record: Value) -> Result<(), StoreError>;

    /// Allocate a fresh unique record path under `collection`. Writes nothing.
    fn generate_id(&self, collection: &str) -> String;

    async fn delete_record(&self, path: &str) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn record_path(collection: &str, id: &str) -> String {
    format!("{}/{}", collection.trim_matches('/'), id.trim_matches('/'))
}

/// Split `<collection>/<id>`. Nested paths are not supported.
pub fn split_record_path(path: &str) -> Result<(&str, &str), StoreError> {
    let trimmed = path.trim_matches('/');
    match trimmed.split_once('/') {
        Some((c, id)) if !c.is_empty() && !id.is_empty() && !id.contains('/') => Ok((c, id)),
        _ => Err(StoreError::InvalidPath(path.to_string())),
    }
}

/// Chronologically sortable, collision-resistant record id.
pub fn push_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis().max(0);
    let tail = uuid::Uuid::new_v4().simple().to_string();
    format!("-{millis:012x}{}", &tail[..8])
}

/// Interpret a raw collection payload. `null` is empty; arrays are keyed by
/// index with holes skipped.
pub fn snapshot_from_value(v: Value) -> Result<Snapshot, StoreError> {
    match v {
        Value::Null => Ok(Snapshot::new()),
        Value::Object(map) => Ok(map.into_iter().filter(|(_, v)| !v.is_null()).collect()),
        Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect()),
        other => Err(StoreError::Decode(format!(
            "expected an object for a collection, got {other}"
        ))),
    }
}
