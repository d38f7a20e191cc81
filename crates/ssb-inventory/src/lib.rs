//! ssb-inventory
//!
//! Commands over a [`LiveStore`]: products, zones, consumption reset, user
//! profiles, and the live synthesis feed. Also hosts the account service
//! boundary used for login.
//!
//! Every command takes `&dyn LiveStore` and performs its own round-trips;
//! nothing here caches store state between calls.

pub mod accounts;
pub mod consumption;
pub mod products;
pub mod synthesis;
pub mod users;
pub mod zones;

use std::fmt;

use serde::de::DeserializeOwned;
use ssb_reconcile::Collection;
use ssb_store::{Snapshot, StoreError};
use tracing::warn;

pub use accounts::{AccountService, AuthError, Identity, LocalAccountService, Session};
pub use consumption::{list_consumption, reset_consumption};
pub use products::{create_product, delete_product, list_products, update_product, NewProduct};
pub use ssb_store::LiveStore;
pub use synthesis::{load_synthesis, load_zone_labels, SynthesisFeed};
pub use users::{create_user, delete_user, list_users};
pub use zones::{adjust_zone_quantity, create_zone, delete_zone, list_zones, NewZone};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum InventoryError {
    /// A required argument was missing or invalid. Nothing touched the store.
    Validation(String),
    /// The referenced record is not (or no longer) present.
    NotFound { collection: &'static str, id: String },
    /// Store read/write/delete failed. Not retried.
    Store(StoreError),
    /// A bulk reset stopped part-way; `deleted` records were removed first.
    ResetInterrupted { deleted: usize, source: StoreError },
    Auth(AuthError),
}

impl InventoryError {
    pub fn validation(msg: impl Into<String>) -> Self {
        InventoryError::Validation(msg.into())
    }

    pub fn not_found(collection: &'static str, id: impl Into<String>) -> Self {
        InventoryError::NotFound {
            collection,
            id: id.into(),
        }
    }

    /// Stable machine-readable kind for API bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            InventoryError::Validation(_) => "validation",
            InventoryError::NotFound { .. } => "not_found",
            InventoryError::Store(_) => "store",
            InventoryError::ResetInterrupted { .. } => "reset_interrupted",
            InventoryError::Auth(_) => "auth",
        }
    }
}

impl fmt::Display for InventoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InventoryError::Validation(msg) => write!(f, "{msg}"),
            InventoryError::NotFound { collection, id } => {
                write!(f, "record not found: {collection}/{id}")
            }
            InventoryError::Store(e) => write!(f, "{e}"),
            InventoryError::ResetInterrupted { deleted, source } => {
                write!(f, "reset interrupted after {deleted} deletion(s): {source}")
            }
            InventoryError::Auth(e) => write!(f, "{}", e.user_message()),
        }
    }
}

impl std::error::Error for InventoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InventoryError::Store(e) => Some(e),
            InventoryError::ResetInterrupted { source, .. } => Some(source),
            InventoryError::Auth(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for InventoryError {
    fn from(e: StoreError) -> Self {
        InventoryError::Store(e)
    }
}

impl From<AuthError> for InventoryError {
    fn from(e: AuthError) -> Self {
        InventoryError::Auth(e)
    }
}

// ---------------------------------------------------------------------------
// Snapshot decoding
// ---------------------------------------------------------------------------

/// Decode a raw snapshot into typed records. Records that are not objects are
/// skipped with a warning; field-level garbage is absorbed by the lenient
/// deserializers in `ssb_schemas::coerce`.
pub fn decode_collection<T: DeserializeOwned>(collection: &str, snapshot: Snapshot) -> Collection<T> {
    snapshot
        .into_iter()
        .filter_map(|(id, raw)| match serde_json::from_value::<T>(raw) {
            Ok(rec) => Some((id, rec)),
            Err(e) => {
                warn!(collection = collection, id = %id, error = %e, "skipping undecodable record");
                None
            }
        })
        .collect()
}

/// Decode one record fetched by path.
pub(crate) fn decode_record<T: DeserializeOwned>(
    path: &str,
    raw: serde_json::Value,
) -> Result<T, InventoryError> {
    serde_json::from_value(raw)
        .map_err(|e| InventoryError::Store(StoreError::Decode(format!("{path}: {e}"))))
}

pub(crate) fn to_record<T: serde::Serialize>(rec: &T) -> Result<serde_json::Value, InventoryError> {
    serde_json::to_value(rec).map_err(|e| InventoryError::Store(StoreError::Decode(e.to_string())))
}

/// Id part of a generated `<collection>/<id>` path.
pub(crate) fn id_of(path: &str) -> Result<String, InventoryError> {
    let (_, id) = ssb_store::split_record_path(path)?;
    Ok(id.to_string())
}
