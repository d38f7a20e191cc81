//! Request and response types for all ssb-daemon HTTP endpoints.
//!
//! No business logic lives here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ssb_reconcile::{decompose, StockQuantity, SynthesisRow};
use ssb_schemas::{coerce, Zone};

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
    pub store_backend: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
    /// Account service code for `auth` errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Records removed before a reset was interrupted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<usize>,
}

// ---------------------------------------------------------------------------
// /v1/auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub uid: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A stored record with its id inlined.
#[derive(Debug, Clone, Serialize)]
pub struct Entry<T> {
    pub id: String,
    #[serde(flatten)]
    pub record: T,
}

/// Zone listing row: the stored record plus its stock in lots/units.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneView {
    pub id: String,
    #[serde(flatten)]
    pub zone: Zone,
    pub stock: StockQuantity,
    pub stock_label: String,
}

impl ZoneView {
    pub fn new(id: String, zone: Zone) -> Self {
        let stock = decompose(coerce::non_negative_int(zone.total_units), zone.lot_size());
        Self {
            id,
            stock_label: stock.label(),
            stock,
            zone,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneQuantityRequest {
    #[serde(default, deserialize_with = "coerce::de::integer")]
    pub lots: i64,
    #[serde(default, deserialize_with = "coerce::de::integer")]
    pub units: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneLabelsResponse {
    pub zones: Vec<String>,
}

// ---------------------------------------------------------------------------
// /v1/synthesis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SynthesisQuery {
    pub zone: Option<String>,
}

/// Synthesis row with its display labels.
#[derive(Debug, Clone, Serialize)]
pub struct SynthesisRowView {
    #[serde(flatten)]
    pub row: SynthesisRow,
    pub initial_label: String,
    pub consumed_label: String,
    pub remaining_label: String,
    pub status_label: &'static str,
}

impl From<SynthesisRow> for SynthesisRowView {
    fn from(row: SynthesisRow) -> Self {
        Self {
            initial_label: row.initial.label(),
            consumed_label: row.consumed.label(),
            remaining_label: row.remaining.label(),
            status_label: row.status.label(),
            row,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SynthesisResponse {
    pub zone_filter: Option<String>,
    pub rows: Vec<SynthesisRowView>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub zone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    pub deleted: usize,
}

// ---------------------------------------------------------------------------
// /v1/users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}
