//! ssb-schemas
//!
//! Record shapes exactly as they live in the store, plus the lenient numeric
//! coercion every consumer reads them through. No IO.
//!
//! Field names on the wire are the store's (`qte_par_lot`, `prod_sortie`, ...);
//! the Rust names describe what the field means.

pub mod coerce;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Collection names in the store.
pub mod collections {
    pub const PRODUCTS: &str = "produits";
    pub const ZONES: &str = "zone";
    pub const CONSUMPTION: &str = "poids";
    pub const USERS: &str = "users";
}

// ---------------------------------------------------------------------------
// Product
// ---------------------------------------------------------------------------

/// A registered product. `designation` is the logical join key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, deserialize_with = "coerce::de::string")]
    pub designation: String,
    /// Weight of one unit.
    #[serde(rename = "poids_unitaire", default, deserialize_with = "coerce::de::decimal")]
    pub unit_weight: f64,
    /// Lot size. Values below 1 are read as 1 at the point of use.
    #[serde(rename = "qte_par_lot", default, deserialize_with = "coerce::de::integer")]
    pub units_per_lot: i64,
    /// Display only: `unit_weight * units_per_lot`, rounded to 2 decimals.
    #[serde(rename = "poids_total", default, deserialize_with = "coerce::de::decimal")]
    pub total_weight: f64,
    #[serde(rename = "ref_client", default, skip_serializing_if = "Option::is_none")]
    pub client_ref: Option<String>,
    #[serde(
        rename = "createdAt",
        default,
        deserialize_with = "coerce::de::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn new(designation: impl Into<String>, unit_weight: f64, units_per_lot: i64) -> Self {
        Self {
            designation: designation.into(),
            unit_weight,
            units_per_lot,
            total_weight: coerce::round2(unit_weight * units_per_lot as f64),
            client_ref: None,
            created_at: None,
        }
    }

    /// Lot size used for conversions (always `>= 1`).
    pub fn lot_size(&self) -> u64 {
        coerce::lot_size(self.units_per_lot)
    }

    /// Unit weight used for conversions (always `>= 0`).
    pub fn effective_unit_weight(&self) -> f64 {
        coerce::non_negative(self.unit_weight)
    }
}

// ---------------------------------------------------------------------------
// Zone
// ---------------------------------------------------------------------------

/// A storage bin: stock of one product (by designation) under a zone label.
///
/// Writes are full replacements, so fields this crate does not know about are
/// kept in `extra` and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    #[serde(default, deserialize_with = "coerce::de::string")]
    pub zone: String,
    /// Weak, name-based reference to [`Product::designation`].
    #[serde(rename = "designation_prod", default, deserialize_with = "coerce::de::string")]
    pub designation_prod: String,
    /// Stock in atomic units.
    #[serde(rename = "qte_total_unites", default, deserialize_with = "coerce::de::integer")]
    pub total_units: i64,
    /// Product lot size captured when the zone was created.
    #[serde(rename = "unite_par_lot", default, deserialize_with = "coerce::de::integer")]
    pub units_per_lot_snapshot: i64,
    /// 1 when `total_units > 0`, else 0.
    #[serde(rename = "status_stock", default, deserialize_with = "coerce::de::integer")]
    pub status_stock: i64,
    #[serde(rename = "ref_client", default, skip_serializing_if = "Option::is_none")]
    pub client_ref: Option<String>,
    #[serde(
        rename = "createdAt",
        default,
        deserialize_with = "coerce::de::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        rename = "modifiedAt",
        default,
        deserialize_with = "coerce::de::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Zone {
    pub fn new(
        zone: impl Into<String>,
        designation_prod: impl Into<String>,
        total_units: i64,
        units_per_lot_snapshot: i64,
    ) -> Self {
        Self {
            zone: zone.into(),
            designation_prod: designation_prod.into(),
            total_units,
            units_per_lot_snapshot,
            status_stock: stock_flag(total_units),
            client_ref: None,
            created_at: None,
            modified_at: None,
            extra: Map::new(),
        }
    }

    /// Lot size for this zone's own lot/unit display and adjustments.
    pub fn lot_size(&self) -> u64 {
        coerce::zone_lot_size(self.units_per_lot_snapshot)
    }

    /// Replace the stock quantity and recompute the derived status flag.
    pub fn set_total_units(&mut self, total_units: i64, at: DateTime<Utc>) {
        self.total_units = total_units;
        self.status_stock = stock_flag(total_units);
        self.modified_at = Some(at);
    }
}

/// Derived `status_stock` flag.
pub fn stock_flag(total_units: i64) -> i64 {
    if total_units > 0 {
        1
    } else {
        0
    }
}

// ---------------------------------------------------------------------------
// ConsumptionRecord ("poids")
// ---------------------------------------------------------------------------

/// A weight removed from a product/zone pair, reported by a weighing device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionRecord {
    #[serde(rename = "prod_sortie", default, deserialize_with = "coerce::de::string")]
    pub product_out: String,
    #[serde(rename = "zone_prod", default, deserialize_with = "coerce::de::string")]
    pub zone_out: String,
    #[serde(rename = "poids", default, deserialize_with = "coerce::de::decimal")]
    pub weight: f64,
}

impl ConsumptionRecord {
    pub fn new(product_out: impl Into<String>, zone_out: impl Into<String>, weight: f64) -> Self {
        Self {
            product_out: product_out.into(),
            zone_out: zone_out.into(),
            weight,
        }
    }
}

// ---------------------------------------------------------------------------
// UserProfile
// ---------------------------------------------------------------------------

/// Staff member profile stored under `users/<uid>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(
        rename = "createdAt",
        default,
        deserialize_with = "coerce::de::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

fn default_role() -> String {
    ROLE_USER.to_string()
}
