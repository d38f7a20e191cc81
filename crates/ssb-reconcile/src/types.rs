use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::StockQuantity;

/// Full collection snapshot: opaque store id -> record.
pub type Collection<T> = BTreeMap<String, T>;

/// Remaining-stock status of a synthesis row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    InStock,
    Depleted,
}

impl StockStatus {
    pub fn from_remaining(remaining_units: u64) -> Self {
        if remaining_units > 0 {
            StockStatus::InStock
        } else {
            StockStatus::Depleted
        }
    }

    /// Store flag representation (`status_stock`).
    pub fn as_flag(&self) -> i64 {
        match self {
            StockStatus::InStock => 1,
            StockStatus::Depleted => 0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StockStatus::InStock => "En stock",
            StockStatus::Depleted => "Épuisé",
        }
    }
}

/// Derived per-zone report row. Not persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SynthesisRow {
    /// Store id of the zone record this row was derived from.
    pub zone_id: String,
    pub zone: String,
    /// Designation as written on the zone record.
    pub designation: String,
    /// Lot size taken from the matched product.
    pub lot_size: u64,
    pub initial_units: u64,
    pub initial: StockQuantity,
    /// Sum of matching consumption weights (each clamped to `>= 0`).
    pub consumed_weight: f64,
    pub consumed_units: u64,
    pub consumed: StockQuantity,
    pub remaining_units: u64,
    pub remaining: StockQuantity,
    pub status: StockStatus,
}
