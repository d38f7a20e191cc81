//! ssb-reconcile
//!
//! Stock reconciliation engine.
//!
//! - Zones join products by designation (case-insensitive, trimmed)
//! - Consumption is recorded in weight and converted to units through the
//!   product's unit weight
//! - Rounding happens once, after summation, before lot/unit decomposition
//! - Unmatched zones are dropped; bad numbers are zeroed; nothing is ever
//!   negative
//!
//! Deterministic, pure logic. No IO. No store calls.

mod engine;
mod matching;
mod quantity;
mod types;

pub use engine::{available_zones, compute_synthesis, synthesize_zone};
pub use matching::{match_key, records_match};
pub use quantity::{compose, decompose, StockQuantity};
pub use types::*;
