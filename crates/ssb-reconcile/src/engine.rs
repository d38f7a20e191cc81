use std::collections::BTreeSet;

use ssb_schemas::{coerce, ConsumptionRecord, Product, Zone};

use crate::{decompose, records_match, Collection, StockStatus, SynthesisRow};

fn find_product<'a>(products: &'a Collection<Product>, designation: &str) -> Option<&'a Product> {
    products
        .values()
        .find(|p| records_match(&p.designation, designation))
}

/// Total weight consumed for a product/zone pair. Negative weights count as 0.
fn consumed_weight(
    consumption: &Collection<ConsumptionRecord>,
    designation: &str,
    zone_label: &str,
) -> f64 {
    consumption
        .values()
        .filter(|c| records_match(&c.product_out, designation) && records_match(&c.zone_out, zone_label))
        .map(|c| coerce::non_negative(c.weight))
        .sum()
}

/// Reconcile one zone against its product and the consumption records.
///
/// Rounding is applied once, after the weight sum is converted to units.
pub fn synthesize_zone(
    zone_id: &str,
    zone: &Zone,
    product: &Product,
    consumption: &Collection<ConsumptionRecord>,
) -> SynthesisRow {
    let lot_size = product.lot_size();
    let unit_weight = product.effective_unit_weight();

    let initial_units = coerce::non_negative_int(zone.total_units);

    let weight_out = consumed_weight(consumption, &product.designation, &zone.zone);
    let consumed_units_raw = if unit_weight > 0.0 {
        weight_out / unit_weight
    } else {
        0.0
    };
    let consumed_units = coerce::rounded_units(consumed_units_raw);

    let remaining_units = coerce::rounded_units(initial_units as f64 - consumed_units_raw);

    SynthesisRow {
        zone_id: zone_id.to_string(),
        zone: zone.zone.clone(),
        designation: zone.designation_prod.clone(),
        lot_size,
        initial_units,
        initial: decompose(initial_units, lot_size),
        consumed_weight: weight_out,
        consumed_units,
        consumed: decompose(consumed_units, lot_size),
        remaining_units,
        remaining: decompose(remaining_units, lot_size),
        status: StockStatus::from_remaining(remaining_units),
    }
}

/// Deterministic synthesis over full snapshots:
/// - one row per zone whose designation matches a product, in zone-id order
/// - zones without a product are dropped silently
/// - duplicate (zone, designation) pairs stay separate rows
/// - `zone_filter` keeps only rows whose zone label equals it exactly
pub fn compute_synthesis(
    products: &Collection<Product>,
    zones: &Collection<Zone>,
    consumption: &Collection<ConsumptionRecord>,
    zone_filter: Option<&str>,
) -> Vec<SynthesisRow> {
    zones
        .iter()
        .filter_map(|(zone_id, zone)| {
            let product = find_product(products, &zone.designation_prod)?;
            Some(synthesize_zone(zone_id, zone, product, consumption))
        })
        .filter(|row| zone_filter.map_or(true, |f| row.zone == f))
        .collect()
}

/// Distinct zone labels, sorted. Feeds a zone filter picker.
pub fn available_zones(zones: &Collection<Zone>) -> Vec<String> {
    zones
        .values()
        .map(|z| z.zone.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
