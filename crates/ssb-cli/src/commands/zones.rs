//! `ssb zones` and `ssb zone-adjust`.

use anyhow::Result;
use ssb_inventory::{adjust_zone_quantity, list_zones, LiveStore};
use ssb_reconcile::decompose;
use ssb_schemas::{coerce, Zone};

use super::kv;

pub async fn print_zones(store: &dyn LiveStore) -> Result<()> {
    let zones = list_zones(store).await?;
    for (id, zone) in &zones {
        println!("id={} {}", kv(id), format_zone(zone));
    }
    println!("zones={}", zones.len());
    Ok(())
}

pub async fn adjust(store: &dyn LiveStore, id: &str, lots: u64, units: u64) -> Result<()> {
    let zone = adjust_zone_quantity(store, id, lots, units).await?;
    println!("id={} {}", kv(id), format_zone(&zone));
    Ok(())
}

fn format_zone(zone: &Zone) -> String {
    let stock = decompose(coerce::non_negative_int(zone.total_units), zone.lot_size());
    format!(
        "zone={} designation={} total_units={} stock={}",
        kv(&zone.zone),
        kv(&zone.designation_prod),
        zone.total_units,
        kv(&stock.label()),
    )
}
