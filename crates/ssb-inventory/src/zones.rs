//! Zone CRUD and the quantity-adjust command.

use chrono::Utc;
use serde::Deserialize;
use ssb_reconcile::{compose, records_match, Collection};
use ssb_schemas::{coerce, collections, Zone};
use ssb_store::record_path;
use tracing::info;

use crate::products::list_products;
use crate::{decode_collection, decode_record, id_of, to_record, InventoryError, LiveStore};

/// Zone form input. `lots`/`units` are read leniently and clamped to `>= 0`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewZone {
    #[serde(default, deserialize_with = "coerce::de::string")]
    pub zone: String,
    #[serde(alias = "designation_prod", default, deserialize_with = "coerce::de::string")]
    pub designation: String,
    #[serde(default, deserialize_with = "coerce::de::integer")]
    pub lots: i64,
    #[serde(default, deserialize_with = "coerce::de::integer")]
    pub units: i64,
    #[serde(alias = "ref_client", default)]
    pub client_ref: Option<String>,
}

fn to_stored_units(total: u64) -> i64 {
    i64::try_from(total).unwrap_or(i64::MAX)
}

pub async fn list_zones(store: &dyn LiveStore) -> Result<Collection<Zone>, InventoryError> {
    let snap = store.read_once(collections::ZONES).await?;
    Ok(decode_collection(collections::ZONES, snap))
}

/// Create a zone for an existing product. The product's current lot size is
/// snapshotted onto the zone.
pub async fn create_zone(
    store: &dyn LiveStore,
    input: NewZone,
) -> Result<(String, Zone), InventoryError> {
    if input.zone.trim().is_empty() || input.designation.trim().is_empty() {
        return Err(InventoryError::validation(
            "Veuillez spécifier une zone et un produit.",
        ));
    }

    let products = list_products(store).await?;
    let product = products
        .values()
        .find(|p| records_match(&p.designation, &input.designation))
        .ok_or_else(|| InventoryError::validation("Produit introuvable pour cette désignation."))?;

    let lot_size = product.lot_size();
    let total = compose(
        coerce::non_negative_int(input.lots),
        coerce::non_negative_int(input.units),
        lot_size,
    );

    let now = Utc::now();
    let mut zone = Zone::new(
        input.zone.trim(),
        product.designation.clone(),
        to_stored_units(total),
        to_stored_units(lot_size),
    );
    zone.client_ref = input.client_ref;
    zone.created_at = Some(now);
    zone.modified_at = Some(now);

    let path = store.generate_id(collections::ZONES);
    store.write_record(&path, to_record(&zone)?).await?;
    let id = id_of(&path)?;

    info!(id = %id, zone = %zone.zone, designation = %zone.designation_prod, total_units = total, "zone created");
    Ok((id, zone))
}

/// Set a zone's stock to `lots * lot_size + units` and write the whole record
/// back. The lot size is the zone's own snapshot (fallback 20), not the
/// product's current one.
pub async fn adjust_zone_quantity(
    store: &dyn LiveStore,
    zone_id: &str,
    lots: u64,
    units: u64,
) -> Result<Zone, InventoryError> {
    let path = record_path(collections::ZONES, zone_id);
    let mut zone: Zone = match store.read_record(&path).await? {
        Some(raw) => decode_record(&path, raw)?,
        None => return Err(InventoryError::not_found(collections::ZONES, zone_id)),
    };

    let total = compose(lots, units, zone.lot_size());
    zone.set_total_units(to_stored_units(total), Utc::now());

    store.write_record(&path, to_record(&zone)?).await?;
    info!(id = %zone_id, total_units = total, status = zone.status_stock, "zone quantity adjusted");
    Ok(zone)
}

pub async fn delete_zone(store: &dyn LiveStore, zone_id: &str) -> Result<(), InventoryError> {
    let path = record_path(collections::ZONES, zone_id);
    if store.read_record(&path).await?.is_none() {
        return Err(InventoryError::not_found(collections::ZONES, zone_id));
    }
    store.delete_record(&path).await?;
    info!(id = %zone_id, "zone deleted");
    Ok(())
}
