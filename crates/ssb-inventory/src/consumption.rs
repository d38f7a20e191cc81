//! Consumption records: listing and the bulk reset.
//!
//! Records are produced by weighing devices; this crate only reads them and
//! deletes them in bulk.

use ssb_reconcile::{records_match, Collection};
use ssb_schemas::{collections, ConsumptionRecord};
use ssb_store::record_path;
use tracing::{error, info};

use crate::{decode_collection, InventoryError, LiveStore};

pub async fn list_consumption(
    store: &dyn LiveStore,
) -> Result<Collection<ConsumptionRecord>, InventoryError> {
    let snap = store.read_once(collections::CONSUMPTION).await?;
    Ok(decode_collection(collections::CONSUMPTION, snap))
}

/// Delete every consumption record matching `(product, zone)` and return how
/// many were removed.
///
/// One full read followed by sequential deletes. Not atomic: if a delete
/// fails the records already removed stay removed and the error carries
/// their count.
pub async fn reset_consumption(
    store: &dyn LiveStore,
    product: &str,
    zone: &str,
) -> Result<usize, InventoryError> {
    if product.trim().is_empty() || zone.trim().is_empty() {
        return Err(InventoryError::validation(
            "Veuillez spécifier un produit et une zone.",
        ));
    }

    let records = list_consumption(store).await?;
    let targets: Vec<&String> = records
        .iter()
        .filter(|(_, r)| records_match(&r.product_out, product) && records_match(&r.zone_out, zone))
        .map(|(id, _)| id)
        .collect();

    let mut deleted = 0usize;
    for id in targets {
        let path = record_path(collections::CONSUMPTION, id);
        if let Err(source) = store.delete_record(&path).await {
            error!(product = %product, zone = %zone, deleted, error = %source, "consumption reset interrupted");
            return Err(InventoryError::ResetInterrupted { deleted, source });
        }
        deleted += 1;
    }

    info!(product = %product, zone = %zone, deleted, "consumption reset");
    Ok(deleted)
}
