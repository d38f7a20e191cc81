use serde_json::json;
use ssb_inventory::{
    create_product, create_zone, delete_product, delete_zone, list_products, list_zones,
    load_synthesis, update_product, InventoryError, LiveStore, NewProduct, NewZone,
};
use ssb_store::MemoryStore;

fn new_zone(zone: &str, designation: &str, lots: i64, units: i64) -> NewZone {
    NewZone {
        zone: zone.to_string(),
        designation: designation.to_string(),
        lots,
        units,
        client_ref: None,
    }
}

#[tokio::test]
async fn create_product_computes_total_weight_and_stamps_creation() {
    let store = MemoryStore::new();
    let (id, p) = create_product(&store, NewProduct::new(" Farine ", 1.25, 12))
        .await
        .unwrap();

    assert_eq!(p.designation, "Farine");
    assert_eq!(p.total_weight, 15.0);
    assert!(p.created_at.is_some());

    let raw = store.read_record(&format!("produits/{id}")).await.unwrap().unwrap();
    assert_eq!(raw["poids_unitaire"], json!(1.25));
    assert_eq!(raw["qte_par_lot"], json!(12));
    assert_eq!(raw["poids_total"], json!(15.0));
}

#[tokio::test]
async fn duplicate_designation_is_rejected() {
    let store = MemoryStore::new();
    create_product(&store, NewProduct::new("Sucre", 1.0, 20)).await.unwrap();

    let err = create_product(&store, NewProduct::new("  sucre", 2.0, 10))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation");
    assert_eq!(list_products(&store).await.unwrap().len(), 1);
}

#[tokio::test]
async fn update_keeps_creation_time_and_checks_other_records() {
    let store = MemoryStore::new();
    let (sucre, created) = create_product(&store, NewProduct::new("Sucre", 1.0, 20)).await.unwrap();
    create_product(&store, NewProduct::new("Sel", 0.5, 10)).await.unwrap();

    let updated = update_product(&store, &sucre, NewProduct::new("Sucre", 2.0, 25))
        .await
        .unwrap();
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.total_weight, 50.0);

    let err = update_product(&store, &sucre, NewProduct::new("SEL", 2.0, 25))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation");

    let err = update_product(&store, "missing", NewProduct::new("Riz", 1.0, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::NotFound { .. }));
}

#[tokio::test]
async fn zone_snapshots_the_product_lot_size() {
    let store = MemoryStore::new();
    let (pid, _) = create_product(&store, NewProduct::new("Sucre", 1.0, 20)).await.unwrap();

    let (_, zone) = create_zone(&store, new_zone("A1", "SUCRE", 2, 5)).await.unwrap();
    assert_eq!(zone.total_units, 45);
    assert_eq!(zone.units_per_lot_snapshot, 20);
    assert_eq!(zone.designation_prod, "Sucre");
    assert_eq!(zone.status_stock, 1);

    // A later change to the product lot size does not touch the zone record.
    update_product(&store, &pid, NewProduct::new("Sucre", 1.0, 10)).await.unwrap();
    let zones = list_zones(&store).await.unwrap();
    let stored = zones.values().next().unwrap();
    assert_eq!(stored.units_per_lot_snapshot, 20);
    assert_eq!(stored.total_units, 45);

    // The synthesis uses the product's current lot size.
    let rows = load_synthesis(&store, Some("A1")).await.unwrap();
    assert_eq!(rows[0].lot_size, 10);
    assert_eq!((rows[0].initial.lots, rows[0].initial.units), (4, 5));
}

#[tokio::test]
async fn zone_requires_label_and_known_product() {
    let store = MemoryStore::new();
    create_product(&store, NewProduct::new("Sucre", 1.0, 20)).await.unwrap();

    let err = create_zone(&store, new_zone("", "Sucre", 1, 0)).await.unwrap_err();
    assert_eq!(err.kind(), "validation");
    let err = create_zone(&store, new_zone("A1", "Riz", 1, 0)).await.unwrap_err();
    assert_eq!(err.kind(), "validation");
    assert!(list_zones(&store).await.unwrap().is_empty());
}

#[tokio::test]
async fn negative_form_quantities_are_clamped() {
    let store = MemoryStore::new();
    create_product(&store, NewProduct::new("Sucre", 1.0, 20)).await.unwrap();
    let (_, zone) = create_zone(&store, new_zone("A1", "Sucre", -3, 7)).await.unwrap();
    assert_eq!(zone.total_units, 7);
}

#[tokio::test]
async fn deleting_a_product_drops_its_zones_from_the_synthesis() {
    let store = MemoryStore::new();
    let (pid, _) = create_product(&store, NewProduct::new("Sucre", 1.0, 20)).await.unwrap();
    let (zid, _) = create_zone(&store, new_zone("A1", "Sucre", 1, 0)).await.unwrap();
    assert_eq!(load_synthesis(&store, None).await.unwrap().len(), 1);

    delete_product(&store, &pid).await.unwrap();
    assert!(load_synthesis(&store, None).await.unwrap().is_empty());
    assert_eq!(list_zones(&store).await.unwrap().len(), 1);

    delete_zone(&store, &zid).await.unwrap();
    let err = delete_zone(&store, &zid).await.unwrap_err();
    assert!(matches!(err, InventoryError::NotFound { .. }));
}
