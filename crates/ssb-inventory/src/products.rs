//! Product CRUD.

use chrono::Utc;
use serde::Deserialize;
use ssb_reconcile::{match_key, Collection};
use ssb_schemas::{coerce, collections, Product};
use ssb_store::record_path;
use tracing::info;

use crate::{decode_collection, decode_record, id_of, to_record, InventoryError, LiveStore};

/// Product form input. Numeric fields accept numbers or numeric strings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewProduct {
    #[serde(default, deserialize_with = "coerce::de::string")]
    pub designation: String,
    #[serde(alias = "poids_unitaire", default, deserialize_with = "coerce::de::decimal")]
    pub unit_weight: f64,
    #[serde(alias = "qte_par_lot", default, deserialize_with = "coerce::de::integer")]
    pub units_per_lot: i64,
    #[serde(alias = "ref_client", default)]
    pub client_ref: Option<String>,
}

impl NewProduct {
    pub fn new(designation: impl Into<String>, unit_weight: f64, units_per_lot: i64) -> Self {
        Self {
            designation: designation.into(),
            unit_weight,
            units_per_lot,
            client_ref: None,
        }
    }
}

pub async fn list_products(store: &dyn LiveStore) -> Result<Collection<Product>, InventoryError> {
    let snap = store.read_once(collections::PRODUCTS).await?;
    Ok(decode_collection(collections::PRODUCTS, snap))
}

fn validate(
    input: &NewProduct,
    existing: &Collection<Product>,
    editing: Option<&str>,
) -> Result<(), InventoryError> {
    if input.designation.trim().is_empty() {
        return Err(InventoryError::validation("La désignation est obligatoire."));
    }
    if input.units_per_lot < 1 {
        return Err(InventoryError::validation(
            "La quantité par lot doit être au moins 1.",
        ));
    }
    if !input.unit_weight.is_finite() || input.unit_weight < 0.0 {
        return Err(InventoryError::validation(
            "Le poids unitaire ne peut pas être négatif.",
        ));
    }

    let key = match_key(&input.designation);
    let taken = existing
        .iter()
        .any(|(id, p)| Some(id.as_str()) != editing && match_key(&p.designation) == key);
    if taken {
        return Err(InventoryError::validation(
            "Un produit avec cette désignation existe déjà.",
        ));
    }
    Ok(())
}

/// Insert a product under a store-generated id. Returns `(id, product)`.
pub async fn create_product(
    store: &dyn LiveStore,
    input: NewProduct,
) -> Result<(String, Product), InventoryError> {
    let existing = list_products(store).await?;
    validate(&input, &existing, None)?;

    let mut product = Product::new(
        input.designation.trim(),
        input.unit_weight,
        input.units_per_lot,
    );
    product.client_ref = input.client_ref;
    product.created_at = Some(Utc::now());

    let path = store.generate_id(collections::PRODUCTS);
    store.write_record(&path, to_record(&product)?).await?;
    let id = id_of(&path)?;

    info!(id = %id, designation = %product.designation, "product created");
    Ok((id, product))
}

/// Full replacement of an existing product. `createdAt` is carried over.
pub async fn update_product(
    store: &dyn LiveStore,
    id: &str,
    input: NewProduct,
) -> Result<Product, InventoryError> {
    let path = record_path(collections::PRODUCTS, id);
    let current: Product = match store.read_record(&path).await? {
        Some(raw) => decode_record(&path, raw)?,
        None => return Err(InventoryError::not_found(collections::PRODUCTS, id)),
    };

    let existing = list_products(store).await?;
    validate(&input, &existing, Some(id))?;

    let mut product = Product::new(
        input.designation.trim(),
        input.unit_weight,
        input.units_per_lot,
    );
    product.client_ref = input.client_ref.or(current.client_ref);
    product.created_at = current.created_at;

    store.write_record(&path, to_record(&product)?).await?;
    info!(id = %id, designation = %product.designation, "product updated");
    Ok(product)
}

/// Zones referencing the product by designation are left in place; they drop
/// out of the synthesis until a product with that designation exists again.
pub async fn delete_product(store: &dyn LiveStore, id: &str) -> Result<(), InventoryError> {
    let path = record_path(collections::PRODUCTS, id);
    if store.read_record(&path).await?.is_none() {
        return Err(InventoryError::not_found(collections::PRODUCTS, id));
    }
    store.delete_record(&path).await?;
    info!(id = %id, "product deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing() -> Collection<Product> {
        let mut c = Collection::new();
        c.insert("p1".to_string(), Product::new("Sucre", 1.0, 20));
        c
    }

    #[test]
    fn designation_collision_ignores_case_and_whitespace() {
        let err = validate(&NewProduct::new("  SUCRE ", 1.0, 10), &existing(), None).unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn editing_a_record_may_keep_its_own_designation() {
        assert!(validate(&NewProduct::new("sucre", 2.0, 10), &existing(), Some("p1")).is_ok());
    }

    #[test]
    fn rejects_bad_lot_size_and_weight() {
        let empty = Collection::new();
        assert!(validate(&NewProduct::new("Sel", 1.0, 0), &empty, None).is_err());
        assert!(validate(&NewProduct::new("Sel", -0.5, 5), &empty, None).is_err());
        assert!(validate(&NewProduct::new("   ", 1.0, 5), &empty, None).is_err());
    }

    #[test]
    fn form_input_accepts_numeric_strings() {
        let input: NewProduct = serde_json::from_value(serde_json::json!({
            "designation": "Farine",
            "unit_weight": "2.5",
            "units_per_lot": "12"
        }))
        .unwrap();
        assert_eq!(input.unit_weight, 2.5);
        assert_eq!(input.units_per_lot, 12);
    }
}
