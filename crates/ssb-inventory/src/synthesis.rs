//! Synthesis loading and the live synthesis feed.
//!
//! [`SynthesisFeed`] is the observer side: it subscribes to the three source
//! collections and reruns `compute_synthesis` on every change. Nothing is
//! cached between recomputations except the latest decoded snapshot of each
//! collection.

use std::sync::{Arc, Mutex, MutexGuard};

use ssb_reconcile::{available_zones, compute_synthesis, Collection, SynthesisRow};
use ssb_schemas::{collections, ConsumptionRecord, Product, Zone};
use ssb_store::{OnChange, Snapshot, Subscription};
use tracing::debug;

use crate::consumption::list_consumption;
use crate::products::list_products;
use crate::zones::list_zones;
use crate::{decode_collection, InventoryError, LiveStore};

/// One-shot synthesis: three reads, then the pure computation.
pub async fn load_synthesis(
    store: &dyn LiveStore,
    zone_filter: Option<&str>,
) -> Result<Vec<SynthesisRow>, InventoryError> {
    let products = list_products(store).await?;
    let zones = list_zones(store).await?;
    let consumption = list_consumption(store).await?;
    Ok(compute_synthesis(&products, &zones, &consumption, zone_filter))
}

/// Distinct zone labels currently present, sorted.
pub async fn load_zone_labels(store: &dyn LiveStore) -> Result<Vec<String>, InventoryError> {
    Ok(available_zones(&list_zones(store).await?))
}

pub type OnRows = Arc<dyn Fn(Vec<SynthesisRow>) + Send + Sync>;

#[derive(Clone, Copy, Debug)]
enum Source {
    Products,
    Zones,
    Consumption,
}

impl Source {
    fn collection(self) -> &'static str {
        match self {
            Source::Products => collections::PRODUCTS,
            Source::Zones => collections::ZONES,
            Source::Consumption => collections::CONSUMPTION,
        }
    }
}

#[derive(Default)]
struct Slots {
    products: Option<Collection<Product>>,
    zones: Option<Collection<Zone>>,
    consumption: Option<Collection<ConsumptionRecord>>,
}

struct FeedState {
    slots: Mutex<Slots>,
    zone_filter: Option<String>,
    on_rows: OnRows,
}

impl FeedState {
    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Slot update, recomputation and `on_rows` all run under the slot lock,
    /// so rows are published in the order the snapshots were applied and the
    /// last publication always reflects the newest slots. `on_rows` must not
    /// write to the store.
    fn apply(&self, source: Source, snapshot: Snapshot) {
        let collection = source.collection();
        let mut slots = self.lock();
        match source {
            Source::Products => slots.products = Some(decode_collection(collection, snapshot)),
            Source::Zones => slots.zones = Some(decode_collection(collection, snapshot)),
            Source::Consumption => slots.consumption = Some(decode_collection(collection, snapshot)),
        }
        let rows = match (&slots.products, &slots.zones, &slots.consumption) {
            (Some(p), Some(z), Some(c)) => compute_synthesis(p, z, c, self.zone_filter.as_deref()),
            // Still waiting for the first snapshot of some collection.
            _ => return,
        };
        debug!(changed = collection, rows = rows.len(), "synthesis recomputed");
        (self.on_rows)(rows);
    }
}

/// Live synthesis observer. Holds one subscription per source collection;
/// [`SynthesisFeed::stop`] or dropping the feed releases all of them.
pub struct SynthesisFeed {
    subscriptions: Vec<Subscription>,
}

impl SynthesisFeed {
    /// Subscribe to products, zones and consumption. `on_rows` fires once all
    /// three have delivered a first snapshot, then again after every change.
    pub async fn start(
        store: &dyn LiveStore,
        zone_filter: Option<String>,
        on_rows: OnRows,
    ) -> Result<Self, InventoryError> {
        let state = Arc::new(FeedState {
            slots: Mutex::new(Slots::default()),
            zone_filter,
            on_rows,
        });

        let mut subscriptions = Vec::with_capacity(3);
        for source in [Source::Products, Source::Zones, Source::Consumption] {
            let st = Arc::clone(&state);
            let on_change: OnChange = Arc::new(move |snap: Snapshot| st.apply(source, snap));
            // On error the subscriptions collected so far are dropped, which
            // releases them.
            subscriptions.push(store.subscribe(source.collection(), on_change).await?);
        }
        Ok(Self { subscriptions })
    }

    pub fn is_active(&self) -> bool {
        self.subscriptions.iter().any(Subscription::is_active)
    }

    pub fn stop(self) {
        for sub in self.subscriptions {
            sub.unsubscribe();
        }
    }
}

impl std::fmt::Debug for SynthesisFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthesisFeed")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}
