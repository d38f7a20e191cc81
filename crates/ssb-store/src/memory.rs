//! In-process store with push notifications.
//!
//! Used by the daemon's `memory` backend and by every test that needs a live
//! store. Watcher callbacks run on the writer's task, outside the data lock,
//! so a callback may read the store again. Deliveries are serialized: the
//! snapshot is taken and handed to every callback under one delivery lock,
//! so the last snapshot a watcher sees is the latest state. A callback must
//! not write to the same store.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde_json::Value;

use crate::{
    push_id, record_path, split_record_path, LiveStore, OnChange, Snapshot, StoreError,
    Subscription,
};

struct Watcher {
    collection: String,
    on_change: OnChange,
}

#[derive(Default)]
struct Inner {
    data: BTreeMap<String, Snapshot>,
    watchers: BTreeMap<u64, Watcher>,
    next_watcher: u64,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    delivery: Arc<Mutex<()>>,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    // A panicking callback never runs under the data lock, so a poisoned
    // guard still holds consistent data.
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn lock_delivery(delivery: &Mutex<()>) -> MutexGuard<'_, ()> {
    delivery.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous write used to seed fixtures. Notifies watchers.
    pub fn seed(&self, path: &str, record: Value) -> Result<(), StoreError> {
        let (collection, id) = split_record_path(path)?;
        {
            let mut inner = lock(&self.inner);
            inner
                .data
                .entry(collection.to_string())
                .or_default()
                .insert(id.to_string(), record);
        }
        self.notify(collection);
        Ok(())
    }

    /// Number of live watchers across all collections.
    pub fn watcher_count(&self) -> usize {
        lock(&self.inner).watchers.len()
    }

    fn snapshot_of(inner: &Inner, collection: &str) -> Snapshot {
        inner.data.get(collection).cloned().unwrap_or_default()
    }

    fn notify(&self, collection: &str) {
        let _delivering = lock_delivery(&self.delivery);
        let (snapshot, callbacks) = {
            let inner = lock(&self.inner);
            let callbacks: Vec<OnChange> = inner
                .watchers
                .values()
                .filter(|w| w.collection == collection)
                .map(|w| Arc::clone(&w.on_change))
                .collect();
            (Self::snapshot_of(&inner, collection), callbacks)
        };
        for cb in callbacks {
            cb(snapshot.clone());
        }
    }
}

#[async_trait::async_trait]
impl LiveStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn subscribe(
        &self,
        collection: &str,
        on_change: OnChange,
    ) -> Result<Subscription, StoreError> {
        let collection = collection.trim_matches('/').to_string();
        let delivering = lock_delivery(&self.delivery);
        let (id, snapshot) = {
            let mut inner = lock(&self.inner);
            let id = inner.next_watcher;
            inner.next_watcher += 1;
            inner.watchers.insert(
                id,
                Watcher {
                    collection: collection.clone(),
                    on_change: Arc::clone(&on_change),
                },
            );
            (id, Self::snapshot_of(&inner, &collection))
        };

        on_change(snapshot);
        drop(delivering);

        let weak: Weak<Mutex<Inner>> = Arc::downgrade(&self.inner);
        Ok(Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                lock(&inner).watchers.remove(&id);
            }
        }))
    }

    async fn read_once(&self, collection: &str) -> Result<Snapshot, StoreError> {
        let inner = lock(&self.inner);
        Ok(Self::snapshot_of(&inner, collection.trim_matches('/')))
    }

    async fn read_record(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let (collection, id) = split_record_path(path)?;
        let inner = lock(&self.inner);
        Ok(inner.data.get(collection).and_then(|c| c.get(id)).cloned())
    }

    async fn write_record(&self, path: &str, record: Value) -> Result<(), StoreError> {
        if record.is_null() {
            return self.delete_record(path).await;
        }
        self.seed(path, record)
    }

    fn generate_id(&self, collection: &str) -> String {
        record_path(collection, &push_id())
    }

    async fn delete_record(&self, path: &str) -> Result<(), StoreError> {
        let (collection, id) = split_record_path(path)?;
        let removed = {
            let mut inner = lock(&self.inner);
            inner
                .data
                .get_mut(collection)
                .and_then(|c| c.remove(id))
                .is_some()
        };
        if removed {
            self.notify(collection);
        }
        Ok(())
    }
}
