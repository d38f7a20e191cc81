//! The synthesis feed publishes onto the SSE bus.

use std::sync::Arc;

use serde_json::json;
use ssb_daemon::state::{self, BusMsg};
use ssb_inventory::{adjust_zone_quantity, LocalAccountService};
use ssb_store::MemoryStore;

fn seeded_state() -> (Arc<state::AppState>, MemoryStore) {
    let store = MemoryStore::new();
    store
        .seed("produits/p1", json!({"designation": "Sucre", "poids_unitaire": 1, "qte_par_lot": 20}))
        .unwrap();
    store
        .seed("zone/z1", json!({"zone": "A1", "designation_prod": "Sucre", "qte_total_unites": 45, "unite_par_lot": 20}))
        .unwrap();
    let st = state::AppState::new(
        Arc::new(store.clone()),
        Arc::new(LocalAccountService::default().with_hash_cost(4)),
        None,
    );
    (Arc::new(st), store)
}

fn next_rows(rx: &mut tokio::sync::broadcast::Receiver<BusMsg>) -> Vec<ssb_reconcile::SynthesisRow> {
    loop {
        match rx.try_recv().expect("expected a bus message") {
            BusMsg::Synthesis { rows } => return rows,
            _ => continue,
        }
    }
}

#[tokio::test]
async fn feed_publishes_initial_rows_and_every_change() {
    let (st, store) = seeded_state();
    let mut rx = st.bus.subscribe();

    let feed = state::start_synthesis_feed(&st).await.unwrap();
    let rows = next_rows(&mut rx);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].initial_units, 45);

    adjust_zone_quantity(store_ref(&store), "z1", 1, 0).await.unwrap();
    let rows = next_rows(&mut rx);
    assert_eq!(rows[0].initial_units, 20);

    feed.stop();
    assert_eq!(store.watcher_count(), 0);
}

fn store_ref(store: &MemoryStore) -> &dyn ssb_inventory::LiveStore {
    store
}

#[test]
fn bus_messages_name_their_sse_events() {
    assert_eq!(BusMsg::Heartbeat { ts_millis: 0 }.event_name(), "heartbeat");
    assert_eq!(BusMsg::Synthesis { rows: vec![] }.event_name(), "synthesis");
    let log = BusMsg::LogLine {
        level: "INFO".into(),
        msg: "x".into(),
    };
    assert_eq!(log.event_name(), "log");
    let json = serde_json::to_value(&log).unwrap();
    assert_eq!(json["type"], "log_line");
}
