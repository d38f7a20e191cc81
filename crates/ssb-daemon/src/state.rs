//! Shared runtime state for ssb-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The store and the
//! account service are trait objects so tests can inject in-memory ones.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use ssb_inventory::{
    create_user, AccountService, AuthError, InventoryError, LiveStore, SynthesisFeed,
};
use ssb_reconcile::SynthesisRow;
use ssb_schemas::ROLE_ADMIN;
use tokio::sync::broadcast;
use tracing::info;

// ---------------------------------------------------------------------------
// BusMsg: SSE event bus payload
// ---------------------------------------------------------------------------

/// Messages broadcast over the internal event bus and surfaced as SSE events.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMsg {
    Heartbeat { ts_millis: i64 },
    Synthesis { rows: Vec<SynthesisRow> },
    LogLine { level: String, msg: String },
}

impl BusMsg {
    pub fn event_name(&self) -> &'static str {
        match self {
            BusMsg::Heartbeat { .. } => "heartbeat",
            BusMsg::Synthesis { .. } => "synthesis",
            BusMsg::LogLine { .. } => "log",
        }
    }
}

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    /// Broadcast bus for SSE.
    pub bus: broadcast::Sender<BusMsg>,
    pub build: BuildInfo,
    pub store: Arc<dyn LiveStore>,
    pub accounts: Arc<dyn AccountService>,
    /// Password given to accounts created without one. `None` disables that.
    pub initial_password: Option<String>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn LiveStore>,
        accounts: Arc<dyn AccountService>,
        initial_password: Option<String>,
    ) -> Self {
        let (bus, _rx) = broadcast::channel::<BusMsg>(1024);
        Self {
            bus,
            build: BuildInfo {
                service: "ssb-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            store,
            accounts,
            initial_password,
        }
    }

    pub fn log(&self, level: &str, msg: impl Into<String>) {
        let _ = self.bus.send(BusMsg::LogLine {
            level: level.to_string(),
            msg: msg.into(),
        });
    }

    /// Create the configured admin account and profile. An account that
    /// already exists is left as is.
    pub async fn bootstrap_admin(&self, email: &str, password: &str) -> Result<(), InventoryError> {
        match create_user(
            self.store.as_ref(),
            self.accounts.as_ref(),
            email,
            Some(password),
            password,
            ROLE_ADMIN,
        )
        .await
        {
            Ok((uid, _)) => {
                info!(uid = %uid, "bootstrap admin created");
                Ok(())
            }
            Err(InventoryError::Auth(AuthError::EmailInUse)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Background tasks
// ---------------------------------------------------------------------------

/// Spawn a background task that emits a heartbeat SSE every `interval`.
pub fn spawn_heartbeat(bus: broadcast::Sender<BusMsg>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let ts = chrono::Utc::now().timestamp_millis();
            let _ = bus.send(BusMsg::Heartbeat { ts_millis: ts });
        }
    });
}

/// Start the live synthesis feed and forward every recomputation onto the
/// bus. The feed stays active until the returned handle is stopped or dropped.
pub async fn start_synthesis_feed(state: &AppState) -> Result<SynthesisFeed, InventoryError> {
    let bus = state.bus.clone();
    let feed = SynthesisFeed::start(
        state.store.as_ref(),
        None,
        Arc::new(move |rows: Vec<SynthesisRow>| {
            // No receivers is fine: nobody is watching the stream yet.
            let _ = bus.send(BusMsg::Synthesis { rows });
        }),
    )
    .await?;
    info!(backend = state.store.backend_name(), "synthesis feed started");
    Ok(feed)
}
