//! JSON REST backend (Realtime-Database style: `GET|PUT|DELETE <base>/<path>.json`).
//!
//! Subscriptions poll the collection on a fixed interval and fire the callback
//! only when the payload changed. The auth token is passed as the `auth`
//! query parameter and never logged.

use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    push_id, record_path, snapshot_from_value, split_record_path, LiveStore, OnChange, Snapshot,
    StoreError, Subscription,
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct RestStore {
    base_url: String,
    auth_token: Option<String>,
    http: reqwest::Client,
    poll_interval: Duration,
}

impl std::fmt::Debug for RestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStore")
            .field("base_url", &self.base_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<REDACTED>"))
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl RestStore {
    pub fn new(base_url: impl Into<String>, auth_token: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token,
            http: reqwest::Client::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}.json",
            self.base_url.trim_end_matches('/'),
            path.trim_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let rb = self.http.request(method, self.url(path));
        match &self.auth_token {
            Some(token) => rb.query(&[("auth", token.as_str())]),
            None => rb,
        }
    }

    async fn send(&self, rb: reqwest::RequestBuilder) -> Result<reqwest::Response, StoreError> {
        let resp = rb
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.without_url().to_string()))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(StoreError::Api {
            status: status.as_u16(),
            message: api_message(&body),
        })
    }

    async fn get_value(&self, path: &str) -> Result<Value, StoreError> {
        let resp = self.send(self.request(Method::GET, path)).await?;
        resp.json::<Value>()
            .await
            .map_err(|e| StoreError::Decode(e.without_url().to_string()))
    }
}

/// Pull the `error` field out of an error body when present.
fn api_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait::async_trait]
impl LiveStore for RestStore {
    fn backend_name(&self) -> &'static str {
        "rest"
    }

    async fn subscribe(
        &self,
        collection: &str,
        on_change: OnChange,
    ) -> Result<Subscription, StoreError> {
        let first = self.read_once(collection).await?;
        on_change(first.clone());

        let store = self.clone();
        let collection = collection.to_string();
        let handle = tokio::spawn(async move {
            let mut last = first;
            let mut ticker = tokio::time::interval(store.poll_interval);
            // First tick completes immediately; the initial snapshot was already delivered.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match store.read_once(&collection).await {
                    Ok(snap) if snap != last => {
                        debug!(collection = %collection, records = snap.len(), "change detected");
                        last = snap.clone();
                        on_change(snap);
                    }
                    Ok(_) => {}
                    Err(e) => warn!(collection = %collection, error = %e, "poll failed; retrying next tick"),
                }
            }
        });

        Ok(Subscription::new(move || handle.abort()))
    }

    async fn read_once(&self, collection: &str) -> Result<Snapshot, StoreError> {
        snapshot_from_value(self.get_value(collection).await?)
    }

    async fn read_record(&self, path: &str) -> Result<Option<Value>, StoreError> {
        split_record_path(path)?;
        let v = self.get_value(path).await?;
        Ok(if v.is_null() { None } else { Some(v) })
    }

    async fn write_record(&self, path: &str, record: Value) -> Result<(), StoreError> {
        split_record_path(path)?;
        self.send(self.request(Method::PUT, path).json(&record))
            .await
            .map(|_| ())
    }

    fn generate_id(&self, collection: &str) -> String {
        record_path(collection, &push_id())
    }

    async fn delete_record(&self, path: &str) -> Result<(), StoreError> {
        split_record_path(path)?;
        self.send(self.request(Method::DELETE, path))
            .await
            .map(|_| ())
    }
}
