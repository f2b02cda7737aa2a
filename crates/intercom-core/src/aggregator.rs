// ── Poll orchestration ──
//
// One `refresh()` is one cycle: ports, then switches, then events, each
// through the same client and each judged on its own. A failing
// subsystem only clears its own flag and collection.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use intercom_api::DeviceClient;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::model::{Event, StatusSnapshot, Subsystem};

const IO_STATUS_PATH: &str = "/api/io/status";
const SWITCH_STATUS_PATH: &str = "/api/switch/status";
const LOG_SUBSCRIBE_PATH: &str = "/api/log/subscribe";

/// Server-issued log subscription id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogCursor(String);

impl LogCursor {
    /// Accepts the numeric or string `id` returned by `/api/log/subscribe`.
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Self(n.to_string())),
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn pull_path(&self) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(self.0.as_bytes()).collect();
        format!("/api/log/pull?id={encoded}")
    }
}

impl fmt::Display for LogCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds a [`StatusSnapshot`] per cycle and owns the log cursor.
pub struct StatusAggregator {
    client: Arc<DeviceClient>,
    cursor: Option<LogCursor>,
}

impl StatusAggregator {
    pub fn new(client: Arc<DeviceClient>) -> Self {
        Self {
            client,
            cursor: None,
        }
    }

    pub fn client(&self) -> &Arc<DeviceClient> {
        &self.client
    }

    /// Current log subscription, if one is held.
    pub fn cursor(&self) -> Option<&LogCursor> {
        self.cursor.as_ref()
    }

    /// Run one full cycle.
    ///
    /// Always attempts all three subsystems and always returns a snapshot,
    /// even when every flag ends up false.
    pub async fn refresh(&mut self) -> StatusSnapshot {
        let mut snapshot = StatusSnapshot::offline();

        if let Some(ports) = self.fetch_list(Subsystem::Ports, IO_STATUS_PATH, "ports").await {
            snapshot.ports = ports;
            snapshot.health.ports = true;
        }

        if let Some(switches) = self
            .fetch_list(Subsystem::Switches, SWITCH_STATUS_PATH, "switches")
            .await
        {
            snapshot.switches = switches;
            snapshot.health.switches = true;
        }

        if let Some(events) = self.pull_events().await {
            snapshot.events = events;
            snapshot.health.events = true;
        }

        snapshot.fetched_at = Utc::now();
        debug!(
            ports = snapshot.health.ports,
            switches = snapshot.health.switches,
            events = snapshot.health.events,
            "refresh complete"
        );
        snapshot
    }

    async fn pull_events(&mut self) -> Option<Vec<Event>> {
        if self.cursor.is_none() {
            self.cursor = self.subscribe().await;
        }
        let path = self.cursor.as_ref()?.pull_path();

        let events = self.fetch_list(Subsystem::Events, &path, "events").await;
        if events.is_none() {
            debug!("dropping log subscription, re-subscribing next cycle");
            self.cursor = None;
        }
        events
    }

    async fn subscribe(&self) -> Option<LogCursor> {
        let resp = self.client.call(LOG_SUBSCRIBE_PATH).await;
        let cursor = resp.result_value("id").and_then(LogCursor::from_value);
        match &cursor {
            Some(c) => debug!(cursor = %c, "log subscription opened"),
            None => warn!(
                status = resp.status_code(),
                failure = ?resp.failure(),
                "log subscribe failed"
            ),
        }
        cursor
    }

    /// Call `path` and decode `result[key]` as a list.
    ///
    /// A missing key or an undecodable list counts as a failed fetch.
    async fn fetch_list<T: DeserializeOwned>(
        &self,
        subsystem: Subsystem,
        path: &str,
        key: &str,
    ) -> Option<Vec<T>> {
        let resp = self.client.call(path).await;
        let Some(value) = resp.result_value(key) else {
            warn!(
                %subsystem,
                status = resp.status_code(),
                failure = ?resp.failure(),
                "subsystem degraded"
            );
            return None;
        };

        match serde_json::from_value(value.clone()) {
            Ok(list) => Some(list),
            Err(e) => {
                warn!(%subsystem, error = %e, "subsystem returned malformed data");
                None
            }
        }
    }
}
