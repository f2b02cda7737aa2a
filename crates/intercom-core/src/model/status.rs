// ── Per-subsystem status records ──
//
// Shapes follow the device's JSON. Unknown fields are ignored so newer
// firmware does not break parsing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::channel::ChannelId;

/// One entry of `/api/io/status` `ports`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    #[serde(rename = "port")]
    pub id: ChannelId,
    /// Raw level; `1` means active.
    pub state: i64,
}

impl Port {
    pub fn is_on(&self) -> bool {
        self.state == 1
    }
}

/// One entry of `/api/switch/status` `switches`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Switch {
    #[serde(rename = "switch")]
    pub id: ChannelId,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub held: Option<bool>,
}

/// One entry of `/api/log/pull` `events`.
///
/// Event payloads vary by kind, so `params` stays untyped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(rename = "event", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub utc_time: Option<i64>,
    #[serde(default)]
    pub up_time: Option<i64>,
    #[serde(default)]
    pub params: Value,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn port_is_on_only_at_one() {
        let ports: Vec<Port> = serde_json::from_value(json!([
            { "port": "relay1", "state": 1 },
            { "port": "input1", "state": 0, "type": "input" },
        ]))
        .unwrap();
        assert!(ports[0].is_on());
        assert!(!ports[1].is_on());
    }

    #[test]
    fn switch_optional_flags() {
        let sw: Switch =
            serde_json::from_value(json!({ "switch": 1, "active": true, "locked": false })).unwrap();
        assert_eq!(sw.id, ChannelId::Numeric(1));
        assert!(sw.active);
        assert_eq!(sw.locked, Some(false));
        assert_eq!(sw.held, None);
    }

    #[test]
    fn event_fields_are_lenient() {
        let ev: Event = serde_json::from_value(json!({
            "id": 7,
            "event": "KeyPressed",
            "utcTime": 1_700_000_000,
            "params": { "key": "1" }
        }))
        .unwrap();
        assert_eq!(ev.kind.as_deref(), Some("KeyPressed"));
        assert_eq!(ev.params["key"], "1");
        assert!(ev.up_time.is_none());
    }
}
