// Switch control endpoint.
//
// Each helper is a single `call` to `/api/switch/ctrl`; success is the
// envelope's success flag and nothing else.

use serde::Serialize;
use strum::{Display, EnumString};
use tracing::debug;

use crate::client::DeviceClient;

/// Action sent to `/api/switch/ctrl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SwitchAction {
    On,
    Off,
    Trigger,
}

/// `/api/switch/ctrl?switch=<id>&action=<action>`
pub fn control_path(switch: &str, action: SwitchAction) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(switch.as_bytes()).collect();
    format!("/api/switch/ctrl?switch={encoded}&action={action}")
}

impl DeviceClient {
    /// Send `action` to `switch`, returning whether the device accepted it.
    pub async fn control(&self, switch: &str, action: SwitchAction) -> bool {
        debug!(switch, %action, "switch control");
        self.call_succeeded(&control_path(switch, action)).await
    }

    pub async fn turn_on(&self, switch: &str) -> bool {
        self.control(switch, SwitchAction::On).await
    }

    pub async fn turn_off(&self, switch: &str) -> bool {
        self.control(switch, SwitchAction::Off).await
    }

    pub async fn trigger(&self, switch: &str) -> bool {
        self.control(switch, SwitchAction::Trigger).await
    }
}
