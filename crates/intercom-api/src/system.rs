// System information endpoint and the device identity derived from it.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::client::DeviceClient;
use crate::response::ResponseFailure;

/// Prefix for device ids: `"2N:" + MAC`.
pub const VENDOR_PREFIX: &str = "2N";

/// Manufacturer name reported for every device.
pub const MANUFACTURER: &str = "2N";

const SYSTEM_INFO_PATH: &str = "/api/system/info";

/// Identity of one device, fixed once fetched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceIdentity {
    pub device_name: String,
    pub mac_addr: String,
    /// `"<vendor prefix>:<mac>"`
    pub device_id: String,
    pub variant: Option<String>,
    pub sw_version: Option<String>,
    /// The full system info result, for fields not modelled above.
    #[serde(skip)]
    pub system_info: Map<String, Value>,
}

impl DeviceIdentity {
    /// Build an identity from a `/api/system/info` result.
    ///
    /// Returns `None` when `deviceName` or `macAddr` is missing.
    pub fn from_system_info(result: &Map<String, Value>) -> Option<Self> {
        let text = |key: &str| result.get(key).and_then(Value::as_str).map(String::from);

        let device_name = text("deviceName")?;
        let mac_addr = text("macAddr")?;

        Some(Self {
            device_id: format!("{VENDOR_PREFIX}:{mac_addr}"),
            device_name,
            mac_addr,
            variant: text("variant"),
            sw_version: text("swVersion"),
            system_info: result.clone(),
        })
    }
}

impl DeviceClient {
    /// Fetch the device identity.
    ///
    /// `GET /api/system/info`
    ///
    /// The identity is stored on first success and never refetched; build
    /// a new client to pick up a changed identity. Returns `false` if the
    /// call failed or the result lacks the required keys.
    pub async fn get_system_info(&self) -> bool {
        self.fetch_identity().await.is_ok()
    }

    /// Same as [`get_system_info`](Self::get_system_info), reporting why
    /// the fetch failed.
    ///
    /// A result without `deviceName` or `macAddr` fails as
    /// [`ResponseFailure::MissingResult`]. A device that could not be
    /// reached at all fails as [`ResponseFailure::Transport`].
    pub async fn fetch_identity(&self) -> Result<&DeviceIdentity, ResponseFailure> {
        if let Some(identity) = self.identity.get() {
            debug!("system info already loaded");
            return Ok(identity);
        }

        let resp = self.call(SYSTEM_INFO_PATH).await;
        let Some(result) = resp.result() else {
            warn!(status = resp.status_code(), "system info fetch failed");
            return Err(resp
                .failure()
                .cloned()
                .unwrap_or(ResponseFailure::MissingResult));
        };

        let Some(identity) = DeviceIdentity::from_system_info(result) else {
            warn!("system info lacks deviceName or macAddr");
            return Err(ResponseFailure::MissingResult);
        };

        debug!(device_id = %identity.device_id, name = %identity.device_name, "identity loaded");
        Ok(self.identity.get_or_init(|| identity))
    }

    /// The identity, once [`get_system_info`](Self::get_system_info) succeeded.
    pub fn identity(&self) -> Option<&DeviceIdentity> {
        self.identity.get()
    }
}
