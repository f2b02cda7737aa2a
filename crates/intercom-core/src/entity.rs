// ── Entity state ──
//
// Per-channel state for a presentation layer: naming, device linkage,
// availability and the optimistic switch state. Rendering is left to
// the consumer.

use serde::Serialize;
use strum::Display;

use intercom_api::{DeviceIdentity, MANUFACTURER};

use crate::coordinator::UpdateCoordinator;
use crate::model::{ChannelId, StatusSnapshot, Subsystem};
use crate::registry::EntityKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Port,
    Switch,
    Button,
}

impl EntityKind {
    /// The subsystem whose health decides availability.
    pub fn subsystem(self) -> Subsystem {
        match self {
            Self::Port => Subsystem::Ports,
            Self::Switch | Self::Button => Subsystem::Switches,
        }
    }
}

/// `"<kind>_<device id>_<channel>"`
pub fn unique_id(kind: EntityKind, device_id: &str, channel: &ChannelId) -> String {
    format!("{kind}_{device_id}_{channel}")
}

/// `"<kind> <channel>"`
pub fn display_name(kind: EntityKind, channel: &ChannelId) -> String {
    format!("{kind} {channel}")
}

/// Device registry entry shared by all entities of one intercom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub identifier: String,
    pub name: String,
    pub manufacturer: String,
    pub model: Option<String>,
    pub sw_version: Option<String>,
    /// Network connection, as `("mac", <address>)`.
    pub connection: (String, String),
}

impl From<&DeviceIdentity> for DeviceInfo {
    fn from(identity: &DeviceIdentity) -> Self {
        Self {
            identifier: identity.device_id.clone(),
            name: identity.device_name.clone(),
            manufacturer: MANUFACTURER.to_owned(),
            model: identity.variant.clone(),
            sw_version: identity.sw_version.clone(),
            connection: ("mac".to_owned(), identity.mac_addr.clone()),
        }
    }
}

/// Common behaviour of presented entities.
pub trait Entity {
    fn key(&self) -> &EntityKey;

    /// False whenever the owning subsystem failed in the latest applied
    /// snapshot, or the channel is no longer reported.
    fn available(&self) -> bool;

    /// Replace local state with what `snapshot` reports.
    fn apply(&mut self, snapshot: &StatusSnapshot);

    fn unique_id(&self, device_id: &str) -> String {
        let key = self.key();
        unique_id(key.kind, device_id, &key.channel)
    }

    fn name(&self) -> String {
        let key = self.key();
        display_name(key.kind, &key.channel)
    }
}

// ── Port sensor ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PortSensor {
    key: EntityKey,
    state: i64,
    available: bool,
}

impl PortSensor {
    pub fn new(channel: ChannelId, snapshot: &StatusSnapshot) -> Self {
        let mut sensor = Self {
            key: EntityKey::new(EntityKind::Port, channel),
            state: 0,
            available: false,
        };
        sensor.apply(snapshot);
        sensor
    }

    /// `None` while unavailable.
    pub fn is_on(&self) -> Option<bool> {
        self.available.then_some(self.state == 1)
    }
}

impl Entity for PortSensor {
    fn key(&self) -> &EntityKey {
        &self.key
    }

    fn available(&self) -> bool {
        self.available
    }

    fn apply(&mut self, snapshot: &StatusSnapshot) {
        let port = snapshot
            .is_available(Subsystem::Ports)
            .then(|| snapshot.port(&self.key.channel))
            .flatten();
        self.available = port.is_some();
        if let Some(port) = port {
            self.state = port.state;
        }
    }
}

// ── Switch ───────────────────────────────────────────────────────

/// On/off switch with optimistic state.
///
/// A successful command flips `active` immediately and marks the switch
/// available, since the device just answered for it; the next applied
/// snapshot is authoritative and overwrites both either way.
#[derive(Debug, Clone)]
pub struct SwitchEntity {
    key: EntityKey,
    active: bool,
    available: bool,
}

impl SwitchEntity {
    pub fn new(channel: ChannelId, snapshot: &StatusSnapshot) -> Self {
        let mut switch = Self {
            key: EntityKey::new(EntityKind::Switch, channel),
            active: false,
            available: false,
        };
        switch.apply(snapshot);
        switch
    }

    /// `None` while unavailable.
    pub fn is_on(&self) -> Option<bool> {
        self.available.then_some(self.active)
    }

    pub async fn turn_on(&mut self, coordinator: &UpdateCoordinator) -> bool {
        let ok = coordinator.turn_on(&self.key.channel).await;
        if ok {
            self.active = true;
            self.available = true;
        }
        ok
    }

    pub async fn turn_off(&mut self, coordinator: &UpdateCoordinator) -> bool {
        let ok = coordinator.turn_off(&self.key.channel).await;
        if ok {
            self.active = false;
            self.available = true;
        }
        ok
    }
}

impl Entity for SwitchEntity {
    fn key(&self) -> &EntityKey {
        &self.key
    }

    fn available(&self) -> bool {
        self.available
    }

    fn apply(&mut self, snapshot: &StatusSnapshot) {
        let switch = snapshot
            .is_available(Subsystem::Switches)
            .then(|| snapshot.switch(&self.key.channel))
            .flatten();
        self.available = switch.is_some();
        if let Some(switch) = switch {
            self.active = switch.active;
        }
    }
}

// ── Button ───────────────────────────────────────────────────────

/// Momentary trigger for a switch. Holds no state of its own.
#[derive(Debug, Clone)]
pub struct ButtonEntity {
    key: EntityKey,
    available: bool,
}

impl ButtonEntity {
    pub fn new(channel: ChannelId, snapshot: &StatusSnapshot) -> Self {
        let mut button = Self {
            key: EntityKey::new(EntityKind::Button, channel),
            available: false,
        };
        button.apply(snapshot);
        button
    }

    pub async fn press(&self, coordinator: &UpdateCoordinator) -> bool {
        coordinator.trigger(&self.key.channel).await
    }
}

impl Entity for ButtonEntity {
    fn key(&self) -> &EntityKey {
        &self.key
    }

    fn available(&self) -> bool {
        self.available
    }

    fn apply(&mut self, snapshot: &StatusSnapshot) {
        self.available = snapshot.is_available(Subsystem::Switches)
            && snapshot.switch(&self.key.channel).is_some();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Port, Switch};
    use serde_json::Map;

    fn identity() -> DeviceIdentity {
        DeviceIdentity {
            device_name: "Door".into(),
            mac_addr: "AA:BB:CC:DD:EE:FF".into(),
            device_id: "2N:AA:BB:CC:DD:EE:FF".into(),
            variant: Some("2N-X".into()),
            sw_version: Some("3.1".into()),
            system_info: Map::new(),
        }
    }

    fn with_port(state: i64) -> StatusSnapshot {
        let mut snap = StatusSnapshot::offline();
        snap.ports.push(Port {
            id: "relay1".into(),
            state,
        });
        snap.health.ports = true;
        snap
    }

    #[test]
    fn naming_formats() {
        let channel = ChannelId::Numeric(1);
        assert_eq!(
            unique_id(EntityKind::Switch, "2N:AA:BB:CC:DD:EE:FF", &channel),
            "switch_2N:AA:BB:CC:DD:EE:FF_1"
        );
        assert_eq!(display_name(EntityKind::Button, &channel), "button 1");
    }

    #[test]
    fn device_info_from_identity() {
        let info = DeviceInfo::from(&identity());
        assert_eq!(info.manufacturer, "2N");
        assert_eq!(info.model.as_deref(), Some("2N-X"));
        assert_eq!(info.sw_version.as_deref(), Some("3.1"));
        assert_eq!(info.connection, ("mac".into(), "AA:BB:CC:DD:EE:FF".into()));
    }

    #[test]
    fn port_sensor_follows_snapshot() {
        let mut sensor = PortSensor::new("relay1".into(), &with_port(1));
        assert_eq!(sensor.is_on(), Some(true));
        assert_eq!(sensor.name(), "port relay1");

        sensor.apply(&with_port(0));
        assert_eq!(sensor.is_on(), Some(false));

        sensor.apply(&StatusSnapshot::offline());
        assert!(!sensor.available());
        assert_eq!(sensor.is_on(), None);
    }

    #[test]
    fn switch_unavailable_when_channel_missing() {
        let mut snap = StatusSnapshot::offline();
        snap.health.switches = true;
        snap.switches.push(Switch {
            id: ChannelId::Numeric(1),
            active: true,
            locked: None,
            held: None,
        });

        let present = SwitchEntity::new(ChannelId::Numeric(1), &snap);
        assert_eq!(present.is_on(), Some(true));

        let missing = ButtonEntity::new(ChannelId::Numeric(2), &snap);
        assert!(!missing.available());
    }
}
