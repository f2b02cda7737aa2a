// ── Status snapshot ──
//
// One complete polling cycle. Health flags describe this cycle only;
// nothing carries over from the previous one.

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{Display, EnumIter};

use super::channel::ChannelId;
use super::status::{Event, Port, Switch};

/// A polled area of the device API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Subsystem {
    Ports,
    Switches,
    Events,
}

/// Per-subsystem success flags for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubsystemHealth {
    pub ports: bool,
    pub switches: bool,
    pub events: bool,
}

impl SubsystemHealth {
    pub fn get(&self, subsystem: Subsystem) -> bool {
        match subsystem {
            Subsystem::Ports => self.ports,
            Subsystem::Switches => self.switches,
            Subsystem::Events => self.events,
        }
    }

    pub fn set(&mut self, subsystem: Subsystem, online: bool) {
        match subsystem {
            Subsystem::Ports => self.ports = online,
            Subsystem::Switches => self.switches = online,
            Subsystem::Events => self.events = online,
        }
    }

    /// True when at least one subsystem answered.
    pub fn any(&self) -> bool {
        self.ports || self.switches || self.events
    }
}

/// Result of one polling cycle.
///
/// A collection is empty whenever its subsystem failed this cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub ports: Vec<Port>,
    pub switches: Vec<Switch>,
    pub events: Vec<Event>,
    pub health: SubsystemHealth,
    pub fetched_at: DateTime<Utc>,
}

impl StatusSnapshot {
    /// Everything offline, nothing collected.
    pub fn offline() -> Self {
        Self {
            ports: Vec::new(),
            switches: Vec::new(),
            events: Vec::new(),
            health: SubsystemHealth::default(),
            fetched_at: Utc::now(),
        }
    }

    pub fn online(&self) -> bool {
        self.health.any()
    }

    pub fn is_available(&self, subsystem: Subsystem) -> bool {
        self.health.get(subsystem)
    }

    pub fn port(&self, id: &ChannelId) -> Option<&Port> {
        self.ports.iter().find(|p| &p.id == id)
    }

    pub fn switch(&self, id: &ChannelId) -> Option<&Switch> {
        self.switches.iter().find(|s| &s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn online_is_any_subsystem() {
        let mut snap = StatusSnapshot::offline();
        assert!(!snap.online());

        for subsystem in Subsystem::iter() {
            snap.health = SubsystemHealth::default();
            snap.health.set(subsystem, true);
            assert!(snap.online(), "{subsystem} alone should count as online");
            assert!(snap.is_available(subsystem));
        }
    }

    #[test]
    fn lookup_by_channel() {
        let mut snap = StatusSnapshot::offline();
        snap.switches.push(Switch {
            id: ChannelId::Numeric(2),
            active: true,
            locked: None,
            held: None,
        });
        assert!(snap.switch(&ChannelId::Numeric(2)).is_some());
        assert!(snap.switch(&ChannelId::Numeric(1)).is_none());
        assert!(snap.port(&"relay1".into()).is_none());
    }
}
