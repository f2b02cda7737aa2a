// ── Entity registry ──
//
// Tracks which (kind, channel) pairs exist on the device, diffed against
// each snapshot instead of rebuilt. A subsystem that is offline in a
// cycle says nothing about its channels, so its keys are left alone.

use indexmap::IndexSet;
use serde::Serialize;

use crate::entity::EntityKind;
use crate::model::{ChannelId, StatusSnapshot, Subsystem};

/// Stable identity of one presented entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub channel: ChannelId,
}

impl EntityKey {
    pub fn new(kind: EntityKind, channel: ChannelId) -> Self {
        Self { kind, channel }
    }
}

/// Keys added and removed by one [`EntityRegistry::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryDiff {
    pub added: Vec<EntityKey>,
    pub removed: Vec<EntityKey>,
}

impl RegistryDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct EntityRegistry {
    keys: IndexSet<EntityKey>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        self.keys.contains(key)
    }

    /// Registered keys in the order they first appeared.
    pub fn iter(&self) -> impl Iterator<Item = &EntityKey> {
        self.keys.iter()
    }

    /// Reconcile with `snapshot` and report what changed.
    pub fn apply(&mut self, snapshot: &StatusSnapshot) -> RegistryDiff {
        let mut diff = RegistryDiff::default();

        for subsystem in [Subsystem::Ports, Subsystem::Switches] {
            if !snapshot.is_available(subsystem) {
                continue;
            }
            let present = keys_for(snapshot, subsystem);

            let stale: Vec<EntityKey> = self
                .keys
                .iter()
                .filter(|k| k.kind.subsystem() == subsystem && !present.contains(*k))
                .cloned()
                .collect();
            for key in stale {
                self.keys.shift_remove(&key);
                diff.removed.push(key);
            }

            for key in present {
                if self.keys.insert(key.clone()) {
                    diff.added.push(key);
                }
            }
        }

        diff
    }
}

/// Every switch is presented twice: as an on/off switch and as a button.
fn keys_for(snapshot: &StatusSnapshot, subsystem: Subsystem) -> IndexSet<EntityKey> {
    match subsystem {
        Subsystem::Ports => snapshot
            .ports
            .iter()
            .map(|p| EntityKey::new(EntityKind::Port, p.id.clone()))
            .collect(),
        Subsystem::Switches => snapshot
            .switches
            .iter()
            .flat_map(|s| {
                [
                    EntityKey::new(EntityKind::Switch, s.id.clone()),
                    EntityKey::new(EntityKind::Button, s.id.clone()),
                ]
            })
            .collect(),
        Subsystem::Events => IndexSet::new(),
    }
}
