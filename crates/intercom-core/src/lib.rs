// intercom-core: polling core between intercom-api and consumers (CLI).

pub mod aggregator;
pub mod config;
pub mod coordinator;
pub mod entity;
pub mod error;
pub mod model;
pub mod registry;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use aggregator::{LogCursor, StatusAggregator};
pub use config::{DeviceConfig, TlsVerification};
pub use coordinator::{CoordinatorState, ObserverId, UpdateCoordinator};
pub use entity::{
    ButtonEntity, DeviceInfo, Entity, EntityKind, PortSensor, SwitchEntity, display_name,
    unique_id,
};
pub use error::CoreError;
pub use registry::{EntityKey, EntityRegistry, RegistryDiff};
pub use stream::{SnapshotStream, SnapshotWatchStream};

pub use intercom_api::{DeviceIdentity, SwitchAction};
pub use model::{ChannelId, Event, Port, StatusSnapshot, Subsystem, SubsystemHealth, Switch};
