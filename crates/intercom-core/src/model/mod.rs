// ── Domain model ──

pub mod channel;
pub mod snapshot;
pub mod status;

pub use channel::ChannelId;
pub use snapshot::{StatusSnapshot, Subsystem, SubsystemHealth};
pub use status::{Event, Port, Switch};
