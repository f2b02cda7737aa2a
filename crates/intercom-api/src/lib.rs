//! Async Rust client for the 2N intercom HTTP API.
//!
//! - [`DeviceClient`] holds one digest-authenticated HTTPS session to a
//!   device and exposes `call(path)`, switch control, and the system info
//!   fetch that yields a [`DeviceIdentity`].
//! - [`DeviceResponse`] validates the `{"success": ..., "result": ...}`
//!   envelope. Expected failures never become errors; they become a
//!   response without a result.

pub mod auth;
pub mod client;
pub mod control;
pub mod error;
pub mod response;
pub mod system;
pub mod transport;

pub use auth::Credentials;
pub use client::DeviceClient;
pub use control::SwitchAction;
pub use error::Error;
pub use response::{DeviceResponse, ResponseFailure};
pub use system::{DeviceIdentity, MANUFACTURER, VENDOR_PREFIX};
pub use transport::{TlsMode, TransportConfig};
