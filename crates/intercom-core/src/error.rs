// ── Core error types ──
//
// Polling itself never fails: degraded subsystems show up as health
// flags. These errors cover setup and configuration only.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// The identity fetch failed during setup; the device cannot be named.
    #[error("Cannot read device identity from {host}")]
    IdentityUnavailable { host: String },

    #[error("Cannot connect to device at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<intercom_api::Error> for CoreError {
    fn from(err: intercom_api::Error) -> Self {
        match err {
            intercom_api::Error::InvalidUrl(e) => Self::Config {
                message: format!("invalid device address: {e}"),
            },
            intercom_api::Error::Tls(message) => Self::Config { message },
            intercom_api::Error::Transport(e) => Self::ConnectionFailed {
                url: e.url().map(ToString::to_string).unwrap_or_default(),
                reason: e.to_string(),
            },
            intercom_api::Error::Digest { message } => Self::Internal(message),
        }
    }
}
