// ── Runtime device configuration ──
//
// Describes how to reach one device. Carries credentials but never
// touches disk; the CLI builds a `DeviceConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use intercom_api::{TlsMode, TransportConfig};
use secrecy::SecretString;

/// TLS verification strategy.
///
/// There is deliberately no `Default`: accepting invalid certificates
/// must be chosen by whoever builds the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (factory self-signed certificates).
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => Self::System,
            TlsVerification::CustomCa(path) => Self::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => Self::DangerAcceptInvalid,
        }
    }
}

/// Configuration for connecting to a single device.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Bare host (`10.0.0.5`) or full base URL (`http://10.0.0.5:8080`).
    pub host: String,
    pub username: String,
    pub password: SecretString,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Delay between polling cycles while observers are registered.
    pub poll_interval: Duration,
}

impl DeviceConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: SecretString,
        tls: TlsVerification,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password,
            tls,
            timeout: Self::DEFAULT_TIMEOUT,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig::new(TlsMode::from(&self.tls)).with_timeout(self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_transport() {
        let config = DeviceConfig::new(
            "10.0.0.5",
            "admin",
            "secret".to_string().into(),
            TlsVerification::DangerAcceptInvalid,
        );
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(30));

        let transport = config.transport();
        assert_eq!(transport.tls, TlsMode::DangerAcceptInvalid);
        assert_eq!(transport.timeout, Duration::from_secs(30));
    }
}
