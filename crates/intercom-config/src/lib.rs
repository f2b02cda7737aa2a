//! Shared configuration for the intercom CLI.
//!
//! TOML profiles, password resolution (env + keyring + plaintext), and
//! translation to `intercom_core::DeviceConfig`. Core never reads these
//! types; it receives a finished `DeviceConfig`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use intercom_core::{DeviceConfig, TlsVerification};

/// Keyring service under which passwords are stored.
pub const KEYRING_SERVICE: &str = "intercom";

/// Environment variable consulted after a profile's `password_env`.
pub const PASSWORD_ENV: &str = "INTERCOM_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named device profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Seconds between polling cycles.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Accept self-signed certificates unless a profile says otherwise.
    #[serde(default = "default_insecure")]
    pub insecure: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
            insecure: default_insecure(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_poll_interval() -> u64 {
    5
}
fn default_insecure() -> bool {
    true
}

/// A named device profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Device address: bare host or full URL.
    pub host: String,

    pub username: Option<String>,

    /// Plaintext password (prefer keyring or env var).
    pub password: Option<String>,

    /// Name of an environment variable holding the password.
    pub password_env: Option<String>,

    /// PEM file with the CA that signed the device certificate.
    pub ca_cert: Option<PathBuf>,

    pub insecure: Option<bool>,

    pub timeout: Option<u64>,

    pub poll_interval: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "intercom").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("intercom");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the default path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file yields the defaults.
///
/// Nested keys use a double underscore: `INTERCOM_DEFAULTS__OUTPUT=json`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("INTERCOM_").split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to the canonical path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/password"),
    )?)
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password)?;
    Ok(())
}

/// Resolve a profile's password.
///
/// Order: `password_env` → `INTERCOM_PASSWORD` → keyring → plaintext.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's own env var
    if let Some(ref env_name) = profile.password_env {
        if let Ok(pw) = std::env::var(env_name) {
            return Ok(SecretString::from(pw));
        }
    }

    // 2. Global env var
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(pw));
    }

    // 3. Keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// TLS strategy for a profile.
///
/// An explicit `insecure = true` wins, then `ca_cert`, then an explicit
/// `insecure = false` (system roots), then the global default.
pub fn resolve_tls(profile: &Profile, defaults: &Defaults) -> TlsVerification {
    match (profile.insecure, &profile.ca_cert) {
        (Some(true), _) => TlsVerification::DangerAcceptInvalid,
        (_, Some(ca_path)) => TlsVerification::CustomCa(ca_path.clone()),
        (Some(false), None) => TlsVerification::SystemDefaults,
        (None, None) if defaults.insecure => TlsVerification::DangerAcceptInvalid,
        (None, None) => TlsVerification::SystemDefaults,
    }
}

/// Build a `DeviceConfig` from a profile and an already-resolved password.
pub fn build_device_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    password: SecretString,
) -> Result<DeviceConfig, ConfigError> {
    let host = profile.host.trim();
    if host.is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: format!("profile '{profile_name}' has no host"),
        });
    }

    let username = profile
        .username
        .clone()
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;

    let poll_secs = profile.poll_interval.unwrap_or(defaults.poll_interval);
    if poll_secs == 0 {
        return Err(ConfigError::Validation {
            field: "poll_interval".into(),
            reason: "must be at least 1 second".into(),
        });
    }

    let mut config = DeviceConfig::new(host, username, password, resolve_tls(profile, defaults));
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.poll_interval = Duration::from_secs(poll_secs);
    Ok(config)
}

/// Build a `DeviceConfig` from a profile, resolving the password.
pub fn profile_to_device_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<DeviceConfig, ConfigError> {
    let password = resolve_password(profile, profile_name)?;
    build_device_config(profile, profile_name, defaults, password)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    fn profile() -> Profile {
        Profile {
            host: "10.0.0.5".into(),
            username: Some("admin".into()),
            ..Profile::default()
        }
    }

    #[test]
    fn tls_resolution_order() {
        let defaults = Defaults::default();
        let mut p = profile();
        assert_eq!(resolve_tls(&p, &defaults), TlsVerification::DangerAcceptInvalid);

        p.ca_cert = Some("/etc/intercom/ca.pem".into());
        assert_eq!(
            resolve_tls(&p, &defaults),
            TlsVerification::CustomCa("/etc/intercom/ca.pem".into())
        );

        p.insecure = Some(true);
        assert_eq!(resolve_tls(&p, &defaults), TlsVerification::DangerAcceptInvalid);

        p.ca_cert = None;
        p.insecure = Some(false);
        assert_eq!(resolve_tls(&p, &defaults), TlsVerification::SystemDefaults);
    }

    #[test]
    fn strict_default_uses_system_roots() {
        let defaults = Defaults {
            insecure: false,
            ..Defaults::default()
        };
        assert_eq!(resolve_tls(&profile(), &defaults), TlsVerification::SystemDefaults);
    }

    #[test]
    fn builds_device_config_with_overrides() {
        let mut p = profile();
        p.poll_interval = Some(10);
        let config =
            build_device_config(&p, "door", &Defaults::default(), "pw".to_string().into()).unwrap();

        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.username, "admin");
        assert_eq!(config.password.expose_secret(), "pw");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.poll_interval, Duration::from_secs(10));
    }

    #[test]
    fn missing_username_is_no_credentials() {
        let mut p = profile();
        p.username = None;
        let err = build_device_config(&p, "door", &Defaults::default(), "pw".to_string().into())
            .unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { ref profile } if profile == "door"));
    }

    #[test]
    fn zero_poll_interval_rejected() {
        let mut p = profile();
        p.poll_interval = Some(0);
        let err = build_device_config(&p, "door", &Defaults::default(), "pw".to_string().into())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "poll_interval"));
    }

    #[test]
    fn loads_profiles_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "door"

[defaults]
output = "json"

[profiles.door]
host = "192.168.1.50"
username = "admin"
password_env = "DOOR_PW"
insecure = false
"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.default_profile.as_deref(), Some("door"));
        assert_eq!(config.defaults.output, "json");
        assert_eq!(config.defaults.poll_interval, 5);

        let door = &config.profiles["door"];
        assert_eq!(door.host, "192.168.1.50");
        assert_eq!(door.password_env.as_deref(), Some("DOOR_PW"));
        assert_eq!(door.insecure, Some(false));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.profiles.insert("door".into(), profile());
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profiles["door"].host, "10.0.0.5");
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.default_profile.as_deref(), Some("default"));
        assert!(config.profiles.is_empty());
        assert!(config.defaults.insecure);
    }
}
