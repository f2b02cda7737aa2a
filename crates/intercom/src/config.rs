//! CLI-aware wrappers over `intercom_config`: profile selection and
//! flag overrides. This is the single boundary where CLI types cross
//! into core's `DeviceConfig`.

use std::str::FromStr;

use clap::ValueEnum;
use intercom_config::{Config, Profile};
use intercom_core::DeviceConfig;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use intercom_config::{config_path, load_config, store_password};

/// Load config, returning a default if the file is missing or unreadable.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring unreadable config");
        Config::default()
    })
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// `--output`, else `[defaults] output`, else table.
pub fn output_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    global.output.unwrap_or_else(|| {
        OutputFormat::from_str(&config.defaults.output, true).unwrap_or(OutputFormat::Table)
    })
}

/// Apply `--host`, `--username`, `--insecure` and `--timeout` on top of a profile.
fn apply_overrides(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(ref host) = global.host {
        profile.host.clone_from(host);
    }
    if let Some(ref username) = global.username {
        profile.username = Some(username.clone());
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    profile
}

/// Build a `DeviceConfig` from the config file, profile, and CLI overrides.
///
/// Without a matching profile, `--host` alone is enough to describe a device.
pub fn resolve_device_config(global: &GlobalOpts, config: &Config) -> Result<DeviceConfig, CliError> {
    let profile_name = active_profile_name(global, config);

    let base = match config.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.host.is_some() => Profile::default(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(config),
            });
        }
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    let profile = apply_overrides(base, global);
    Ok(intercom_config::profile_to_device_config(
        &profile,
        &profile_name,
        &config.defaults,
    )?)
}

fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        "(none)".into()
    } else {
        config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}
