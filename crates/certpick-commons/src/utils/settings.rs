use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{
    debug,
    info,
};

use crate::models::settings_model::HostSettings;
use crate::utils::config_dir::get_settings_path;
use crate::utils::error::ConfigError;

const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("CERTPICK_SUBJECT", "subject"),
    ("CERTPICK_STORE_NAME", "store_name"),
    ("CERTPICK_STORE_LOCATION", "store_location"),
    ("CERTPICK_VALID_ONLY", "valid_only"),
    ("CERTPICK_WRITE_STATUS_MESSAGES", "write_status_messages"),
];

pub fn load_settings_from_str(json: &str) -> Result<HostSettings, ConfigError> {
    let settings = serde_json::from_str(json)?;
    Ok(settings)
}

pub fn load_settings_file(path: &Path) -> Result<HostSettings, ConfigError> {
    let json = fs::read_to_string(path)
        .map_err(|e| ConfigError::ReadFailed(format!("{}: {e}", path.display())))?;
    let settings = load_settings_from_str(&json)
        .map_err(|e| ConfigError::ParseFailed(format!("{}: {e}", path.display())))?;

    info!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Resolves host settings: defaults, then the settings file, then
/// `CERTPICK_*` environment overrides.
///
/// An explicit path must exist. Without one, the default settings file is
/// read only when present.
pub fn load_settings(explicit_path: Option<&Path>) -> Result<HostSettings, ConfigError> {
    let mut settings = match explicit_path {
        Some(path) => load_settings_file(path)?,
        None => {
            let default_path = get_settings_path().map_err(ConfigError::ConfigDirUnavailable)?;
            if default_path.exists() {
                load_settings_file(&default_path)?
            } else {
                debug!(
                    "No settings file at {}, using defaults",
                    default_path.display()
                );
                HostSettings::default()
            }
        }
    };

    settings.apply_overrides(&env_overrides())?;
    Ok(settings)
}

pub fn env_overrides() -> HashMap<String, String> {
    overrides_from_vars(std::env::vars())
}

pub fn overrides_from_vars<I>(vars: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    vars.into_iter()
        .filter_map(|(name, value)| {
            ENV_OVERRIDES
                .iter()
                .find(|(env_name, _)| *env_name == name)
                .map(|(_, key)| (key.to_string(), value))
        })
        .collect()
}
