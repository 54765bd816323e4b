use std::collections::HashMap;

use serde::{
    Deserialize,
    Serialize,
};

use super::store_location::StoreLocation;
use crate::utils::error::ConfigError;

/// Options read once by the host bootstrap code.
#[derive(Clone, Deserialize, Serialize, Debug, PartialEq, Eq)]
pub struct HostRunOptions {
    /// Print startup status text. Defaults to `true`.
    #[serde(default = "default_write_status_messages")]
    pub write_status_messages: bool,
}

/// The four values a host hands to the certificate selector.
#[derive(Clone, Deserialize, Serialize, Debug, PartialEq, Eq)]
pub struct CertificateSourceSettings {
    #[serde(default)]
    pub subject: String,

    #[serde(default = "default_store_name")]
    pub store_name: String,

    #[serde(default)]
    pub store_location: StoreLocation,

    #[serde(default = "default_valid_only")]
    pub valid_only: bool,
}

#[derive(Clone, Deserialize, Serialize, Debug, Default, PartialEq, Eq)]
pub struct HostSettings {
    #[serde(default)]
    pub run: HostRunOptions,

    #[serde(default)]
    pub certificate: CertificateSourceSettings,
}

fn default_write_status_messages() -> bool {
    true
}

fn default_store_name() -> String {
    "My".to_string()
}

fn default_valid_only() -> bool {
    true
}

impl Default for HostRunOptions {
    fn default() -> Self {
        Self {
            write_status_messages: default_write_status_messages(),
        }
    }
}

impl Default for CertificateSourceSettings {
    fn default() -> Self {
        Self {
            subject: String::new(),
            store_name: default_store_name(),
            store_location: StoreLocation::default(),
            valid_only: default_valid_only(),
        }
    }
}

impl HostSettings {
    /// Applies flat `key -> value` overrides on top of the current values.
    /// Unknown keys are ignored.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Result<(), ConfigError> {
        if let Some(value) = overrides.get("subject") {
            self.certificate.subject = value.clone();
        }

        if let Some(value) = overrides.get("store_name") {
            self.certificate.store_name = value.clone();
        }

        if let Some(value) = overrides.get("store_location") {
            self.certificate.store_location = value.parse()?;
        }

        if let Some(value) = overrides.get("valid_only") {
            self.certificate.valid_only = parse_bool("valid_only", value)?;
        }

        if let Some(value) = overrides.get("write_status_messages") {
            self.run.write_status_messages = parse_bool("write_status_messages", value)?;
        }

        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
