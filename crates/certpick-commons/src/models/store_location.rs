use std::fmt;
use std::str::FromStr;

use serde::{
    Deserialize,
    Serialize,
};

use crate::utils::error::ConfigError;

/// Scope of a certificate store: the current user's stores or the
/// machine-wide ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StoreLocation {
    #[default]
    #[serde(alias = "current_user", alias = "current-user", alias = "user")]
    CurrentUser,
    #[serde(alias = "local_machine", alias = "local-machine", alias = "machine")]
    LocalMachine,
}

impl StoreLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreLocation::CurrentUser => "CurrentUser",
            StoreLocation::LocalMachine => "LocalMachine",
        }
    }
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreLocation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "currentuser" | "current_user" | "current-user" | "user" => {
                Ok(StoreLocation::CurrentUser)
            }
            "localmachine" | "local_machine" | "local-machine" | "machine" => {
                Ok(StoreLocation::LocalMachine)
            }
            _ => Err(ConfigError::InvalidValue {
                key: "store_location".to_string(),
                value: s.to_string(),
            }),
        }
    }
}
