use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    ConfigDirUnavailable(String),
    ReadFailed(String),
    ParseFailed(String),
    InvalidValue { key: String, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ConfigDirUnavailable(msg) => {
                write!(f, "Configuration directory unavailable: {msg}")
            }
            ConfigError::ReadFailed(msg) => write!(f, "Failed to read settings: {msg}"),
            ConfigError::ParseFailed(msg) => write!(f, "Failed to parse settings: {msg}"),
            ConfigError::InvalidValue { key, value } => {
                write!(f, "Invalid value for {key}: {value:?}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(error: std::io::Error) -> Self {
        ConfigError::ReadFailed(error.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(error: serde_json::Error) -> Self {
        ConfigError::ParseFailed(error.to_string())
    }
}
