pub mod config_dir;
pub mod error;
pub mod settings;

pub use error::ConfigError;
