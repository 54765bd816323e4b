use super::config::LogConfig;

pub trait LoggerInitializer {
    fn initialize(&self, config: &LogConfig) -> Result<(), Box<dyn std::error::Error>>;
}

/// Logs to stderr so stdout carries only the selected certificate.
pub struct StderrLoggerInitializer;

impl LoggerInitializer for StderrLoggerInitializer {
    fn initialize(&self, config: &LogConfig) -> Result<(), Box<dyn std::error::Error>> {
        env_logger::Builder::new()
            .target(env_logger::Target::Stderr)
            .filter_level(config.level)
            .format_timestamp_millis()
            .try_init()?;

        Ok(())
    }
}
