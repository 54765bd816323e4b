#[derive(Clone, Debug)]
pub struct LogConfig {
    pub level: log::LevelFilter,
}

impl LogConfig {
    pub fn new(level: log::LevelFilter) -> Self {
        Self { level }
    }

    pub fn from_cli_level(level: Option<&str>) -> Self {
        match level {
            Some(level) => Self::new(super::parse_level(level)),
            None => Self::default(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new(log::LevelFilter::Warn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level_is_warn() {
        assert_eq!(LogConfig::from_cli_level(None).level, log::LevelFilter::Warn);
        assert_eq!(
            LogConfig::from_cli_level(Some("trace")).level,
            log::LevelFilter::Trace
        );
    }
}
