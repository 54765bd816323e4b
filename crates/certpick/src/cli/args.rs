use std::collections::HashMap;
use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{
    ArgAction,
    Parser,
    ValueEnum,
};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Pem,
}

#[derive(Parser, Debug)]
#[command(name = "certpick")]
#[command(about = "Select the best matching certificate from a certificate store")]
#[command(version)]
pub struct Cli {
    #[arg(
        short = 's',
        long,
        help = "Subject distinguished name to match exactly, e.g. \"CN=example.com\"",
        value_name = "DN"
    )]
    pub subject: Option<String>,

    #[arg(short = 'n', long, help = "Store to search (My, Root, ...)", value_name = "NAME")]
    pub store_name: Option<String>,

    #[arg(
        short = 'l',
        long,
        help = "Store location: current-user or local-machine",
        value_name = "LOCATION"
    )]
    pub location: Option<String>,

    #[arg(
        long,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        help = "Only consider certificates valid right now (true/false, yes/no, 1/0)",
        value_name = "BOOL"
    )]
    pub valid_only: Option<bool>,

    #[arg(short = 'c', long, help = "Path to a JSON settings file", value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Set the global log level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[arg(long, help = "Do not print status messages")]
    pub no_status: bool,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format"
    )]
    pub format: OutputFormat,
}

impl Cli {
    /// Settings overrides given on the command line, keyed like the
    /// settings map.
    pub fn overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();

        let values = [
            ("subject", &self.subject),
            ("store_name", &self.store_name),
            ("store_location", &self.location),
        ];
        for (key, value) in values {
            if let Some(value) = value {
                overrides.insert(key.to_string(), value.clone());
            }
        }
        if let Some(valid_only) = self.valid_only {
            overrides.insert("valid_only".to_string(), valid_only.to_string());
        }

        if self.no_status {
            overrides.insert("write_status_messages".to_string(), "false".to_string());
        }

        overrides
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_command_line() {
        let cli = Cli::try_parse_from([
            "certpick",
            "--subject",
            "CN=example.com",
            "--store-name",
            "Root",
            "--location",
            "local-machine",
            "--valid-only",
            "false",
            "--format",
            "json",
            "--no-status",
        ])
        .unwrap();

        assert_eq!(cli.subject.as_deref(), Some("CN=example.com"));
        assert_eq!(cli.valid_only, Some(false));
        assert_eq!(cli.format, OutputFormat::Json);

        let overrides = cli.overrides();
        assert_eq!(overrides.get("store_name").unwrap(), "Root");
        assert_eq!(overrides.get("store_location").unwrap(), "local-machine");
        assert_eq!(overrides.get("valid_only").unwrap(), "false");
        assert_eq!(overrides.get("write_status_messages").unwrap(), "false");
    }

    #[test]
    fn test_no_flags_no_overrides() {
        let cli = Cli::try_parse_from(["certpick"]).unwrap();

        assert!(cli.overrides().is_empty());
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_valid_only_accepts_boolish_values() {
        let cli = Cli::try_parse_from(["certpick", "--valid-only", "no"]).unwrap();
        assert_eq!(cli.valid_only, Some(false));
        assert_eq!(cli.overrides().get("valid_only").unwrap(), "false");

        let cli = Cli::try_parse_from(["certpick", "--valid-only", "1"]).unwrap();
        assert_eq!(cli.valid_only, Some(true));
        assert_eq!(cli.overrides().get("valid_only").unwrap(), "true");
    }

    #[test]
    fn test_valid_only_rejects_non_boolean() {
        assert!(Cli::try_parse_from(["certpick", "--valid-only", "maybe"]).is_err());
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["certpick", "--format", "xml"]).is_err());
    }
}
