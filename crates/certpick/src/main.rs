mod cli;
mod logging;

use std::process::ExitCode;

use clap::Parser;

use crate::cli::{
    Cli,
    CliHandler,
};
use crate::logging::{
    LogConfig,
    LoggerInitializer,
    StderrLoggerInitializer,
};

const ERROR_EXIT: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = LogConfig::from_cli_level(cli.log_level.as_deref());
    if let Err(e) = StderrLoggerInitializer.initialize(&config) {
        eprintln!("Warning: failed to initialize logger: {e}");
    }

    match CliHandler::new(cli).run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(ERROR_EXIT)
        }
    }
}
