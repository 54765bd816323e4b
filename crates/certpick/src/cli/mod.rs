pub mod args;
pub mod handler;
pub mod output;
pub mod status;

pub use args::Cli;
pub use handler::CliHandler;
