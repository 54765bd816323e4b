use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{
    bail,
    Context,
    Result,
};
use certpick_commons::utils::settings::load_settings;
use certpick_commons::HostSettings;
use certpick_store::{
    platform_stores,
    select_detached,
    CertificateEntry,
    CertificateSelector,
    EntryOf,
    RepositoryProvider,
    SelectionQuery,
};
use log::debug;

use crate::cli::args::Cli;
use crate::cli::output::render;
use crate::cli::status::StatusReporter;

const NO_MATCH: u8 = 1;

pub struct CliHandler {
    cli: Cli,
}

impl CliHandler {
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    pub async fn run(self) -> Result<ExitCode> {
        let settings = self.resolve_settings()?;

        match self.select_and_render(&settings, platform_stores()).await? {
            Some(rendered) => {
                println!("{rendered}");
                Ok(ExitCode::SUCCESS)
            }
            None => Ok(ExitCode::from(NO_MATCH)),
        }
    }

    /// Defaults, then the settings file and environment, then the command
    /// line.
    pub fn resolve_settings(&self) -> Result<HostSettings> {
        let mut settings =
            load_settings(self.cli.config.as_deref()).context("Failed to load settings")?;

        settings
            .apply_overrides(&self.cli.overrides())
            .context("Invalid command line value")?;

        debug!("Resolved settings: {:?}", settings);
        Ok(settings)
    }

    pub async fn select_and_render<P>(
        &self, settings: &HostSettings, provider: P,
    ) -> Result<Option<String>>
    where
        P: RepositoryProvider + Send + Sync + 'static,
        EntryOf<P>: Send + 'static,
    {
        let status = StatusReporter::new(settings.run.write_status_messages);

        if settings.certificate.subject.is_empty() {
            bail!("No certificate subject configured; pass --subject or set CERTPICK_SUBJECT");
        }

        let query = SelectionQuery::from(&settings.certificate);
        status.report(format!(
            "Opening certificate store {}\\{}",
            query.location, query.store_name
        ));

        let selector = Arc::new(CertificateSelector::new(provider));
        let selected = select_detached(selector, query.clone())
            .await
            .with_context(|| format!("Failed to load certificate '{}'", query.subject))?;

        let Some(entry) = selected else {
            status.report(format!(
                "No certificate matching '{}' found in {}\\{}",
                query.subject, query.location, query.store_name
            ));
            return Ok(None);
        };

        status.report(format!(
            "Selected certificate {} (thumbprint {})",
            entry.subject(),
            entry.thumbprint()
        ));

        render(&entry, self.cli.format).map(Some)
    }
}
