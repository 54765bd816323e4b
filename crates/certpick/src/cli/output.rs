use anyhow::Result;
use certpick_store::CertificateEntry;
use serde_json::json;
use time::format_description::well_known::Rfc3339;

use crate::cli::args::OutputFormat;

pub fn render<E: CertificateEntry>(entry: &E, format: OutputFormat) -> Result<String> {
    let metadata = entry.metadata();

    let rendered = match format {
        OutputFormat::Text => format!(
            "Subject:    {}\nIssuer:     {}\nSerial:     {}\nNot before: {}\nNot after:  {}\nThumbprint: {}",
            metadata.subject,
            metadata.issuer,
            metadata.serial_number,
            metadata.not_before.format(&Rfc3339)?,
            metadata.not_after.format(&Rfc3339)?,
            metadata.thumbprint
        ),
        OutputFormat::Json => serde_json::to_string_pretty(&json!({
            "subject": metadata.subject,
            "issuer": metadata.issuer,
            "serial_number": metadata.serial_number,
            "not_before": metadata.not_before.format(&Rfc3339)?,
            "not_after": metadata.not_after.format(&Rfc3339)?,
            "thumbprint": metadata.thumbprint,
        }))?,
        OutputFormat::Pem => entry.to_pem().trim_end().to_string(),
    };

    Ok(rendered)
}
