use rustls::pki_types::CertificateDer;
use time::OffsetDateTime;

use crate::metadata::CertificateMetadata;

/// A handle to one certificate record retrieved from a repository.
///
/// Dropping the handle releases it. Implementations backed by reference
/// counted platform objects release exactly one reference per handle.
pub trait CertificateEntry {
    fn metadata(&self) -> &CertificateMetadata;

    fn der(&self) -> &[u8];

    /// Trust status as reported by the repository. Backends without a
    /// notion of trust report every record as trusted.
    fn is_trusted(&self) -> bool {
        true
    }

    fn is_valid_at(&self, at: OffsetDateTime) -> bool {
        self.is_trusted() && self.metadata().is_time_valid(at)
    }

    fn subject(&self) -> &str {
        &self.metadata().subject
    }

    fn not_after(&self) -> OffsetDateTime {
        self.metadata().not_after
    }

    fn thumbprint(&self) -> &str {
        &self.metadata().thumbprint
    }

    fn certificate_der(&self) -> CertificateDer<'static> {
        CertificateDer::from(self.der().to_vec())
    }

    fn to_pem(&self) -> String {
        pem::encode(&pem::Pem::new("CERTIFICATE", self.der().to_vec()))
    }
}
