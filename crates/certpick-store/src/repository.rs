use certpick_commons::StoreLocation;
use time::OffsetDateTime;

use crate::entry::CertificateEntry;
use crate::error::StoreError;
use crate::snapshot::{
    MatchSet,
    Snapshot,
};

/// An opened, read-only connection to one named store. Dropping it closes
/// the store.
pub trait CertificateRepository {
    type Entry: CertificateEntry;

    /// Retrieves every entry of the store in enumeration order.
    ///
    /// On error, entries acquired before the failure must already be
    /// released when this returns.
    fn snapshot(&self) -> Result<Snapshot<Self::Entry>, StoreError>;

    /// Narrows `snapshot` to entries whose subject equals `subject`.
    ///
    /// Stores with an indexed lookup can override this; the default scans
    /// the snapshot.
    fn find_by_subject(
        &self, snapshot: &Snapshot<Self::Entry>, subject: &str, valid_only: bool,
        at: OffsetDateTime,
    ) -> Result<MatchSet, StoreError> {
        Ok(snapshot.filter(subject, valid_only, at))
    }
}

pub trait RepositoryProvider {
    type Repository: CertificateRepository;

    fn open(
        &self, store_name: &str, location: StoreLocation,
    ) -> Result<Self::Repository, StoreError>;
}

pub type EntryOf<P> =
    <<P as RepositoryProvider>::Repository as CertificateRepository>::Entry;
