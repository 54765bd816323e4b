use std::fmt;
use std::sync::Arc;

use certpick_commons::{
    CertificateSourceSettings,
    StoreLocation,
};
use log::{
    debug,
    info,
};
use time::OffsetDateTime;

use crate::entry::CertificateEntry;
use crate::error::StoreError;
use crate::repository::{
    CertificateRepository,
    EntryOf,
    RepositoryProvider,
};

type Clock = Box<dyn Fn() -> OffsetDateTime + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionQuery {
    pub subject: String,
    pub store_name: String,
    pub location: StoreLocation,
    pub valid_only: bool,
}

impl SelectionQuery {
    pub fn new(
        subject: impl Into<String>, store_name: impl Into<String>, location: StoreLocation,
        valid_only: bool,
    ) -> Self {
        Self {
            subject: subject.into(),
            store_name: store_name.into(),
            location,
            valid_only,
        }
    }
}

impl From<&CertificateSourceSettings> for SelectionQuery {
    fn from(settings: &CertificateSourceSettings) -> Self {
        Self::new(
            settings.subject.clone(),
            settings.store_name.clone(),
            settings.store_location,
            settings.valid_only,
        )
    }
}

/// Picks the best certificate for a subject out of one repository.
///
/// Every handle acquired during a call is released before the call returns,
/// except the selected entry, which the caller owns.
pub struct CertificateSelector<P> {
    provider: P,
    clock: Clock,
}

impl<P: RepositoryProvider> CertificateSelector<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            clock: Box::new(OffsetDateTime::now_utc),
        }
    }

    /// Replaces the wall clock used for validity checks.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> OffsetDateTime + Send + Sync + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    pub fn select(
        &self, subject: &str, store_name: &str, location: StoreLocation, valid_only: bool,
    ) -> Result<Option<EntryOf<P>>, StoreError> {
        if subject.is_empty() {
            return Err(StoreError::InvalidQuery(
                "subject must not be empty".to_string(),
            ));
        }

        let repository = self.provider.open(store_name, location)?;
        debug!("Opened certificate store {}\\{}", location, store_name);

        let snapshot = repository.snapshot()?;
        debug!(
            "Certificate store {}\\{} holds {} certificate(s)",
            location,
            store_name,
            snapshot.len()
        );

        let now = (self.clock)();
        let matches = repository.find_by_subject(&snapshot, subject, valid_only, now)?;
        debug!(
            "{} certificate(s) match subject '{}' (valid_only: {})",
            matches.len(),
            subject,
            valid_only
        );

        let selected = match matches.best(&snapshot) {
            Some(index) => snapshot.take(index),
            None => {
                drop(snapshot);
                None
            }
        };

        match &selected {
            Some(entry) => info!(
                "Selected certificate {} (thumbprint {}, expires {})",
                entry.subject(),
                entry.thumbprint(),
                entry.not_after()
            ),
            None => debug!(
                "No certificate for subject '{}' in {}\\{}",
                subject, location, store_name
            ),
        }

        Ok(selected)
    }

    pub fn select_query(&self, query: &SelectionQuery) -> Result<Option<EntryOf<P>>, StoreError> {
        self.select(
            &query.subject,
            &query.store_name,
            query.location,
            query.valid_only,
        )
    }
}

impl<P: fmt::Debug> fmt::Debug for CertificateSelector<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateSelector")
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

/// Runs a selection on the blocking thread pool.
///
/// Dropping the returned future does not stop the selection; it still runs
/// to completion and releases its handles.
pub async fn select_detached<P>(
    selector: Arc<CertificateSelector<P>>, query: SelectionQuery,
) -> Result<Option<EntryOf<P>>, StoreError>
where
    P: RepositoryProvider + Send + Sync + 'static,
    EntryOf<P>: Send + 'static,
{
    tokio::task::spawn_blocking(move || selector.select_query(&query))
        .await
        .map_err(|e| StoreError::query_failure(format!("selection task failed: {e}")))?
}
