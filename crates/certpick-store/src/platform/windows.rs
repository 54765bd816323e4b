use std::fmt;

use certpick_commons::StoreLocation;
use log::{
    debug,
    warn,
};
use schannel::cert_context::CertContext;
use schannel::cert_store::CertStore;

use crate::entry::CertificateEntry;
use crate::error::StoreError;
use crate::metadata::CertificateMetadata;
use crate::repository::{
    CertificateRepository,
    RepositoryProvider,
};
use crate::snapshot::Snapshot;

/// Windows system certificate stores.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemStores;

impl SystemStores {
    pub fn new() -> Self {
        Self
    }
}

impl RepositoryProvider for SystemStores {
    type Repository = SystemRepository;

    fn open(
        &self, store_name: &str, location: StoreLocation,
    ) -> Result<SystemRepository, StoreError> {
        if store_name.is_empty() {
            return Err(StoreError::unavailable(
                store_name,
                location,
                "store name is empty",
            ));
        }

        let store = match location {
            StoreLocation::CurrentUser => CertStore::open_current_user(store_name),
            StoreLocation::LocalMachine => CertStore::open_local_machine(store_name),
        }
        .map_err(|e| StoreError::unavailable(store_name, location, e))?;

        debug!("Opened system store {}\\{}", location, store_name);
        Ok(SystemRepository {
            store,
            name: format!("{}\\{}", location, store_name),
        })
    }
}

/// An open system store. The store handle is closed on drop.
pub struct SystemRepository {
    store: CertStore,
    name: String,
}

impl fmt::Debug for SystemRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemRepository")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl CertificateRepository for SystemRepository {
    type Entry = SystemEntry;

    fn snapshot(&self) -> Result<Snapshot<SystemEntry>, StoreError> {
        let mut entries = Vec::new();

        for context in self.store.certs() {
            let der = context.to_der().to_vec();
            match CertificateMetadata::from_der(&der) {
                Ok(metadata) => entries.push(SystemEntry {
                    context,
                    metadata,
                    der,
                }),
                Err(e) => warn!("Skipping certificate in {}: {}", self.name, e),
            }
        }

        Ok(Snapshot::new(entries))
    }
}

/// One certificate context. Each entry owns one reference, freed on drop.
pub struct SystemEntry {
    context: CertContext,
    metadata: CertificateMetadata,
    der: Vec<u8>,
}

impl SystemEntry {
    pub fn context(&self) -> &CertContext {
        &self.context
    }
}

impl fmt::Debug for SystemEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemEntry")
            .field("subject", &self.metadata.subject)
            .field("thumbprint", &self.metadata.thumbprint)
            .finish_non_exhaustive()
    }
}

impl CertificateEntry for SystemEntry {
    fn metadata(&self) -> &CertificateMetadata {
        &self.metadata
    }

    fn der(&self) -> &[u8] {
        &self.der
    }
}
