use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{
    AtomicUsize,
    Ordering,
};
use std::sync::{
    Arc,
    PoisonError,
    RwLock,
};

use certpick_commons::StoreLocation;
use log::debug;

use crate::entry::CertificateEntry;
use crate::error::StoreError;
use crate::metadata::CertificateMetadata;
use crate::repository::{
    CertificateRepository,
    RepositoryProvider,
};
use crate::snapshot::Snapshot;

type StoreKey = (StoreLocation, String);

/// Outstanding handles handed out by a [`MemoryStores`] instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandleCounts {
    pub open_repositories: usize,
    pub total_opened: usize,
    pub live_entries: usize,
    pub released_entries: usize,
}

#[derive(Debug, Default)]
struct Counters {
    open_repositories: AtomicUsize,
    total_opened: AtomicUsize,
    live_entries: AtomicUsize,
    released_entries: AtomicUsize,
}

#[derive(Debug)]
struct MemoryRecord {
    metadata: CertificateMetadata,
    der: Vec<u8>,
    trusted: bool,
}

#[derive(Debug, Default)]
struct StoreState {
    records: Vec<Arc<MemoryRecord>>,
    fail_after: Option<usize>,
}

/// In-process certificate stores with handle accounting.
///
/// Every repository and entry handle is counted while alive, so callers can
/// check that nothing outlives a selection except the entry it returned.
#[derive(Clone, Default)]
pub struct MemoryStores {
    stores: Arc<RwLock<HashMap<StoreKey, StoreState>>>,
    counters: Arc<Counters>,
}

impl MemoryStores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_store(&self, store_name: &str, location: StoreLocation) -> Result<(), StoreError> {
        let mut stores = self.stores.write().map_err(poisoned)?;
        stores
            .entry((location, store_name.to_string()))
            .or_default();
        Ok(())
    }

    /// Adds a DER certificate, creating the store when needed.
    pub fn add_der(
        &self, store_name: &str, location: StoreLocation, der: &[u8], trusted: bool,
    ) -> Result<CertificateMetadata, StoreError> {
        let metadata = CertificateMetadata::from_der(der)?;

        let mut stores = self.stores.write().map_err(poisoned)?;
        stores
            .entry((location, store_name.to_string()))
            .or_default()
            .records
            .push(Arc::new(MemoryRecord {
                metadata: metadata.clone(),
                der: der.to_vec(),
                trusted,
            }));

        debug!(
            "Added {} to in-memory store {}\\{}",
            metadata.subject, location, store_name
        );
        Ok(metadata)
    }

    /// Makes snapshots of the store fail once `entries` handles have been
    /// acquired. With `entries` at or above the store size, the failure is
    /// raised after the last entry.
    pub fn fail_snapshot_after(
        &self, store_name: &str, location: StoreLocation, entries: usize,
    ) -> Result<(), StoreError> {
        let mut stores = self.stores.write().map_err(poisoned)?;
        stores
            .entry((location, store_name.to_string()))
            .or_default()
            .fail_after = Some(entries);
        Ok(())
    }

    pub fn handle_counts(&self) -> HandleCounts {
        HandleCounts {
            open_repositories: self.counters.open_repositories.load(Ordering::SeqCst),
            total_opened: self.counters.total_opened.load(Ordering::SeqCst),
            live_entries: self.counters.live_entries.load(Ordering::SeqCst),
            released_entries: self.counters.released_entries.load(Ordering::SeqCst),
        }
    }
}

impl fmt::Debug for MemoryStores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStores")
            .field("counts", &self.handle_counts())
            .finish()
    }
}

impl RepositoryProvider for MemoryStores {
    type Repository = MemoryRepository;

    fn open(
        &self, store_name: &str, location: StoreLocation,
    ) -> Result<MemoryRepository, StoreError> {
        let key = (location, store_name.to_string());

        let exists = self.stores.read().map_err(poisoned)?.contains_key(&key);
        if !exists {
            return Err(StoreError::unavailable(
                store_name,
                location,
                "store does not exist",
            ));
        }

        self.counters
            .open_repositories
            .fetch_add(1, Ordering::SeqCst);
        self.counters.total_opened.fetch_add(1, Ordering::SeqCst);

        Ok(MemoryRepository {
            stores: Arc::clone(&self.stores),
            counters: Arc::clone(&self.counters),
            key,
        })
    }
}

pub struct MemoryRepository {
    stores: Arc<RwLock<HashMap<StoreKey, StoreState>>>,
    counters: Arc<Counters>,
    key: StoreKey,
}

impl fmt::Debug for MemoryRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRepository")
            .field("location", &self.key.0)
            .field("store", &self.key.1)
            .finish_non_exhaustive()
    }
}

impl CertificateRepository for MemoryRepository {
    type Entry = MemoryEntry;

    fn snapshot(&self) -> Result<Snapshot<MemoryEntry>, StoreError> {
        let stores = self.stores.read().map_err(poisoned)?;
        let state = stores.get(&self.key).ok_or_else(|| {
            StoreError::query_failure(format!("store {}\\{} was removed", self.key.0, self.key.1))
        })?;

        let mut entries = Vec::with_capacity(state.records.len());
        for record in &state.records {
            if state.fail_after == Some(entries.len()) {
                break;
            }
            entries.push(MemoryEntry::acquire(
                Arc::clone(record),
                Arc::clone(&self.counters),
            ));
        }

        if let Some(limit) = state.fail_after {
            return Err(StoreError::query_failure(format!(
                "enumeration of {}\\{} failed after {} of {} entries",
                self.key.0,
                self.key.1,
                limit.min(state.records.len()),
                state.records.len()
            )));
        }

        Ok(Snapshot::new(entries))
    }
}

impl Drop for MemoryRepository {
    fn drop(&mut self) {
        self.counters
            .open_repositories
            .fetch_sub(1, Ordering::SeqCst);
    }
}

/// A counted handle to an in-memory record. Cloning duplicates the handle.
pub struct MemoryEntry {
    record: Arc<MemoryRecord>,
    counters: Arc<Counters>,
}

impl MemoryEntry {
    fn acquire(record: Arc<MemoryRecord>, counters: Arc<Counters>) -> Self {
        counters.live_entries.fetch_add(1, Ordering::SeqCst);
        Self { record, counters }
    }
}

impl Clone for MemoryEntry {
    fn clone(&self) -> Self {
        Self::acquire(Arc::clone(&self.record), Arc::clone(&self.counters))
    }
}

impl Drop for MemoryEntry {
    fn drop(&mut self) {
        self.counters.live_entries.fetch_sub(1, Ordering::SeqCst);
        self.counters
            .released_entries
            .fetch_add(1, Ordering::SeqCst);
    }
}

impl fmt::Debug for MemoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryEntry")
            .field("subject", &self.record.metadata.subject)
            .field("thumbprint", &self.record.metadata.thumbprint)
            .field("trusted", &self.record.trusted)
            .finish()
    }
}

impl CertificateEntry for MemoryEntry {
    fn metadata(&self) -> &CertificateMetadata {
        &self.record.metadata
    }

    fn der(&self) -> &[u8] {
        &self.record.der
    }

    fn is_trusted(&self) -> bool {
        self.record.trusted
    }
}

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::query_failure("in-memory store lock poisoned")
}
