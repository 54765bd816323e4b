pub mod entry;
pub mod error;
pub mod memory;
pub mod metadata;
pub mod platform;
pub mod repository;
pub mod selector;
pub mod snapshot;

pub use certpick_commons::StoreLocation;
pub use entry::CertificateEntry;
pub use error::StoreError;
pub use memory::{
    HandleCounts,
    MemoryStores,
};
pub use metadata::CertificateMetadata;
#[cfg(target_os = "windows")]
pub use platform::SystemStores;
pub use platform::{
    platform_stores,
    DirectoryStores,
    PlatformStores,
};
pub use repository::{
    CertificateRepository,
    EntryOf,
    RepositoryProvider,
};
pub use selector::{
    select_detached,
    CertificateSelector,
    SelectionQuery,
};
pub use snapshot::{
    MatchSet,
    Snapshot,
};

#[cfg(test)]
mod tests;
