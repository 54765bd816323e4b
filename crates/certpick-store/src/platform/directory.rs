use std::fs;
use std::path::{
    Path,
    PathBuf,
};

use anyhow::{
    bail,
    Context,
    Result,
};
use certpick_commons::utils::config_dir::{
    get_machine_store_root,
    get_user_store_root,
};
use certpick_commons::StoreLocation;
use log::{
    debug,
    warn,
};

use crate::entry::CertificateEntry;
use crate::error::StoreError;
use crate::metadata::CertificateMetadata;
use crate::repository::{
    CertificateRepository,
    RepositoryProvider,
};
use crate::snapshot::Snapshot;

const PEM_EXTENSIONS: &[&str] = &["pem", "crt", "cer"];

/// File-backed stores: `<root>/<store name>/*.{pem,crt,cer,der}`.
#[derive(Debug, Clone)]
pub struct DirectoryStores {
    user_root: Option<PathBuf>,
    machine_root: PathBuf,
}

impl DirectoryStores {
    pub fn new(user_root: impl Into<PathBuf>, machine_root: impl Into<PathBuf>) -> Self {
        Self {
            user_root: Some(user_root.into()),
            machine_root: machine_root.into(),
        }
    }

    /// Roots from `CERTPICK_USER_STORES` / `CERTPICK_MACHINE_STORES`, falling
    /// back to the config directory and the system-wide default.
    pub fn from_env() -> Self {
        let user_root = match get_user_store_root() {
            Ok(root) => Some(root),
            Err(e) => {
                warn!("Current user certificate stores are unavailable: {}", e);
                None
            }
        };

        Self {
            user_root,
            machine_root: get_machine_store_root(),
        }
    }

    pub fn store_path(&self, store_name: &str, location: StoreLocation) -> Result<PathBuf, StoreError> {
        validate_store_name(store_name)
            .map_err(|reason| StoreError::unavailable(store_name, location, reason))?;

        let root = match location {
            StoreLocation::CurrentUser => self.user_root.as_deref().ok_or_else(|| {
                StoreError::unavailable(store_name, location, "no user store root")
            })?,
            StoreLocation::LocalMachine => self.machine_root.as_path(),
        };

        Ok(root.join(store_name))
    }
}

fn validate_store_name(store_name: &str) -> Result<(), &'static str> {
    if store_name.is_empty() {
        return Err("store name is empty");
    }
    if store_name == "." || store_name == ".." {
        return Err("store name is not a directory name");
    }
    if store_name.contains(['/', '\\', '\0']) {
        return Err("store name contains a path separator");
    }
    Ok(())
}

impl RepositoryProvider for DirectoryStores {
    type Repository = DirectoryRepository;

    fn open(
        &self, store_name: &str, location: StoreLocation,
    ) -> Result<DirectoryRepository, StoreError> {
        let path = self.store_path(store_name, location)?;

        if !path.is_dir() {
            return Err(StoreError::unavailable(
                store_name,
                location,
                format!("{} is not a directory", path.display()),
            ));
        }

        debug!("Opened directory store {}", path.display());
        Ok(DirectoryRepository { path })
    }
}

#[derive(Debug)]
pub struct DirectoryRepository {
    path: PathBuf,
}

impl DirectoryRepository {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CertificateRepository for DirectoryRepository {
    type Entry = DirectoryEntry;

    fn snapshot(&self) -> Result<Snapshot<DirectoryEntry>, StoreError> {
        let mut files = Vec::new();
        for dir_entry in fs::read_dir(&self.path).map_err(|e| {
            StoreError::query_failure(format!("reading {}: {}", self.path.display(), e))
        })? {
            let dir_entry = dir_entry.map_err(|e| {
                StoreError::query_failure(format!("reading {}: {}", self.path.display(), e))
            })?;
            let path = dir_entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let mut entries = Vec::new();
        for file in files {
            let certificates = match read_certificates(&file) {
                Ok(certificates) => certificates,
                Err(e) => {
                    warn!("Skipping {}: {:#}", file.display(), e);
                    continue;
                }
            };

            for der in certificates {
                match CertificateMetadata::from_der(&der) {
                    Ok(metadata) => entries.push(DirectoryEntry {
                        metadata,
                        der,
                        source: file.clone(),
                    }),
                    Err(e) => warn!("Skipping certificate in {}: {}", file.display(), e),
                }
            }
        }

        Ok(Snapshot::new(entries))
    }
}

fn read_certificates(path: &Path) -> Result<Vec<Vec<u8>>> {
    let Some(extension) = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
    else {
        debug!("Ignoring {}", path.display());
        return Ok(Vec::new());
    };

    if extension != "der" && !PEM_EXTENSIONS.contains(&extension.as_str()) {
        debug!("Ignoring {}", path.display());
        return Ok(Vec::new());
    }

    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    if extension == "der" {
        return Ok(vec![bytes]);
    }

    let certificates: Vec<Vec<u8>> = match pem::parse_many(&bytes) {
        Ok(blocks) => blocks
            .into_iter()
            .filter(|block| block.tag() == "CERTIFICATE")
            .map(|block| block.into_contents())
            .collect(),
        Err(e) if extension != "cer" => return Err(e).context("Failed to parse PEM"),
        Err(_) => Vec::new(),
    };

    if !certificates.is_empty() {
        return Ok(certificates);
    }

    // .cer files are often raw DER
    if extension == "cer" {
        return Ok(vec![bytes]);
    }

    bail!("no CERTIFICATE block found")
}

/// A certificate loaded from a store directory.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    metadata: CertificateMetadata,
    der: Vec<u8>,
    source: PathBuf,
}

impl DirectoryEntry {
    /// File the certificate was read from.
    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl CertificateEntry for DirectoryEntry {
    fn metadata(&self) -> &CertificateMetadata {
        &self.metadata
    }

    fn der(&self) -> &[u8] {
        &self.der
    }
}
