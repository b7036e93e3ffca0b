// SPDX-License-Identifier: MIT

//! Single-slot persistent key-value storage
//!
//! The stored key lives in exactly one slot under a fixed name, mirroring a browser
//! profile's local storage entry. The slot holds an opaque string; (de)serialization
//! of the access key is the controller's concern. Reads and writes carry no
//! transactional guarantee: concurrent writers race last-write-wins, which is an
//! accepted limitation.

use crate::{Error, Result, STORAGE_SLOT};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Capability trait for the single storage slot
pub trait KeyStore: Send + Sync {
    /// Read the slot contents; `None` if the slot is empty
    fn read(&self) -> Result<Option<String>>;

    /// Overwrite the slot unconditionally
    fn write(&self, value: &str) -> Result<()>;

    /// Delete the slot; succeeds if already empty
    fn clear(&self) -> Result<()>;
}

/// In-memory slot, used by tests and demos
#[derive(Clone, Default)]
pub struct MemoryStore {
    slot: Arc<RwLock<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemoryStore {
    fn read(&self) -> Result<Option<String>> {
        Ok(self.slot.read().clone())
    }

    fn write(&self, value: &str) -> Result<()> {
        *self.slot.write() = Some(value.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot.write() = None;
        Ok(())
    }
}

/// File-backed slot: one JSON file at a fixed path per profile
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Slot file in the platform data directory (`<data_dir>/keygate/secure_key.json`)
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::data_dir()
            .ok_or_else(|| Error::Storage("No platform data directory".to_string()))?;
        Ok(base.join("keygate").join(format!("{}.json", STORAGE_SLOT)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyStore for FileStore {
    fn read(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(format!(
                "Failed to read slot {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn write(&self, value: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, value)?;
        debug!("Wrote slot {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(format!(
                "Failed to clear slot {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}
