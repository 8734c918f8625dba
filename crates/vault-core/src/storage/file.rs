//! JSON file storage backend
//!
//! Stores all entries in a single JSON document in the vault data
//! directory. Every write replaces the file atomically through a temp file,
//! so a crash mid-write leaves the previous document intact.
//!
//! Several handles (or processes) may share a directory: every mutation
//! re-reads the document under an exclusive advisory lock on `store.lock`,
//! and reads always come from disk.

use async_trait::async_trait;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

use super::KeyValueStore;
use crate::error::{Result, VaultError};

/// File name of the store document
const STORE_FILE: &str = "store.json";

/// File name of the advisory lock guarding read-modify-write
const LOCK_FILE: &str = "store.lock";

/// Current document version
const STORE_VERSION: u32 = 1;

/// File format for persistent storage
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    entries: HashMap<String, String>,
}

/// File-backed key-value store
pub struct FileStore {
    /// Directory holding the store document
    storage_dir: PathBuf,
    /// Serializes writers within this handle
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (or create) the store in `storage_dir`, validating any existing
    /// document
    pub async fn open(storage_dir: impl Into<PathBuf>) -> Result<Self> {
        let storage_dir = storage_dir.into();

        tokio::fs::create_dir_all(&storage_dir)
            .await
            .map_err(|e| storage_error("create storage directory", e))?;

        let entries = Self::load(&storage_dir.join(STORE_FILE)).await?;
        debug!(
            "File storage opened at {:?} with {} entries",
            storage_dir,
            entries.len()
        );

        Ok(Self {
            storage_dir,
            write_lock: Mutex::new(()),
        })
    }

    async fn load(path: &Path) -> Result<HashMap<String, String>> {
        if !path.exists() {
            return Ok(HashMap::new());
        }

        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| storage_error("read store file", e))?;
        let file: StoreFile = serde_json::from_str(&contents)
            .map_err(|e| VaultError::StorageError(format!("Invalid store file: {}", e)))?;

        if file.version != STORE_VERSION {
            return Err(VaultError::StorageError(format!(
                "Unsupported store file version: {}",
                file.version
            )));
        }

        Ok(file.entries)
    }

    /// Write `entries` to disk, replacing the previous document atomically
    async fn persist(&self, entries: HashMap<String, String>) -> Result<()> {
        let count = entries.len();
        let file = StoreFile {
            version: STORE_VERSION,
            entries,
        };
        let contents = serde_json::to_string_pretty(&file)
            .map_err(|e| VaultError::StorageError(e.to_string()))?;

        let path = self.store_file_path();
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| storage_error("write store file", e))?;
        tokio::fs::rename(&temp_path, &path)
            .await
            .map_err(|e| storage_error("replace store file", e))?;

        debug!("Saved {} entries to storage", count);
        Ok(())
    }

    /// Take the exclusive advisory lock. Released when the file is dropped.
    async fn lock_document(&self) -> Result<File> {
        let path = self.storage_dir.join(LOCK_FILE);

        tokio::task::spawn_blocking(move || -> std::io::Result<File> {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(false)
                .open(&path)?;
            file.lock_exclusive()?;
            Ok(file)
        })
        .await
        .map_err(|e| VaultError::StorageError(format!("Lock task failed: {}", e)))?
        .map_err(|e| storage_error("lock store file", e))
    }

    /// Re-read the document under the lock, apply `mutate`, and write it
    /// back when `mutate` reports a change
    async fn modify<F>(&self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut HashMap<String, String>) -> bool + Send,
    {
        let _guard = self.write_lock.lock().await;
        let lock = self.lock_document().await?;

        let mut entries = Self::load(&self.store_file_path()).await?;
        let result = if mutate(&mut entries) {
            self.persist(entries).await
        } else {
            Ok(())
        };

        drop(lock);
        result
    }

    /// Get the path to the store document
    pub fn store_file_path(&self) -> PathBuf {
        self.storage_dir.join(STORE_FILE)
    }

    /// Get the storage directory path
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = Self::load(&self.store_file_path()).await?;
        Ok(entries.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.modify(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
        .await?;

        debug!("Stored key: {}", key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.modify(|entries| entries.remove(key).is_some()).await?;

        debug!("Deleted key: {}", key);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "File Storage"
    }
}

fn storage_error(action: &str, err: std::io::Error) -> VaultError {
    VaultError::StorageError(format!("Failed to {}: {}", action, err))
}
