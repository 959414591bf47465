// # File Config Store
//
// File-based implementation of ConfigStore.
//
// ## Purpose
//
// Persists the identity of the managed record between invocations so that
// `update` and `cleanup` (typically separate processes started by cron or a
// container supervisor) know which record belongs to this installation.
//
// ## Writes
//
// - The containing directory is created on save if missing
// - New content goes to a sibling `.tmp` file, then is renamed into place
// - No versioning and no locking
//
// ## Reads
//
// - Missing file: `Ok(None)`
// - Unreadable or malformed file: `Err`, which callers treat like absence

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::traits::config_store::{ConfigStore, ManagedRecord};

/// JSON file config store
///
/// # Example
///
/// ```rust,no_run
/// use ddns_core::state::FileConfigStore;
/// use ddns_core::traits::{ConfigStore, ManagedRecord};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileConfigStore::new("/config/cloudflare.conf");
///
///     store.save(&ManagedRecord::new("zone", "record", "home.example.com")).await?;
///     let record = store.load().await?;
///     assert_eq!(record.map(|r| r.fqdn), Some("home.example.com".to_string()));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    /// Create a store backed by the given path
    ///
    /// Nothing is touched on disk until the first `load` or `save`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    async fn ensure_parent_dir(&self) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !fs::try_exists(parent).await.unwrap_or(false)
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config_store(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn load(&self) -> Result<Option<ManagedRecord>, Error> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            tracing::debug!("Config file does not exist: {}", self.path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            Error::config_store(format!(
                "Failed to read config file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let record: ManagedRecord = serde_json::from_str(&content).map_err(|e| {
            Error::config_store(format!(
                "Failed to parse config file {}: {}. Re-run setup to recreate it.",
                self.path.display(),
                e
            ))
        })?;

        Ok(Some(record))
    }

    async fn save(&self, record: &ManagedRecord) -> Result<(), Error> {
        self.ensure_parent_dir().await?;

        let json = serde_json::to_string(record)
            .map_err(|e| Error::config_store(format!("Failed to serialize record: {}", e)))?;

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::config_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::config_store(format!(
                    "Failed to write temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::config_store(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::config_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::debug!("Managed record written to {}", self.path.display());
        Ok(())
    }
}
