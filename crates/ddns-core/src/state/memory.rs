// # Memory Config Store
//
// In-memory implementation of ConfigStore.
//
// Nothing survives the process. Useful when the crate is embedded in a
// long-running program that calls `setup` and `update` itself, and in tests.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::config_store::{ConfigStore, ManagedRecord};

/// In-memory config store
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    inner: Arc<RwLock<Option<ManagedRecord>>>,
}

impl MemoryConfigStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a record
    pub fn with_record(record: ManagedRecord) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(record))),
        }
    }

    /// Forget the stored record
    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load(&self) -> Result<Option<ManagedRecord>, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, record: &ManagedRecord) -> Result<(), Error> {
        *self.inner.write().await = Some(record.clone());
        Ok(())
    }
}
