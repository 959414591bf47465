// # Config Store Trait
//
// Defines the interface for the persisted "which record is mine" anchor.
//
// ## Purpose
//
// `setup` writes one `ManagedRecord`; `update` and `cleanup` read it. The
// store is the only source of truth for the record this installation owns:
// no provider query by name happens on update cycles.
//
// ## File Format
//
// ```json
// { "zoneId": "023e105f4ecef8ad9ca31a8372d0c353",
//   "recordId": "372e67954025e0ba6aaa6d586b9e0b59",
//   "fqdn": "home.example.com" }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Identity of the managed DNS record
///
/// The serialized key names are a contract for anything that inspects the
/// state file. Older files written with `CF_ZONE_ID`, `CF_RECORD_ID` and
/// `CF_RECORD_NAME` are still readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedRecord {
    /// Provider zone id
    #[serde(rename = "zoneId", alias = "CF_ZONE_ID")]
    pub zone_id: String,

    /// Provider record id
    #[serde(rename = "recordId", alias = "CF_RECORD_ID")]
    pub record_id: String,

    /// Fully-qualified record name
    #[serde(rename = "fqdn", alias = "CF_RECORD_NAME")]
    pub fqdn: String,
}

impl ManagedRecord {
    /// Create a managed record
    pub fn new(
        zone_id: impl Into<String>,
        record_id: impl Into<String>,
        fqdn: impl Into<String>,
    ) -> Self {
        Self {
            zone_id: zone_id.into(),
            record_id: record_id.into(),
            fqdn: fqdn.into(),
        }
    }
}

/// Trait for config store implementations
///
/// # Concurrency
///
/// No locking is performed. Deployments must not run `setup`, `update` or
/// `cleanup` against the same store at the same time.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the managed record
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))`: a record was persisted
    /// - `Ok(None)`: nothing persisted yet
    /// - `Err(Error)`: the store exists but could not be read or parsed
    async fn load(&self) -> Result<Option<ManagedRecord>, crate::Error>;

    /// Persist the managed record, replacing any previous one
    async fn save(&self, record: &ManagedRecord) -> Result<(), crate::Error>;
}
