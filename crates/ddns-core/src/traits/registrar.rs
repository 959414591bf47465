// # Registrar Trait
//
// Defines the interface to the DNS provider's record API.
//
// ## Implementations
//
// - Cloudflare API v4: `ddns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{Registrar, RecordType};
//
// let registrar = /* Registrar implementation */;
// let zone_id = registrar.find_zone_id("example.com").await?;
// ```

use async_trait::async_trait;

use crate::config::RecordType;
use crate::traits::address_source::Address;

/// Trait for DNS provider record APIs
///
/// Every operation returns an explicit `Result`. Absence (no zone, no
/// record, no content) is `Ok(None)`; any non-success HTTP status, negative
/// API envelope or transport error is `Err`. The reconciler collapses `Err`
/// into the operation's absent/false outcome and logs it.
///
/// # Forbidden
///
/// - Retry logic or backoff (owned by the reconciler's schedule)
/// - Access to the config store
/// - Deciding whether an update is needed
#[async_trait]
pub trait Registrar: Send + Sync {
    /// Check that the configured credentials are accepted
    ///
    /// `Ok(false)` means the provider answered and rejected them.
    async fn verify_credentials(&self) -> Result<bool, crate::Error>;

    /// Look up a zone id by zone name
    async fn find_zone_id(&self, zone_name: &str) -> Result<Option<String>, crate::Error>;

    /// Look up the id of the first record matching name and type
    async fn find_record_id(
        &self,
        zone_id: &str,
        fqdn: &str,
        record_type: RecordType,
    ) -> Result<Option<String>, crate::Error>;

    /// Create a record and return its id
    async fn create_record(
        &self,
        zone_id: &str,
        fqdn: &str,
        address: &Address,
        record_type: RecordType,
        proxied: bool,
    ) -> Result<String, crate::Error>;

    /// Replace the content of an existing record
    #[allow(clippy::too_many_arguments)]
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        fqdn: &str,
        address: &Address,
        record_type: RecordType,
        proxied: bool,
    ) -> Result<(), crate::Error>;

    /// Delete a record
    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<(), crate::Error>;

    /// Read the address currently stored in a record
    async fn get_record_content(
        &self,
        zone_id: &str,
        record_id: &str,
    ) -> Result<Option<Address>, crate::Error>;

    /// Provider name (for logging)
    fn provider_name(&self) -> &'static str;
}
