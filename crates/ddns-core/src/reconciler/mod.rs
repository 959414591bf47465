//! Reconciliation state machine
//!
//! The [`Reconciler`] keeps one provider record in line with the host's
//! current address:
//!
//! ```text
//!                 setup()                      update() (repeated)
//! UNCONFIGURED ─────────────▶ CONFIGURED ◀──────────────────────┐
//!                                 │  └───────────────────────────┘
//!                                 │ cleanup() + DELETE_ON_STOP
//!                                 ▼
//!                              REMOVED
//! ```
//!
//! ## Severities
//!
//! - `setup` fails fatally: every error it returns is [`Error::Fatal`] and the
//!   process is expected to exit non-zero.
//! - `update` and `cleanup` never fail. They log and report an outcome; the
//!   next scheduled invocation is the retry.
//!
//! ## Update Flow
//!
//! 1. Load the managed record from the config store
//! 2. Read the address the provider currently stores
//! 3. Resolve the current address
//! 4. If they differ, patch the record

use std::future::Future;

use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::traits::{Address, AddressSource, ConfigStore, ManagedRecord, Registrar};

/// Result of one update cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// No managed record persisted; setup has not run
    NotConfigured,

    /// The current address could not be determined
    ResolutionFailed,

    /// Provider already stores the current address; nothing written
    Unchanged {
        address: Address,
    },

    /// Record content was replaced
    Updated {
        previous: Option<Address>,
        current: Address,
    },

    /// The provider rejected or failed the update
    UpdateFailed {
        error: String,
    },
}

/// Result of a cleanup request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// No managed record persisted; nothing to delete
    NotConfigured,

    /// Deletion is disabled by configuration
    Disabled,

    /// Record deleted at the provider
    Deleted,

    /// The provider rejected or failed the delete
    DeleteFailed {
        error: String,
    },
}

/// Setup / update / cleanup orchestration
///
/// All collaborators are injected; the configuration is borrowed for the
/// reconciler's whole lifetime and never re-read.
pub struct Reconciler<'a> {
    config: &'a AppConfig,
    source: Box<dyn AddressSource>,
    registrar: Box<dyn Registrar>,
    store: Box<dyn ConfigStore>,
}

impl<'a> Reconciler<'a> {
    /// Create a reconciler
    pub fn new(
        config: &'a AppConfig,
        source: Box<dyn AddressSource>,
        registrar: Box<dyn Registrar>,
        store: Box<dyn ConfigStore>,
    ) -> Self {
        Self {
            config,
            source,
            registrar,
            store,
        }
    }

    /// Create or adopt the record and persist its identity
    ///
    /// Re-running setup against an existing record of the same name and type
    /// adopts it instead of creating a duplicate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fatal`] when credentials or zone are missing,
    /// credentials are rejected, the zone is unknown, the address cannot be
    /// resolved, the record cannot be created or the store cannot be written.
    pub async fn setup(&self) -> Result<ManagedRecord> {
        let target = &self.config.target;
        let (zone, fqdn) = match (&self.config.credentials, target.zone.as_deref(), target.fqdn())
        {
            (Some(_), Some(zone), Some(fqdn)) => (zone, fqdn),
            _ => return Err(Error::fatal("API_KEY and ZONE are required")),
        };

        match self.registrar.verify_credentials().await {
            Ok(true) => debug!("Credentials accepted by {}", self.registrar.provider_name()),
            Ok(false) => return Err(Error::fatal("Invalid credentials")),
            Err(e) => return Err(Error::fatal(format!("Invalid credentials: {}", e))),
        }

        let zone_id = match self.registrar.find_zone_id(zone).await {
            Ok(Some(zone_id)) => zone_id,
            Ok(None) => return Err(Error::fatal(format!("Zone {} not found", zone))),
            Err(e) => return Err(Error::fatal(format!("Zone {} not found: {}", zone, e))),
        };
        info!("DNS Zone: {} ({})", zone, zone_id);

        let address = self
            .source
            .resolve(target.record_type)
            .await
            .map_err(|e| Error::fatal(format!("Failed to get current IP: {}", e)))?;

        let existing = match self
            .registrar
            .find_record_id(&zone_id, &fqdn, target.record_type)
            .await
        {
            Ok(found) => found,
            Err(e) => {
                warn!("Record lookup for {} failed, treating as absent: {}", fqdn, e);
                None
            }
        };

        let record_id = match existing {
            Some(record_id) => {
                info!("Adopting existing {} record for {}", target.record_type, fqdn);
                record_id
            }
            None => {
                info!("Creating DNS record for {}", fqdn);
                self.registrar
                    .create_record(&zone_id, &fqdn, &address, target.record_type, self.config.proxied)
                    .await
                    .map_err(|e| {
                        Error::fatal(format!("Failed to create DNS record for {}: {}", fqdn, e))
                    })?
            }
        };
        info!("DNS Record: {} ({})", fqdn, record_id);

        let record = ManagedRecord::new(zone_id, record_id, fqdn);
        self.store
            .save(&record)
            .await
            .map_err(|e| Error::fatal(format!("Failed to persist managed record: {}", e)))?;

        Ok(record)
    }

    /// Compare the provider's stored address with the current one and patch
    /// on mismatch
    pub async fn update(&self) -> UpdateOutcome {
        let record = match self.store.load().await {
            Ok(Some(record)) => record,
            Ok(None) => {
                error!("Config file not found, run setup first");
                return UpdateOutcome::NotConfigured;
            }
            Err(e) => {
                error!("Failed to load managed record: {}", e);
                return UpdateOutcome::NotConfigured;
            }
        };

        let stored = match self
            .registrar
            .get_record_content(&record.zone_id, &record.record_id)
            .await
        {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read current content of {}: {}", record.fqdn, e);
                None
            }
        };

        let current = match self.source.resolve(self.config.target.record_type).await {
            Ok(address) => address,
            Err(e) => {
                error!("Failed to get current IP: {}", e);
                return UpdateOutcome::ResolutionFailed;
            }
        };

        if stored.as_ref() == Some(&current) {
            info!("No update needed for {} ({})", record.fqdn, current);
            return UpdateOutcome::Unchanged { address: current };
        }

        info!(
            "Updating DNS record {} from {} to {}",
            record.fqdn,
            stored.as_ref().map_or("<unknown>", |a| a.as_str()),
            current
        );

        match self
            .registrar
            .update_record(
                &record.zone_id,
                &record.record_id,
                &record.fqdn,
                &current,
                self.config.target.record_type,
                self.config.proxied,
            )
            .await
        {
            Ok(()) => {
                info!("DNS record updated successfully");
                UpdateOutcome::Updated {
                    previous: stored,
                    current,
                }
            }
            Err(e) => {
                error!("Failed to update DNS record: {}", e);
                UpdateOutcome::UpdateFailed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Delete the managed record if deletion is enabled
    pub async fn cleanup(&self) -> CleanupOutcome {
        let record = match self.store.load().await {
            Ok(Some(record)) => record,
            Ok(None) => {
                info!("No managed record, nothing to clean up");
                return CleanupOutcome::NotConfigured;
            }
            Err(e) => {
                warn!("Failed to load managed record, skipping cleanup: {}", e);
                return CleanupOutcome::NotConfigured;
            }
        };

        if !self.config.delete_on_stop {
            info!("DELETE_ON_STOP is disabled, keeping DNS record {}", record.fqdn);
            return CleanupOutcome::Disabled;
        }

        info!("Deleting DNS record {} ({})", record.fqdn, record.record_id);
        match self
            .registrar
            .delete_record(&record.zone_id, &record.record_id)
            .await
        {
            Ok(()) => {
                info!("DNS record {} deleted", record.fqdn);
                CleanupOutcome::Deleted
            }
            Err(e) => {
                error!("Failed to delete DNS record {}: {}", record.fqdn, e);
                CleanupOutcome::DeleteFailed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Run setup once, then update every configured interval until
    /// `shutdown` resolves, then clean up
    ///
    /// # Errors
    ///
    /// Only setup errors are returned; failed update cycles are logged and
    /// the loop continues.
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.setup().await?;

        let period = self.config.update_interval();
        info!("Checking for address changes every {}s", period.as_secs());

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = tokio::time::sleep(period) => {
                    let outcome = self.update().await;
                    debug!("Update cycle finished: {:?}", outcome);
                }

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        let outcome = self.cleanup().await;
        debug!("Cleanup finished: {:?}", outcome);
        Ok(())
    }
}
