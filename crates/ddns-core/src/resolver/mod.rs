//! Public detection chain
//!
//! The chain is an ordered list of [`AddressDetector`]s per record type. Steps
//! run strictly one after another; the first step that yields a non-empty
//! address wins and no later step is attempted.
//!
//! ## Step semantics
//!
//! ```text
//! for each detector, in order:
//!     timeout(step_timeout, detector.attempt())
//!         Ok(Some(addr)) if !addr.is_empty()  -> return addr
//!         Ok(None) | Ok(Some(""))              -> log, next step
//!         Err(e)                               -> log, next step
//!         timed out                            -> log, next step
//! all exhausted -> Error::Detection
//! ```
//!
//! Step errors never escape the chain; only the chain as a whole can fail.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::config::RecordType;
use crate::error::{Error, Result};
use crate::traits::{Address, AddressDetector, AddressSource};

/// Default time budget for one detection step
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Ordered fallback chain of address detectors
pub struct DetectionChain {
    ipv4: Vec<Box<dyn AddressDetector>>,
    ipv6: Vec<Box<dyn AddressDetector>>,
    step_timeout: Duration,
}

impl DetectionChain {
    /// Create a chain from the ordered IPv4 and IPv6 detector lists
    pub fn new(ipv4: Vec<Box<dyn AddressDetector>>, ipv6: Vec<Box<dyn AddressDetector>>) -> Self {
        Self {
            ipv4,
            ipv6,
            step_timeout: DEFAULT_STEP_TIMEOUT,
        }
    }

    /// Override the per-step time budget
    pub fn with_step_timeout(mut self, step_timeout: Duration) -> Self {
        self.step_timeout = step_timeout;
        self
    }

    /// Detector names for a record type, in the order they are tried
    pub fn step_names(&self, record_type: RecordType) -> Vec<&str> {
        self.detectors(record_type).iter().map(|d| d.name()).collect()
    }

    fn detectors(&self, record_type: RecordType) -> &[Box<dyn AddressDetector>] {
        match record_type {
            RecordType::A => &self.ipv4,
            RecordType::Aaaa => &self.ipv6,
        }
    }

    /// Run one step, folding every failure mode into `None`
    async fn run_step(&self, detector: &dyn AddressDetector) -> Option<Address> {
        info!("Trying {}", detector.name());

        match tokio::time::timeout(self.step_timeout, detector.attempt()).await {
            Ok(Ok(Some(address))) if !address.is_empty() => Some(address),
            Ok(Ok(_)) => {
                debug!("{} returned no address", detector.name());
                None
            }
            Ok(Err(e)) => {
                warn!("{} failed: {}", detector.name(), e);
                None
            }
            Err(_) => {
                warn!(
                    "{} failed: {}",
                    detector.name(),
                    Error::timeout(detector.name(), self.step_timeout.as_secs())
                );
                None
            }
        }
    }
}

#[async_trait]
impl AddressSource for DetectionChain {
    async fn resolve(&self, record_type: RecordType) -> Result<Address> {
        let family = match record_type {
            RecordType::A => "IPv4",
            RecordType::Aaaa => "IPv6",
        };

        for detector in self.detectors(record_type) {
            if let Some(address) = self.run_step(detector.as_ref()).await {
                info!("Got {} from {}: {}", family, detector.name(), address);
                return Ok(address);
            }
        }

        error!("All {} detection methods failed", family);
        Err(Error::detection(format!("All {} detection methods failed", family)))
    }

    fn name(&self) -> &str {
        "public detection chain"
    }
}
