// # Address Source Traits
//
// Defines the interfaces for determining the host's current address.
//
// ## Two levels
//
// - `AddressSource`: a whole strategy. Given a record type it returns the
//   address to publish or fails. Exactly one source is used per invocation.
// - `AddressDetector`: a single step of the public detection chain. It either
//   produces an address, produces nothing (no match), or fails. The chain
//   treats "nothing" and "failed" alike and moves on.
//
// ## Implementations
//
// - Detection chain: `ddns_core::resolver::DetectionChain`
// - DNS who-am-I detectors: `ddns-ip-dns` crate
// - HTTP echo detectors: `ddns-ip-http` crate
// - Custom command and local interface sources: `ddns-ip-local` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{AddressSource, RecordType};
//
// let source = /* AddressSource implementation */;
// let address = source.resolve(RecordType::A).await?;
// println!("current address: {}", address);
// ```

use async_trait::async_trait;
use std::fmt;

use crate::config::RecordType;

/// A textual IP literal as reported by a source
///
/// No canonicalization or parsing is performed; equality is plain string
/// equality against what the provider stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Wrap a raw address string
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Trim surrounding whitespace and return `None` for empty input
    pub fn from_output(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Borrow the address text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the address text in characters
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    /// Whether the address text is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for Address {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Address {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl From<&str> for Address {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Address {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Trait for whole address strategies
///
/// # Contract
///
/// - Return `Ok(address)` with a non-empty address on success
/// - Return `Err` on any failure; the caller decides whether that is fatal
/// - Never retry internally and never fall back to another strategy
#[async_trait]
pub trait AddressSource: Send + Sync {
    /// Determine the address to publish for the given record type
    async fn resolve(&self, record_type: RecordType) -> Result<Address, crate::Error>;

    /// Source name (for logging)
    fn name(&self) -> &str;
}

/// Trait for a single step of the public detection chain
///
/// # Contract
///
/// - `Ok(Some(address))`: this step produced a usable address
/// - `Ok(None)`: this step ran but produced nothing usable
/// - `Err(Error)`: this step failed
///
/// Detectors must not spawn background work or retry. The chain applies the
/// per-step timeout.
#[async_trait]
pub trait AddressDetector: Send + Sync {
    /// Attempt to detect the current address
    async fn attempt(&self) -> Result<Option<Address>, crate::Error>;

    /// Detector name (for logging), e.g. the URL or resolver queried
    fn name(&self) -> &str;
}
