//! Configuration types for the DDNS system
//!
//! The whole process runs from one immutable [`AppConfig`], built once at
//! startup from the environment and passed by reference to the resolver and
//! the reconciler.
//!
//! ## Secret files
//!
//! Every value that may carry a secret can also be supplied through a file
//! named by `<KEY>_FILE`. When that file exists its trimmed content wins over
//! the plain `<KEY>` variable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default Cloudflare API base URL
pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default resolver for the IPv4 who-am-I lookup
pub const DEFAULT_DNS_SERVER: &str = "1.1.1.1";

/// Well-known location of the persisted managed record
pub const DEFAULT_STATE_PATH: &str = "/config/cloudflare.conf";

/// Default period of the internal update loop (5 minutes)
pub const DEFAULT_UPDATE_INTERVAL_SECS: u64 = 300;

/// DNS record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RecordType {
    /// A record (IPv4)
    #[default]
    #[serde(rename = "A")]
    A,
    /// AAAA record (IPv6)
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// Wire name used by the provider API
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            other => Err(Error::config(format!(
                "RRTYPE '{}' is not supported. Supported types: A, AAAA",
                other
            ))),
        }
    }
}

/// API credentials
///
/// The Debug implementation never exposes the token or key.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Scoped API token, sent as a bearer token
    Token(String),
    /// Account email plus global API key
    GlobalKey {
        /// Account email
        email: String,
        /// Global API key
        key: String,
    },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Token(_) => f.debug_tuple("Token").field(&"<REDACTED>").finish(),
            Credentials::GlobalKey { email, .. } => f
                .debug_struct("GlobalKey")
                .field("email", email)
                .field("key", &"<REDACTED>")
                .finish(),
        }
    }
}

/// The record this installation maintains
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Target {
    /// Zone name (e.g. "example.com")
    pub zone: Option<String>,
    /// Optional label in front of the zone (e.g. "home")
    pub subdomain: Option<String>,
    /// Record type to publish
    pub record_type: RecordType,
}

impl Target {
    /// Create a target for the zone apex
    pub fn new(zone: impl Into<String>, record_type: RecordType) -> Self {
        Self {
            zone: Some(zone.into()),
            subdomain: None,
            record_type,
        }
    }

    /// Set the subdomain
    pub fn with_subdomain(mut self, subdomain: impl Into<String>) -> Self {
        self.subdomain = Some(subdomain.into());
        self
    }

    /// Fully-qualified name: `subdomain.zone`, or `zone` alone
    ///
    /// Returns `None` when no zone is configured.
    pub fn fqdn(&self) -> Option<String> {
        let zone = self.zone.as_deref()?;
        match self.subdomain.as_deref() {
            Some(sub) if !sub.is_empty() => Some(format!("{}.{}", sub, zone)),
            _ => Some(zone.to_string()),
        }
    }
}

/// How the current address is determined
///
/// Exactly one strategy is used per invocation; there is no fallback from
/// one strategy to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressStrategy {
    /// Run a shell command and use its trimmed output
    CustomCommand(String),
    /// Read the first address of the record's family from an interface
    Interface(String),
    /// Walk the public detection chain
    PublicDetection,
}

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// API credentials, if any were supplied
    pub credentials: Option<Credentials>,

    /// Record to maintain
    pub target: Target,

    /// Whether the record is proxied by the provider
    pub proxied: bool,

    /// Resolver used by the IPv4 who-am-I lookup
    pub dns_server: String,

    /// Custom lookup command (highest priority strategy)
    pub custom_lookup_cmd: Option<String>,

    /// Local interface to read the address from
    pub interface: Option<String>,

    /// Whether cleanup may delete the managed record
    pub delete_on_stop: bool,

    /// Provider API base URL
    pub api_base: String,

    /// Period of the internal update loop
    pub update_interval_secs: u64,

    /// Location of the persisted managed record
    pub state_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            credentials: None,
            target: Target::default(),
            proxied: false,
            dns_server: DEFAULT_DNS_SERVER.to_string(),
            custom_lookup_cmd: None,
            interface: None,
            delete_on_stop: false,
            api_base: DEFAULT_API_BASE.to_string(),
            update_interval_secs: DEFAULT_UPDATE_INTERVAL_SECS,
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
        }
    }
}

impl AppConfig {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    ///
    /// `lookup` returns the raw value of a variable. Empty values count as
    /// unset. `<KEY>_FILE` paths are resolved through the same lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let secret = |key: &str| {
            get(&format!("{}_FILE", key))
                .and_then(|path| read_secret_file(Path::new(&path)))
                .or_else(|| get(key))
        };

        let credentials = match (secret("API_KEY"), secret("EMAIL")) {
            (Some(key), Some(email)) => Some(Credentials::GlobalKey { email, key }),
            (Some(token), None) => Some(Credentials::Token(token)),
            (None, _) => None,
        };

        let record_type = match get("RRTYPE") {
            Some(raw) => raw.parse()?,
            None => RecordType::A,
        };

        let update_interval_secs = match get("UPDATE_INTERVAL_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    Error::config(format!("UPDATE_INTERVAL_SECS must be a number. Got: {}", raw))
                })?;
                if secs == 0 {
                    return Err(Error::config("UPDATE_INTERVAL_SECS must be > 0"));
                }
                secs
            }
            None => DEFAULT_UPDATE_INTERVAL_SECS,
        };

        Ok(Self {
            credentials,
            target: Target {
                zone: secret("ZONE"),
                subdomain: secret("SUBDOMAIN"),
                record_type,
            },
            proxied: parse_flag(get("PROXIED")),
            dns_server: get("DNS_SERVER").unwrap_or_else(|| DEFAULT_DNS_SERVER.to_string()),
            custom_lookup_cmd: get("CUSTOM_LOOKUP_CMD"),
            interface: get("INTERFACE"),
            delete_on_stop: parse_flag(get("DELETE_ON_STOP")),
            api_base: get("CF_API")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            update_interval_secs,
            state_path: get("STATE_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH)),
        })
    }

    /// Pick the address strategy by priority: command, interface, public
    pub fn address_strategy(&self) -> AddressStrategy {
        if let Some(cmd) = &self.custom_lookup_cmd {
            AddressStrategy::CustomCommand(cmd.clone())
        } else if let Some(iface) = &self.interface {
            AddressStrategy::Interface(iface.clone())
        } else {
            AddressStrategy::PublicDetection
        }
    }

    /// Period of the internal update loop
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }
}

/// Only the literal "true" (any case) enables a flag
fn parse_flag(value: Option<String>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

fn read_secret_file(path: &Path) -> Option<String> {
    if !path.is_file() {
        tracing::debug!("Secret file {} not present, using environment", path.display());
        return None;
    }
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content.trim().to_string()).filter(|v| !v.is_empty()),
        Err(e) => {
            tracing::warn!("Failed to read secret file {}: {}", path.display(), e);
            None
        }
    }
}
