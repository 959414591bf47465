//! Core traits for the DDNS system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`AddressSource`] / [`AddressDetector`]: Determine the current address
//! - [`Registrar`]: Manage records via the provider API
//! - [`ConfigStore`]: Persist the identity of the managed record

pub mod address_source;
pub mod registrar;
pub mod config_store;

pub use address_source::{Address, AddressDetector, AddressSource};
pub use registrar::Registrar;
pub use config_store::{ConfigStore, ManagedRecord};
