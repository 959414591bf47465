// # ddns-core
//
// Core library for the single-record DDNS updater.
//
// ## Architecture Overview
//
// This library provides the decision logic for keeping one A or AAAA record
// pointed at the host's current address:
// - **AddressSource / AddressDetector**: Traits for determining the current address
// - **DetectionChain**: Ordered public detection fallback chain
// - **Registrar**: Trait for the provider's record API
// - **ConfigStore**: Trait for the persisted "which record is mine" anchor
// - **Reconciler**: setup / update / cleanup / run state machine
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Detectors, provider client and storage live
//    behind traits; implementations are separate crates
// 2. **Sequential**: One strategy, one step at a time, first success wins
// 3. **Explicit Results**: Every boundary returns a `Result`; nothing is
//    swallowed silently
// 4. **Library-First**: The daemon is a thin wrapper around this crate
// 5. **Idempotency**: The config store decides which record is ours

pub mod traits;
pub mod resolver;
pub mod reconciler;
pub mod config;
pub mod error;
pub mod state;

// Re-export core types for convenience
pub use traits::{Address, AddressDetector, AddressSource, ConfigStore, ManagedRecord, Registrar};
pub use resolver::DetectionChain;
pub use reconciler::{CleanupOutcome, Reconciler, UpdateOutcome};
pub use config::{AddressStrategy, AppConfig, Credentials, RecordType, Target};
pub use error::{Error, Result};
pub use state::{FileConfigStore, MemoryConfigStore};
