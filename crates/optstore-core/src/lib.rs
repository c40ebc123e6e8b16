//! optstore core - tenant-scoped key/value options
//!
//! This crate provides:
//! - The option row model and tenant ids
//! - Caller identity and tenant resolution
//! - The `PersistenceEngine` seam and an in-memory engine
//! - `OptionStore`, the get / set / exists / remove façade
//! - The error facility (`ExError`) and the logging facility

pub mod engine;
pub mod errors;
pub mod filter;
pub mod identity;
pub mod logging_facility;
pub mod model;
pub mod option_store;

#[doc(hidden)]
pub use optstore_core_types;

// Re-export commonly used types
pub use engine::{EngineResult, MemoryEngine, PersistenceEngine};
pub use errors::{ExError, ExErrorKind, OptionStoreError, Result};
pub use filter::{Filter, SetValues};
pub use identity::{GuestProvider, Identity, IdentityProvider};
pub use model::{OptionRow, OptionValue, TenantId};
pub use option_store::OptionStore;
