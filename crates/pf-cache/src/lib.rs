//! pf-cache: sub-simulation result cache.
//!
//! Expensive, configuration-deterministic sub-models are memoized under a
//! SHA-256 key of their canonical configuration plus scenario parameters.
//! Entries live as JSON files in a directory shared across processes and are
//! never evicted automatically.

pub mod error;
pub mod key;
pub mod store;

pub use error::{CacheError, CacheResult};
pub use key::{CacheKey, compute_cache_key};
pub use store::{CacheEntry, CacheOutcome, CacheStore};
