//! # Certificate Cache
//!
//! On-disk cache for downloaded certificate files. Entries are named from a
//! hash of their source URL and expire a fixed time after they were written.

mod expiry;
mod key;
mod store;

pub use expiry::{Clock, DEFAULT_EXPIRY, ExpiryPolicy, SystemClock};
pub use key::derive_key;
pub use store::{CacheConfig, CacheEntry, CertCache, DEFAULT_CACHE_DIR};
