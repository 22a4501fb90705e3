use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use super::CacheEntry;

/// Cached certificates are refreshed once a day
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(24 * 60 * 60);

/// Source of the current time
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> SystemTime;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

// A fixed instant is a clock that never moves.
impl Clock for SystemTime {
    fn now(&self) -> SystemTime {
        *self
    }
}

/// Decides whether a cache entry is too old to be reused
#[derive(Debug, Clone)]
pub struct ExpiryPolicy {
    threshold: Duration,
    clock: Arc<dyn Clock>,
}

impl ExpiryPolicy {
    pub fn new(threshold: Duration) -> Self {
        Self::with_clock(threshold, Arc::new(SystemClock))
    }

    pub fn with_clock(threshold: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { threshold, clock }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Age of the entry; `None` if it claims to be from the future
    pub fn age(&self, entry: &CacheEntry) -> Option<Duration> {
        self.clock.now().duration_since(entry.created).ok()
    }

    /// True iff the entry is strictly older than the threshold.
    ///
    /// An entry exactly at the threshold is still fresh, and an entry dated
    /// in the future (clock skew) is never stale.
    pub fn is_stale(&self, entry: &CacheEntry) -> bool {
        self.age(entry).is_some_and(|age| age > self.threshold)
    }
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_EXPIRY)
    }
}
