use chrono::{DateTime, Utc};

/// A stored value plus the bookkeeping needed to decide expiry.
///
/// `expired = now - added_at > ttl`. `ttl == None` means "never expires" (used
/// internally by [`crate::error::WatchpostError`]-free storage backends); the
/// Cache policy layer is what maps the check-facing `cache_for = "none"` case
/// to "never store" rather than "store forever" — see `watchpost-cache`.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub value: T,
    pub added_at: DateTime<Utc>,
    pub ttl: chrono::Duration,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, added_at: DateTime<Utc>, ttl: chrono::Duration) -> Self {
        Self { value, added_at, ttl }
    }

    pub fn expired_at(&self, now: DateTime<Utc>) -> bool {
        now - self.added_at > self.ttl
    }
}
