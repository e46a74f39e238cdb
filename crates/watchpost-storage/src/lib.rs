//! A single-tier, byte-addressed key/value store with absolute-expiry
//! semantics. `watchpost-storage` only knows about bytes and timestamps —
//! TTL *policy* (grace reads, memoization) lives one layer up in
//! `watchpost-cache`.

mod chained;
mod disk;
mod in_memory;

pub use chained::ChainedStorage;
pub use disk::DiskStorage;
pub use in_memory::InMemoryStorage;

use chrono::{DateTime, Duration, Utc};

/// A value as stored, with enough bookkeeping for a caller to decide expiry.
/// `get` may return an already-expired entry — the contract here is "what do
/// you have on file", not "is it still good."
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntry {
    pub value: Vec<u8>,
    pub added_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl StoredEntry {
    pub fn new(value: Vec<u8>, added_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self { value, added_at, ttl }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now - self.added_at > self.ttl
    }
}

/// A single-tier key/value store. Implementations must be safe for
/// concurrent reads and writes; transport/I/O errors are the caller's to
/// interpret — the Cache layer above treats any `Err` the same as a miss.
pub trait StorageBackend: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<StoredEntry>>;
    fn store(&self, key: &str, value: Vec<u8>, added_at: DateTime<Utc>, ttl: Duration) -> anyhow::Result<()>;
    fn delete(&self, key: &str) -> anyhow::Result<()>;
}

impl<T: StorageBackend + ?Sized> StorageBackend for std::sync::Arc<T> {
    fn get(&self, key: &str) -> anyhow::Result<Option<StoredEntry>> {
        (**self).get(key)
    }

    fn store(&self, key: &str, value: Vec<u8>, added_at: DateTime<Utc>, ttl: Duration) -> anyhow::Result<()> {
        (**self).store(key, value, added_at, ttl)
    }

    fn delete(&self, key: &str) -> anyhow::Result<()> {
        (**self).delete(key)
    }
}
