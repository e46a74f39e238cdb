//! A thin policy layer over [`watchpost_storage::StorageBackend`]: TTL
//! stamping, the "grace read" (return-an-expired-entry-exactly-once)
//! semantics, and a memoization helper built on top of both.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use watchpost_storage::StorageBackend;
use watchpost_types::CacheEntry;

/// Grace-read-aware cache over a single [`StorageBackend`].
///
/// Concurrent grace reads of the same key are serialized through
/// `in_grace_read`: a caller that observes an expired entry first inserts
/// its key into the set (an atomic claim — [`HashSet::insert`] only
/// succeeds for the first caller), deletes the entry from storage, and
/// returns it. A caller that loses the race sees the key already claimed
/// and returns a miss immediately, satisfying "exactly one caller observes
/// the expired value." This one shared set is the cache's only lock — no
/// hash-sharded mutex scheme, since nothing here needs it.
pub struct Cache {
    storage: Arc<dyn StorageBackend>,
    in_grace_read: Mutex<HashSet<String>>,
}

impl Cache {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            storage,
            in_grace_read: Mutex::new(HashSet::new()),
        }
    }

    /// Read `key`. When `allow_expired` is `false` (the default read mode),
    /// an expired entry is returned exactly once and then deleted ("grace
    /// read"); when `true` (used for the engine's SKIP path), an expired
    /// entry is returned every time without being deleted or consuming the
    /// grace allowance.
    pub fn get(&self, key: &str, allow_expired: bool) -> anyhow::Result<Option<CacheEntry<Vec<u8>>>> {
        let Some(stored) = self.storage.get(key)? else {
            return Ok(None);
        };

        let now = Utc::now();
        if !stored.is_expired_at(now) {
            return Ok(Some(CacheEntry::new(stored.value, stored.added_at, stored.ttl)));
        }

        if allow_expired {
            return Ok(Some(CacheEntry::new(stored.value, stored.added_at, stored.ttl)));
        }

        let claimed = {
            let mut in_progress = self.in_grace_read.lock().expect("grace-read set mutex poisoned");
            in_progress.insert(key.to_string())
        };
        if !claimed {
            return Ok(None);
        }

        let _ = self.storage.delete(key);
        {
            let mut in_progress = self.in_grace_read.lock().expect("grace-read set mutex poisoned");
            in_progress.remove(key);
        }

        Ok(Some(CacheEntry::new(stored.value, stored.added_at, stored.ttl)))
    }

    /// Store `value` under `key`, stamping `added_at = now`.
    pub fn store(&self, key: &str, value: Vec<u8>, ttl: Duration) -> anyhow::Result<()> {
        self.storage.store(key, value, Utc::now(), ttl)
    }

    /// On a cache miss (per `get`'s grace-read rules), compute `f`, store
    /// its JSON-serialized result under `key` with the given `ttl`, and
    /// return it. On a hit, `f` is never called.
    pub fn memoize<T, F>(&self, key: &str, ttl: Duration, return_expired: bool, f: F) -> anyhow::Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> anyhow::Result<T>,
    {
        if let Some(entry) = self.get(key, return_expired)? {
            return Ok(serde_json::from_slice(&entry.value)?);
        }

        let value = f()?;
        let bytes = serde_json::to_vec(&value)?;
        self.store(key, bytes, ttl)?;
        Ok(value)
    }
}
