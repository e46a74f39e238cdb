use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use crate::{StorageBackend, StoredEntry};

/// A mutex-guarded in-memory map. No size cap is enforced by the contract;
/// callers that hold many large values for a long TTL should front this with
/// a bounded cache policy rather than expect eviction here.
#[derive(Default)]
pub struct InMemoryStorage {
    entries: Mutex<HashMap<String, StoredEntry>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("in-memory storage mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StorageBackend for InMemoryStorage {
    fn get(&self, key: &str) -> anyhow::Result<Option<StoredEntry>> {
        let entries = self.entries.lock().expect("in-memory storage mutex poisoned");
        Ok(entries.get(key).cloned())
    }

    fn store(&self, key: &str, value: Vec<u8>, added_at: DateTime<Utc>, ttl: Duration) -> anyhow::Result<()> {
        let mut entries = self.entries.lock().expect("in-memory storage mutex poisoned");
        entries.insert(key.to_string(), StoredEntry::new(value, added_at, ttl));
        Ok(())
    }

    fn delete(&self, key: &str) -> anyhow::Result<()> {
        let mut entries = self.entries.lock().expect("in-memory storage mutex poisoned");
        entries.remove(key);
        Ok(())
    }
}
