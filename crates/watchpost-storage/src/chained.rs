use chrono::{DateTime, Duration, Utc};

use crate::{StorageBackend, StoredEntry};

/// An ordered sequence of backends, fastest/nearest first. `get` probes in
/// order and back-propagates a hit from a later store to every earlier one
/// — best-effort: a failure to propagate never changes the value returned
/// to the caller. `store`/`delete` apply to every layer.
pub struct ChainedStorage {
    layers: Vec<Box<dyn StorageBackend>>,
}

impl ChainedStorage {
    pub fn new(layers: Vec<Box<dyn StorageBackend>>) -> Self {
        Self { layers }
    }
}

impl StorageBackend for ChainedStorage {
    fn get(&self, key: &str) -> anyhow::Result<Option<StoredEntry>> {
        for (i, layer) in self.layers.iter().enumerate() {
            match layer.get(key) {
                Ok(Some(entry)) => {
                    for earlier in &self.layers[..i] {
                        let _ = earlier.store(key, entry.value.clone(), entry.added_at, entry.ttl);
                    }
                    return Ok(Some(entry));
                }
                Ok(None) => continue,
                Err(_) => continue,
            }
        }
        Ok(None)
    }

    fn store(&self, key: &str, value: Vec<u8>, added_at: DateTime<Utc>, ttl: Duration) -> anyhow::Result<()> {
        let mut last_err = None;
        for layer in &self.layers {
            if let Err(e) = layer.store(key, value.clone(), added_at, ttl) {
                last_err = Some(e);
            }
        }
        match last_err {
            Some(e) if self.layers.is_empty() => Err(e),
            _ => Ok(()),
        }
    }

    fn delete(&self, key: &str) -> anyhow::Result<()> {
        for layer in &self.layers {
            let _ = layer.delete(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::InMemoryStorage;

    #[test]
    fn get_probes_in_order_and_returns_first_hit() {
        let near = Arc::new(InMemoryStorage::new());
        let far = Arc::new(InMemoryStorage::new());
        far.store("k", b"far-value".to_vec(), Utc::now(), Duration::seconds(60)).unwrap();

        let chained = ChainedStorage::new(vec![Box::new(near), Box::new(far)]);
        let entry = chained.get("k").unwrap().unwrap();
        assert_eq!(entry.value, b"far-value");
    }

    #[test]
    fn get_hit_in_later_layer_backfills_earlier_layers() {
        let near = Arc::new(InMemoryStorage::new());
        let far = Arc::new(InMemoryStorage::new());
        far.store("k", b"far-value".to_vec(), Utc::now(), Duration::seconds(60)).unwrap();

        let near_handle = near.clone();
        let chained = ChainedStorage::new(vec![Box::new(near), Box::new(far)]);
        chained.get("k").unwrap();

        let backfilled = near_handle.get("k").unwrap().unwrap();
        assert_eq!(backfilled.value, b"far-value");
    }

    #[test]
    fn store_writes_to_every_layer() {
        let a = Arc::new(InMemoryStorage::new());
        let b = Arc::new(InMemoryStorage::new());
        let a_handle = a.clone();
        let b_handle = b.clone();

        let chained = ChainedStorage::new(vec![Box::new(a), Box::new(b)]);
        chained.store("k", b"v".to_vec(), Utc::now(), Duration::seconds(60)).unwrap();

        assert_eq!(a_handle.get("k").unwrap().unwrap().value, b"v");
        assert_eq!(b_handle.get("k").unwrap().unwrap().value, b"v");
    }

    #[test]
    fn delete_removes_from_every_layer() {
        let a = Arc::new(InMemoryStorage::new());
        let b = Arc::new(InMemoryStorage::new());
        let chained = ChainedStorage::new(vec![Box::new(a), Box::new(b)]);
        chained.store("k", b"v".to_vec(), Utc::now(), Duration::seconds(60)).unwrap();
        chained.delete("k").unwrap();
        assert!(chained.get("k").unwrap().is_none());
    }

    #[test]
    fn get_on_empty_chain_is_a_miss() {
        let chained = ChainedStorage::new(vec![]);
        assert!(chained.get("k").unwrap().is_none());
    }
}
