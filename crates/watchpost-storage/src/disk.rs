use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{StorageBackend, StoredEntry};

/// Bumped whenever the on-disk envelope shape changes; old directories are
/// simply not read by a newer version, not migrated.
const ENVELOPE_VERSION: &str = "v1";

#[derive(Serialize, Deserialize)]
struct Envelope {
    version: String,
    value_base64: String,
    added_at: DateTime<Utc>,
    ttl_secs: i64,
}

/// Files under a versioned directory, keyed by the hex SHA-256 of the key.
/// Values are written atomically (temp file + rename) so a crash mid-write
/// never leaves a half-written entry visible to a reader.
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn versioned_dir(&self) -> PathBuf {
        self.root.join(ENVELOPE_VERSION)
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        let digest = hex::encode(hasher.finalize());
        self.versioned_dir().join(format!("{digest}.json"))
    }

    fn fsync_parent_dir(path: &Path) {
        if let Some(parent) = path.parent()
            && let Ok(dir) = fs::File::open(parent)
        {
            let _ = dir.sync_all();
        }
    }
}

impl StorageBackend for DiskStorage {
    fn get(&self, key: &str) -> Result<Option<StoredEntry>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
        let envelope: Envelope =
            serde_json::from_slice(&data).with_context(|| format!("corrupt entry at {}", path.display()))?;
        let value = BASE64
            .decode(envelope.value_base64)
            .with_context(|| format!("corrupt base64 payload at {}", path.display()))?;
        Ok(Some(StoredEntry::new(
            value,
            envelope.added_at,
            Duration::seconds(envelope.ttl_secs),
        )))
    }

    fn store(&self, key: &str, value: Vec<u8>, added_at: DateTime<Utc>, ttl: Duration) -> Result<()> {
        let dir = self.versioned_dir();
        fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

        let path = self.path_for(key);
        let tmp = path.with_extension("tmp");
        let envelope = Envelope {
            version: ENVELOPE_VERSION.to_string(),
            value_base64: BASE64.encode(&value),
            added_at,
            ttl_secs: ttl.num_seconds(),
        };
        let data = serde_json::to_vec(&envelope).context("failed to serialize storage envelope")?;

        {
            let mut f = fs::File::create(&tmp).with_context(|| format!("failed to create {}", tmp.display()))?;
            f.write_all(&data)
                .with_context(|| format!("failed to write {}", tmp.display()))?;
            f.sync_all().ok();
        }

        fs::rename(&tmp, &path)
            .with_context(|| format!("failed to rename {} to {}", tmp.display(), path.display()))?;
        Self::fsync_parent_dir(&path);

        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path).with_context(|| format!("failed to delete {}", path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn store_then_get_round_trips_value_and_timestamps() {
        let td = tempdir().unwrap();
        let storage = DiskStorage::new(td.path());
        let added_at = Utc::now();

        storage.store("k", b"hello".to_vec(), added_at, Duration::seconds(300)).unwrap();

        let entry = storage.get("k").unwrap().unwrap();
        assert_eq!(entry.value, b"hello");
        assert_eq!(entry.added_at, added_at);
        assert_eq!(entry.ttl, Duration::seconds(300));
    }

    #[test]
    fn get_missing_key_returns_none() {
        let td = tempdir().unwrap();
        let storage = DiskStorage::new(td.path());
        assert!(storage.get("missing").unwrap().is_none());
    }

    #[test]
    fn delete_removes_file() {
        let td = tempdir().unwrap();
        let storage = DiskStorage::new(td.path());
        storage.store("k", b"v".to_vec(), Utc::now(), Duration::seconds(60)).unwrap();
        storage.delete("k").unwrap();
        assert!(storage.get("k").unwrap().is_none());
    }

    #[test]
    fn delete_of_missing_key_is_a_no_op() {
        let td = tempdir().unwrap();
        let storage = DiskStorage::new(td.path());
        assert!(storage.delete("missing").is_ok());
    }

    #[test]
    fn different_keys_do_not_collide_on_disk() {
        let td = tempdir().unwrap();
        let storage = DiskStorage::new(td.path());
        storage.store("a", b"1".to_vec(), Utc::now(), Duration::seconds(60)).unwrap();
        storage.store("b", b"2".to_vec(), Utc::now(), Duration::seconds(60)).unwrap();

        assert_eq!(storage.get("a").unwrap().unwrap().value, b"1");
        assert_eq!(storage.get("b").unwrap().unwrap().value, b"2");
    }
}
