//! The draft store.
//!
//! A draft is a compiled request parked under an opaque id with a TTL in
//! minutes. Expiry is checked lazily on read: the first access after the
//! deadline deletes the draft and reports it expired. `sweep` removes every
//! expired draft in one pass for housekeeping.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{StoreError, atomic_write};

/// A stored draft.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DraftRecord {
    /// Opaque draft id.
    pub id: String,
    /// The parked request payload.
    pub payload: serde_json::Value,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Deadline after which the draft is deleted on access.
    pub expires_at: DateTime<Utc>,
}

/// Filesystem-backed draft storage with lazy TTL expiry.
#[derive(Debug)]
pub struct DraftStore {
    root: PathBuf,
}

impl DraftStore {
    /// Open (and create if needed) a draft store at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        Ok(Self { root })
    }

    fn draft_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }

    /// Park a payload for `ttl_minutes`, returning the stored record with
    /// its generated id and expiry deadline.
    pub fn put(
        &self,
        payload: serde_json::Value,
        ttl_minutes: i64,
    ) -> Result<DraftRecord, StoreError> {
        let created_at = Utc::now();
        let record = DraftRecord {
            id: format!("{:016x}", rand::random::<u64>()),
            payload,
            created_at,
            expires_at: created_at + Duration::minutes(ttl_minutes.max(1)),
        };
        self.write(&record)?;
        tracing::debug!(id = %record.id, expires_at = %record.expires_at, "draft stored");
        Ok(record)
    }

    /// Fetch a draft. Expired drafts are deleted on this first access and
    /// reported as [`StoreError::Expired`].
    pub fn get(&self, id: &str) -> Result<DraftRecord, StoreError> {
        crate::validate_key(id)?;
        let path = self.draft_path(id);
        let record = self.read(&path, id)?;
        if record.expires_at <= Utc::now() {
            let _ = fs::remove_file(&path);
            tracing::debug!(id, "draft expired on access");
            return Err(StoreError::Expired(id.to_owned()));
        }
        Ok(record)
    }

    /// Delete a draft regardless of expiry.
    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        crate::validate_key(id)?;
        let path = self.draft_path(id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(id.to_owned()))
            }
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    /// Remove every expired draft, returning how many were deleted.
    pub fn sweep(&self) -> Result<usize, StoreError> {
        let now = Utc::now();
        let mut removed = 0;
        let entries = fs::read_dir(&self.root).map_err(|e| StoreError::io(&self.root, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.root, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Ok(record) = self.read(&path, "") else {
                continue; // Corrupt drafts are left for manual inspection.
            };
            if record.expires_at <= now {
                let _ = fs::remove_file(&path);
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::debug!(removed, "draft sweep");
        }
        Ok(removed)
    }

    fn write(&self, record: &DraftRecord) -> Result<(), StoreError> {
        let path = self.draft_path(&record.id);
        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| StoreError::corrupt(&path, e))?;
        atomic_write(&path, &json)
    }

    fn read(&self, path: &Path, id: &str) -> Result<DraftRecord, StoreError> {
        let content = match fs::read(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.to_owned()));
            }
            Err(e) => return Err(StoreError::io(path, e)),
        };
        serde_json::from_slice(&content).map_err(|e| StoreError::corrupt(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, DraftStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DraftStore::open(dir.path().join("drafts")).unwrap();
        (dir, store)
    }

    #[test]
    fn put_returns_id_and_future_expiry() {
        let (_dir, store) = store();
        let record = store
            .put(serde_json::json!({"zpl": "^XA^XZ"}), 30)
            .unwrap();
        assert_eq!(record.id.len(), 16);
        assert!(record.expires_at > Utc::now());
        assert_eq!(store.get(&record.id).unwrap(), record);
    }

    #[test]
    fn get_missing_is_not_found() {
        let (_dir, store) = store();
        assert!(matches!(
            store.get("0000000000000000"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn expired_draft_is_deleted_on_first_access() {
        let (_dir, store) = store();
        let mut record = store.put(serde_json::json!({}), 30).unwrap();
        // Rewind the deadline on disk to simulate elapsed time.
        record.expires_at = Utc::now() - Duration::minutes(1);
        store.write(&record).unwrap();

        assert!(matches!(
            store.get(&record.id),
            Err(StoreError::Expired(_))
        ));
        // The file is gone: a second access reports NotFound.
        assert!(matches!(
            store.get(&record.id),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn sweep_removes_only_expired() {
        let (_dir, store) = store();
        let keep = store.put(serde_json::json!({"k": 1}), 30).unwrap();
        let mut gone = store.put(serde_json::json!({"k": 2}), 30).unwrap();
        gone.expires_at = Utc::now() - Duration::minutes(5);
        store.write(&gone).unwrap();

        assert_eq!(store.sweep().unwrap(), 1);
        assert!(store.get(&keep.id).is_ok());
        assert!(matches!(store.get(&gone.id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn delete_is_unconditional() {
        let (_dir, store) = store();
        let record = store.put(serde_json::json!({}), 30).unwrap();
        store.delete(&record.id).unwrap();
        assert!(matches!(
            store.get(&record.id),
            Err(StoreError::NotFound(_))
        ));
    }
}
