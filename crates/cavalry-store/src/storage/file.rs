//! File-backed storage.
//!
//! One file per slot, `<data_dir>/<slot>.json`.
//!
//! ## Write Path
//! ```text
//! set("cav-cart-v1", json)
//!   1. write  <dir>/.tmpXXXXXX          (unique per write)
//!   2. rename <dir>/.tmpXXXXXX → <dir>/cav-cart-v1.json
//!   3. publish SlotChange
//! ```
//!
//! A crash between 1 and 2 leaves the previous value in place. Concurrent
//! writers never share a temp file, so each rename installs exactly the bytes
//! its writer wrote; a failed rename deletes its temp file. Change
//! notifications reach every clone of this `FileStorage` in the same process;
//! other processes writing the same directory are not observed.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tokio::sync::broadcast;
use tracing::{debug, info};

use cavalry_core::validation::validate_slot_name;

use super::{ChangeFeed, ContextId, DurableStorage, SlotChange};
use crate::error::{StorageError, StorageResult};

/// Slots stored as JSON files in a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    quota_bytes: Option<usize>,
    feed: ChangeFeed,
}

impl FileStorage {
    /// Opens (and creates if needed) a data directory.
    pub fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            StorageError::unavailable(format!("cannot create {}: {}", dir.display(), e))
        })?;

        info!(dir = %dir.display(), "File storage opened");
        Ok(FileStorage {
            dir,
            quota_bytes: None,
            feed: ChangeFeed::new(),
        })
    }

    /// Rejects single values larger than `quota_bytes`.
    pub fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `slot`.
    pub fn slot_path(&self, slot: &str) -> StorageResult<PathBuf> {
        validate_slot_name(slot)?;
        Ok(self.dir.join(format!("{}.json", slot)))
    }
}

impl DurableStorage for FileStorage {
    fn get(&self, slot: &str) -> StorageResult<Option<String>> {
        let path = self.slot_path(slot)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, slot: &str, value: &str, origin: ContextId) -> StorageResult<()> {
        let path = self.slot_path(slot)?;

        if let Some(limit) = self.quota_bytes {
            if value.len() > limit {
                return Err(StorageError::quota_exceeded(slot, value.len(), limit));
            }
        }

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.persist(&path).map_err(|e| e.error)?;

        debug!(slot = %slot, origin = %origin, path = %path.display(), "file slot written");
        self.feed.publish(slot, origin);
        Ok(())
    }

    fn remove(&self, slot: &str, origin: ContextId) -> StorageResult<()> {
        let path = self.slot_path(slot)?;
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.feed.publish(slot, origin);
        Ok(())
    }

    fn watch(&self) -> broadcast::Receiver<SlotChange> {
        self.feed.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_write_read_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        let me = ContextId::new();

        assert_eq!(storage.get("cav-cart-v1").unwrap(), None);

        storage.set("cav-cart-v1", r#"{"items":[]}"#, me).unwrap();
        assert_eq!(
            storage.get("cav-cart-v1").unwrap().as_deref(),
            Some(r#"{"items":[]}"#)
        );
        assert_eq!(entries(dir.path()), vec!["cav-cart-v1.json"]);

        storage.remove("cav-cart-v1", me).unwrap();
        assert_eq!(storage.get("cav-cart-v1").unwrap(), None);
    }

    #[test]
    fn test_rejects_unsafe_slot_names() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();

        assert!(matches!(
            storage.set("../escape-v1", "x", ContextId::new()),
            Err(StorageError::InvalidSlot(_))
        ));
    }

    #[test]
    fn test_quota() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap().with_quota(8);

        assert!(storage.set("s-v1", "tiny", ContextId::new()).is_ok());
        assert!(matches!(
            storage.set("s-v1", "much too large", ContextId::new()),
            Err(StorageError::QuotaExceeded { .. })
        ));
        assert_eq!(storage.get("s-v1").unwrap().as_deref(), Some("tiny"));
    }

    #[test]
    fn test_clones_share_feed() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        let other = storage.clone();
        let mut rx = other.watch();

        storage.set("s-v1", "x", ContextId::new()).unwrap();
        assert_eq!(rx.try_recv().unwrap().slot, "s-v1");
    }

    #[test]
    fn test_concurrent_writers_to_one_slot() {
        const WRITERS: usize = 8;
        const WRITES: usize = 100;

        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        let barrier = Arc::new(Barrier::new(WRITERS));

        let handles: Vec<_> = (0..WRITERS)
            .map(|writer| {
                let storage = storage.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let me = ContextId::new();
                    barrier.wait();
                    (0..WRITES)
                        .filter(|n| {
                            let value = format!(r#"{{"writer":{},"n":{}}}"#, writer, n);
                            storage.set("cav-cart-v1", &value, me).is_err()
                        })
                        .count()
                })
            })
            .collect();

        let failures: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(failures, 0);

        // Whatever won, the file holds one complete value.
        let stored = storage.get("cav-cart-v1").unwrap().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&stored).unwrap();
        assert_eq!(parsed["n"], WRITES - 1);
        assert_eq!(entries(dir.path()), vec!["cav-cart-v1.json"]);
    }

    #[test]
    fn test_failed_rename_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();

        // A non-empty directory where the slot file belongs cannot be replaced.
        let blocker = dir.path().join("s-v1.json");
        fs::create_dir(&blocker).unwrap();
        fs::write(blocker.join("keep"), "x").unwrap();

        assert!(matches!(
            storage.set("s-v1", "value", ContextId::new()),
            Err(StorageError::Io(_))
        ));
        assert_eq!(entries(dir.path()), vec!["s-v1.json"]);
    }
}
