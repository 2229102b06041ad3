use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;

use super::cache::RecordCache;
use super::value::{get_path, set_path};
use super::RecordStoreError;

const RECORD_EXTENSION: &str = "json";

/// File-backed store of named JSON records, grouped into collections.
///
/// A collection is a relative directory under the store root (`config`,
/// `content/pages`); each record is one `<name>.json` file inside it.
pub struct RecordStore {
    root: PathBuf,
    cache: RecordCache,
    write_locks: Arc<Mutex<LockMap>>,
}

type LockMap = HashMap<String, Arc<tokio::sync::Mutex<()>>>;

/// Exclusive hold on one record. Dropping the last holder forgets the lock.
struct RecordLock {
    key: String,
    locks: Arc<Mutex<LockMap>>,
    guard: Option<tokio::sync::OwnedMutexGuard<()>>,
}

impl Drop for RecordLock {
    fn drop(&mut self) {
        let mut locks = self.locks.lock();
        // Release first so a waiter holding a clone keeps the entry alive
        self.guard.take();
        if locks
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.key);
        }
    }
}

impl RecordStore {
    pub fn new<P: AsRef<Path>>(root: P, cache: RecordCache) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            cache,
            write_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    // ========================================================================
    // Record operations
    // ========================================================================

    /// Read a record, serving it from the cache when possible.
    ///
    /// A missing or unparsable file yields an empty object; callers apply their
    /// own defaults. Such results are not cached.
    ///
    /// A miss loads the file under the record's lock, so a concurrent write can
    /// never be followed by an older value landing in the cache.
    pub async fn read_record(
        &self,
        collection: &str,
        name: &str,
    ) -> Result<Arc<Value>, RecordStoreError> {
        let path = self.record_path(collection, name)?;
        let key = cache_key(collection, name);

        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let _lock = self.lock_record(&key).await;
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    tracing::warn!(record = %key, error = %e, "Failed to read record file");
                }
                return Ok(empty_record());
            }
        };

        match serde_json::from_slice::<Value>(&raw) {
            Ok(value) => {
                let value = Arc::new(value);
                self.cache.insert(key, Arc::clone(&value));
                Ok(value)
            }
            Err(e) => {
                tracing::warn!(record = %key, error = %e, "Failed to parse record file");
                Ok(empty_record())
            }
        }
    }

    /// Replace a record on disk and refresh its cache entry.
    ///
    /// The file is written to a temporary sibling and renamed into place, so a
    /// failed write leaves both the previous file and the cache untouched.
    pub async fn write_record(
        &self,
        collection: &str,
        name: &str,
        value: Value,
    ) -> Result<(), RecordStoreError> {
        let path = self.record_path(collection, name)?;
        let key = cache_key(collection, name);
        let serialized = serde_json::to_vec_pretty(&value)?;

        let _lock = self.lock_record(&key).await;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp_path = path.with_extension(format!(
            "{RECORD_EXTENSION}.{}.tmp",
            uuid::Uuid::new_v4().simple()
        ));
        if let Err(e) = tokio::fs::write(&tmp_path, &serialized).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        self.cache.insert(key.clone(), Arc::new(value));
        tracing::debug!(record = %key, bytes = serialized.len(), "Wrote record");
        Ok(())
    }

    /// Update a single nested field of a record, leaving the rest as stored.
    pub async fn update_record_field(
        &self,
        collection: &str,
        name: &str,
        path: &[&str],
        value: Value,
    ) -> Result<Value, RecordStoreError> {
        let current = self.read_record(collection, name).await?;
        let updated = set_path(&current, path, value)?;
        self.write_record(collection, name, updated.clone()).await?;
        Ok(updated)
    }

    /// Read a single nested field of a record.
    pub async fn read_record_field(
        &self,
        collection: &str,
        name: &str,
        path: &[&str],
    ) -> Result<Option<Value>, RecordStoreError> {
        let record = self.read_record(collection, name).await?;
        Ok(get_path(&record, path).cloned())
    }

    /// Record names in a collection, sorted. A missing collection is empty.
    pub async fn list_record_names(&self, collection: &str) -> Result<Vec<String>, RecordStoreError> {
        let dir = self.collection_path(collection)?;

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION)
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if is_valid_segment(stem) {
                    names.push(stem.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    /// Remove a record and its cache entry. Returns false if it did not exist.
    pub async fn delete_record(&self, collection: &str, name: &str) -> Result<bool, RecordStoreError> {
        let path = self.record_path(collection, name)?;
        let key = cache_key(collection, name);

        let _lock = self.lock_record(&key).await;

        self.cache.remove(&key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(record = %key, "Deleted record");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Modification time of the record file, if it exists.
    pub async fn record_modified(
        &self,
        collection: &str,
        name: &str,
    ) -> Result<Option<DateTime<Utc>>, RecordStoreError> {
        let path = self.record_path(collection, name)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(Some(DateTime::<Utc>::from(meta.modified()?))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::debug!("Cleared record cache");
    }

    /// Delete every record file under the root and clear the cache.
    /// Returns the number of records removed.
    pub async fn purge(&self) -> Result<u64, RecordStoreError> {
        let root = self.root.clone();
        let removed = tokio::task::spawn_blocking(move || {
            let records: Vec<PathBuf> = walkdir::WalkDir::new(&root)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| p.extension().and_then(|ext| ext.to_str()) == Some(RECORD_EXTENSION))
                .collect();
            for path in &records {
                std::fs::remove_file(path)?;
            }
            Ok::<_, std::io::Error>(records.len() as u64)
        })
        .await
        .map_err(std::io::Error::other)??;

        self.cache.clear();
        tracing::debug!(records = removed, "Purged record store");
        Ok(removed)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Absolute path of a record's backing file.
    pub fn record_path(&self, collection: &str, name: &str) -> Result<PathBuf, RecordStoreError> {
        if !is_valid_segment(name) {
            return Err(RecordStoreError::InvalidName(name.to_string()));
        }
        let dir = self.collection_path(collection)?;
        Ok(dir.join(format!("{name}.{RECORD_EXTENSION}")))
    }

    fn collection_path(&self, collection: &str) -> Result<PathBuf, RecordStoreError> {
        let mut path = self.root.clone();
        for segment in collection.split('/') {
            if !is_valid_segment(segment) {
                return Err(RecordStoreError::InvalidName(collection.to_string()));
            }
            path.push(segment);
        }
        Ok(path)
    }

    async fn lock_record(&self, key: &str) -> RecordLock {
        let lock = Arc::clone(self.write_locks.lock().entry(key.to_string()).or_default());
        let guard = lock.lock_owned().await;
        RecordLock {
            key: key.to_string(),
            locks: Arc::clone(&self.write_locks),
            guard: Some(guard),
        }
    }
}

fn cache_key(collection: &str, name: &str) -> String {
    format!("{collection}/{name}")
}

fn empty_record() -> Arc<Value> {
    Arc::new(Value::Object(serde_json::Map::new()))
}

/// A single path segment that cannot escape its directory or hide itself.
fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && !segment.starts_with('.')
        && !segment.contains(['/', '\\', '\0'])
        && segment != ".."
}
