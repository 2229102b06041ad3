use redb::{Database as RedbDatabase, ReadTransaction, ReadableTable, WriteTransaction};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use super::models::TrashEntry;
use super::tables::*;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Commit error: {0}")]
    Commit(Box<redb::CommitError>),
    #[error("Database error: {0}")]
    Redb(Box<redb::Error>),
    #[error("Database error: {0}")]
    RedbDatabase(Box<redb::DatabaseError>),
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] rmp_serde::decode::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),
    #[error("Storage error: {0}")]
    Storage(Box<redb::StorageError>),
    #[error("Table error: {0}")]
    Table(Box<redb::TableError>),
    #[error("Transaction error: {0}")]
    Transaction(Box<redb::TransactionError>),
}

impl From<redb::CommitError> for DatabaseError {
    fn from(e: redb::CommitError) -> Self {
        DatabaseError::Commit(Box::new(e))
    }
}

impl From<redb::DatabaseError> for DatabaseError {
    fn from(e: redb::DatabaseError) -> Self {
        DatabaseError::RedbDatabase(Box::new(e))
    }
}

impl From<redb::Error> for DatabaseError {
    fn from(e: redb::Error) -> Self {
        DatabaseError::Redb(Box::new(e))
    }
}

impl From<redb::StorageError> for DatabaseError {
    fn from(e: redb::StorageError) -> Self {
        DatabaseError::Storage(Box::new(e))
    }
}

impl From<redb::TableError> for DatabaseError {
    fn from(e: redb::TableError) -> Self {
        DatabaseError::Table(Box::new(e))
    }
}

impl From<redb::TransactionError> for DatabaseError {
    fn from(e: redb::TransactionError) -> Self {
        DatabaseError::Transaction(Box::new(e))
    }
}

/// Sidecar index recording where each trashed payload came from.
pub struct TrashIndex {
    db: Arc<RedbDatabase>,
}

impl Clone for TrashIndex {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
        }
    }
}

/// Statistics from a purge operation
#[derive(Debug, Default)]
pub struct PurgeStats {
    pub entries: u64,
}

impl TrashIndex {
    /// Open or create the index inside the given trash directory
    pub fn open<P: AsRef<Path>>(trash_dir: P) -> Result<Self, DatabaseError> {
        std::fs::create_dir_all(trash_dir.as_ref())?;
        let db_path = trash_dir.as_ref().join("trash-index.redb");
        let db = Arc::new(RedbDatabase::create(db_path)?);

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(TRASH_ENTRIES)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    fn begin_read(&self) -> Result<ReadTransaction, DatabaseError> {
        Ok(self.db.begin_read()?)
    }

    fn begin_write(&self) -> Result<WriteTransaction, DatabaseError> {
        Ok(self.db.begin_write()?)
    }

    pub fn put_entry(&self, entry: &TrashEntry) -> Result<(), DatabaseError> {
        debug_assert!(!entry.trash_name.is_empty(), "trash name must not be empty");

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(TRASH_ENTRIES)?;
            let data = rmp_serde::to_vec_named(entry)?;
            table.insert(entry.trash_name.as_str(), data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get_entry(&self, trash_name: &str) -> Result<Option<TrashEntry>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(TRASH_ENTRIES)?;

        match table.get(trash_name)? {
            Some(data) => {
                let entry: TrashEntry = rmp_serde::from_slice(data.value())?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    /// Remove an entry. Returns false if it was not indexed.
    pub fn remove_entry(&self, trash_name: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(TRASH_ENTRIES)?;
            let result = table.remove(trash_name)?.is_some();
            result
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// All entries, most recently deleted first
    pub fn list_entries(&self) -> Result<Vec<TrashEntry>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(TRASH_ENTRIES)?;

        let mut entries = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let entry: TrashEntry = rmp_serde::from_slice(value.value())?;
            entries.push(entry);
        }

        entries.sort_by(|a, b| {
            b.deleted_at
                .cmp(&a.deleted_at)
                .then_with(|| a.trash_name.cmp(&b.trash_name))
        });
        Ok(entries)
    }

    /// Drop every entry
    pub fn purge_all(&self) -> Result<PurgeStats, DatabaseError> {
        let write_txn = self.begin_write()?;
        let mut stats = PurgeStats::default();

        {
            let mut table = write_txn.open_table(TRASH_ENTRIES)?;
            let keys: Vec<String> = table
                .iter()?
                .map(|r| r.map(|(k, _)| k.value().to_string()))
                .collect::<Result<Vec<_>, _>>()?;

            for key in keys {
                table.remove(key.as_str())?;
                stats.entries += 1;
            }
        }

        write_txn.commit()?;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn entry(trash_name: &str, minutes_ago: i64) -> TrashEntry {
        TrashEntry {
            trash_name: trash_name.to_string(),
            original_path: format!("docs/{trash_name}"),
            name: trash_name.to_string(),
            deleted_at: Utc::now() - Duration::minutes(minutes_ago),
            size: 3,
            is_directory: false,
        }
    }

    #[test]
    fn test_entries_listed_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let index = TrashIndex::open(dir.path()).unwrap();
        index.put_entry(&entry("old.txt", 30)).unwrap();
        index.put_entry(&entry("new.txt", 1)).unwrap();
        index.put_entry(&entry("mid.txt", 10)).unwrap();

        let names: Vec<String> = index
            .list_entries()
            .unwrap()
            .into_iter()
            .map(|e| e.trash_name)
            .collect();
        assert_eq!(names, vec!["new.txt", "mid.txt", "old.txt"]);
    }

    #[test]
    fn test_get_and_remove_entry() {
        let dir = tempfile::tempdir().unwrap();
        let index = TrashIndex::open(dir.path()).unwrap();
        let stored = entry("a.txt", 0);
        index.put_entry(&stored).unwrap();

        assert_eq!(index.get_entry("a.txt").unwrap(), Some(stored));
        assert!(index.remove_entry("a.txt").unwrap());
        assert!(!index.remove_entry("a.txt").unwrap());
        assert!(index.get_entry("a.txt").unwrap().is_none());
    }

    #[test]
    fn test_purge_all_counts_entries() {
        let dir = tempfile::tempdir().unwrap();
        let index = TrashIndex::open(dir.path()).unwrap();
        for name in ["a", "b", "c"] {
            index.put_entry(&entry(name, 0)).unwrap();
        }

        assert_eq!(index.purge_all().unwrap().entries, 3);
        assert!(index.list_entries().unwrap().is_empty());
        assert_eq!(index.purge_all().unwrap().entries, 0);
    }
}
