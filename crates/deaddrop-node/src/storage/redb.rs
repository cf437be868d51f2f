//! Redb-backed durable drop store.
//!
//! Uses Redb's ACID transactions with Copy-on-Write for crash safety. Every
//! call runs on Tokio's blocking pool so store I/O never stalls the runtime.
//! `take` removes and returns a record inside a single write transaction,
//! which makes it atomic with respect to every other reader.

use std::{path::Path, sync::Arc};

use deaddrop_core::{AtomicTake, DropId, DropStore, SealedDrop, StoreError, StoredDrop};
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};

/// Table: drops
/// Key: drop id (32 lowercase hex characters)
/// Value: CBOR-encoded `SealedDrop`
const DROPS: TableDefinition<&str, &[u8]> = TableDefinition::new("drops");

/// Attempts at drawing an unused id before giving up.
const MAX_ID_ATTEMPTS: usize = 4;

/// Durable drop store backed by Redb.
///
/// Thread-safe through Redb's internal locking. Clone is cheap (Arc). Ids
/// are 128-bit values from the OS RNG.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create a Redb database at the given path.
    ///
    /// Creates the DROPS table if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::create(path.as_ref()).map_err(io_error)?;

        let txn = db.begin_write().map_err(io_error)?;
        {
            let _ = txn.open_table(DROPS).map_err(io_error)?;
        }
        txn.commit().map_err(io_error)?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Number of records currently held.
    pub async fn len(&self) -> Result<u64, StoreError> {
        self.blocking(|db| {
            let txn = db.begin_read().map_err(io_error)?;
            let table = txn.open_table(DROPS).map_err(io_error)?;
            table.len().map_err(io_error)
        })
        .await
    }

    /// True if no records are held.
    pub async fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len().await? == 0)
    }

    /// Delete every record created strictly before `cutoff_secs`.
    ///
    /// Returns the number of records removed. Runs in one write
    /// transaction; records that fail to decode are left in place.
    pub async fn purge_created_before(&self, cutoff_secs: u64) -> Result<usize, StoreError> {
        self.blocking(move |db| {
            let txn = db.begin_write().map_err(io_error)?;

            let purged = {
                let mut table = txn.open_table(DROPS).map_err(io_error)?;

                let mut expired = Vec::new();
                for entry in table.iter().map_err(io_error)? {
                    let (key, value) = entry.map_err(io_error)?;
                    match decode(value.value()) {
                        Ok(record) if record.created_at < cutoff_secs => {
                            expired.push(key.value().to_string());
                        },
                        Ok(_) => {},
                        Err(err) => {
                            tracing::warn!(
                                drop_id = key.value(),
                                error = %err,
                                "skipping undecodable record"
                            );
                        },
                    }
                }

                for key in &expired {
                    table.remove(key.as_str()).map_err(io_error)?;
                }

                expired.len()
            };

            txn.commit().map_err(io_error)?;

            Ok(purged)
        })
        .await
    }

    /// Run `f` against the database on the blocking pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T, StoreError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);

        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
    }
}

impl DropStore for RedbStore {
    async fn insert(&self, record: &SealedDrop) -> Result<DropId, StoreError> {
        let bytes = encode(record)?;

        self.blocking(move |db| {
            let txn = db.begin_write().map_err(io_error)?;

            let id = {
                let mut table = txn.open_table(DROPS).map_err(io_error)?;
                let id = unused_id(&table)?;
                table.insert(id.as_str(), bytes.as_slice()).map_err(io_error)?;
                id
            };

            txn.commit().map_err(io_error)?;

            Ok(id)
        })
        .await
    }

    async fn fetch(&self, id: &DropId) -> Result<Option<StoredDrop>, StoreError> {
        let id = id.clone();

        self.blocking(move |db| {
            let txn = db.begin_read().map_err(io_error)?;
            let table = txn.open_table(DROPS).map_err(io_error)?;

            let record = match table.get(id.as_str()).map_err(io_error)? {
                Some(value) => Some(decode(value.value())?),
                None => None,
            };

            Ok(record.map(|record| StoredDrop { id, record }))
        })
        .await
    }

    async fn delete(&self, id: &DropId) -> Result<(), StoreError> {
        let id = id.clone();

        self.blocking(move |db| {
            let txn = db.begin_write().map_err(io_error)?;
            {
                let mut table = txn.open_table(DROPS).map_err(io_error)?;
                table.remove(id.as_str()).map_err(io_error)?;
            }
            txn.commit().map_err(io_error)?;

            Ok(())
        })
        .await
    }
}

impl AtomicTake for RedbStore {
    async fn take(&self, id: &DropId) -> Result<Option<StoredDrop>, StoreError> {
        let id = id.clone();

        self.blocking(move |db| {
            let txn = db.begin_write().map_err(io_error)?;

            let record = {
                let mut table = txn.open_table(DROPS).map_err(io_error)?;
                let removed = table.remove(id.as_str()).map_err(io_error)?;
                match removed {
                    Some(value) => Some(decode(value.value())?),
                    None => None,
                }
            };

            txn.commit().map_err(io_error)?;

            Ok(record.map(|record| StoredDrop { id, record }))
        })
        .await
    }
}

/// Draw a random id not yet present in the table.
fn unused_id<T: ReadableTable<&'static str, &'static [u8]>>(
    table: &T,
) -> Result<DropId, StoreError> {
    for _ in 0..MAX_ID_ATTEMPTS {
        let mut bytes = [0u8; 16];
        getrandom::fill(&mut bytes).map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let id = DropId::from(u128::from_be_bytes(bytes));
        if table.get(id.as_str()).map_err(io_error)?.is_none() {
            return Ok(id);
        }
    }

    Err(StoreError::Io("could not allocate an unused drop id".to_string()))
}

fn encode(record: &SealedDrop) -> Result<Vec<u8>, StoreError> {
    let mut bytes = Vec::with_capacity(record.ciphertext.len() + 32);
    ciborium::into_writer(record, &mut bytes)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(bytes)
}

fn decode(bytes: &[u8]) -> Result<SealedDrop, StoreError> {
    ciborium::from_reader(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

#[allow(clippy::needless_pass_by_value)]
fn io_error(e: impl std::fmt::Display) -> StoreError {
    StoreError::Io(e.to_string())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn record(created_at: u64) -> SealedDrop {
        SealedDrop { nonce: [9; 12], ciphertext: vec![0xC0, 0xFF, 0xEE], created_at }
    }

    #[test]
    fn record_encoding_roundtrip() {
        let bytes = encode(&record(5)).unwrap();
        assert_eq!(decode(&bytes).unwrap(), record(5));
    }

    #[test]
    fn garbage_record_is_serialization_error() {
        assert!(matches!(decode(&[0xFF, 0x00]), Err(StoreError::Serialization(_))));
    }

    #[tokio::test]
    async fn insert_fetch_delete() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("test.redb")).unwrap();

        let id = store.insert(&record(1)).await.unwrap();
        assert_eq!(id.as_str().len(), 32);

        let stored = store.fetch(&id).await.unwrap().unwrap();
        assert_eq!(stored.record, record(1));

        store.delete(&id).await.unwrap();
        assert!(store.fetch(&id).await.unwrap().is_none());

        // Idempotent
        store.delete(&id).await.unwrap();
    }

    #[tokio::test]
    async fn take_is_single_use() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("test.redb")).unwrap();

        let id = store.insert(&record(1)).await.unwrap();

        assert!(store.take(&id).await.unwrap().is_some());
        assert!(store.take(&id).await.unwrap().is_none());
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.redb");

        let id = {
            let store = RedbStore::open(&path).unwrap();
            store.insert(&record(7)).await.unwrap()
        };

        let store = RedbStore::open(&path).unwrap();
        let stored = store.fetch(&id).await.unwrap().unwrap();
        assert_eq!(stored.record.created_at, 7);
    }

    #[tokio::test]
    async fn purge_removes_only_old_records() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("test.redb")).unwrap();

        let old = store.insert(&record(100)).await.unwrap();
        let fresh = store.insert(&record(300)).await.unwrap();

        assert_eq!(store.purge_created_before(200).await.unwrap(), 1);
        assert!(store.fetch(&old).await.unwrap().is_none());
        assert!(store.fetch(&fresh).await.unwrap().is_some());
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn ids_are_distinct() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("test.redb")).unwrap();

        let a = store.insert(&record(1)).await.unwrap();
        let b = store.insert(&record(1)).await.unwrap();
        assert_ne!(a, b);
    }
}
