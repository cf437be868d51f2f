use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use super::{AtomicTake, DropStore, SealedDrop, StoreError, StoredDrop};
use crate::drop_id::DropId;

/// In-memory drop store for testing and single-process use
///
/// Records live in a `HashMap` behind `Arc<Mutex<>>`, so clones share the
/// same records and `take` is atomic with respect to every other call on
/// any clone. Ids come from a sequential counter and are therefore
/// predictable; the unguessable part of a reference is always the key.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    drops: HashMap<DropId, SealedDrop>,

    /// Next id to hand out. Never reused, even after delete.
    next_id: u128,
}

impl MemoryStore {
    /// Create a new empty `MemoryStore`
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned (a thread panicked while
    /// holding the lock). This is acceptable for test/simulation code.
    #[allow(clippy::expect_used)]
    pub fn len(&self) -> usize {
        self.inner.lock().expect("Mutex poisoned").drops.len()
    }

    /// True if no records are held.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if a record exists under `id`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[allow(clippy::expect_used)]
    pub fn contains(&self, id: &DropId) -> bool {
        self.inner.lock().expect("Mutex poisoned").drops.contains_key(id)
    }

    /// Mutate a stored record in place. Returns false if `id` is absent.
    ///
    /// Lets tests play the part of a malicious store that tampers with
    /// ciphertext or nonces.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[allow(clippy::expect_used)]
    pub fn modify(&self, id: &DropId, f: impl FnOnce(&mut SealedDrop)) -> bool {
        let mut inner = self.inner.lock().expect("Mutex poisoned");
        match inner.drops.get_mut(id) {
            Some(record) => {
                f(record);
                true
            },
            None => false,
        }
    }

    /// Delete every record created strictly before `cutoff_secs`.
    ///
    /// Returns the number of records removed.
    pub fn purge_created_before(&self, cutoff_secs: u64) -> Result<usize, StoreError> {
        let mut inner = self.lock()?;
        let before = inner.drops.len();
        inner.drops.retain(|_, record| record.created_at >= cutoff_secs);
        Ok(before - inner.drops.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryStoreInner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store mutex poisoned".to_string()))
    }
}

impl DropStore for MemoryStore {
    async fn insert(&self, record: &SealedDrop) -> Result<DropId, StoreError> {
        let mut inner = self.lock()?;

        inner.next_id += 1;
        let id = DropId::from(inner.next_id);
        inner.drops.insert(id.clone(), record.clone());

        Ok(id)
    }

    async fn fetch(&self, id: &DropId) -> Result<Option<StoredDrop>, StoreError> {
        let inner = self.lock()?;

        Ok(inner
            .drops
            .get(id)
            .map(|record| StoredDrop { id: id.clone(), record: record.clone() }))
    }

    async fn delete(&self, id: &DropId) -> Result<(), StoreError> {
        self.lock()?.drops.remove(id);
        Ok(())
    }
}

impl AtomicTake for MemoryStore {
    async fn take(&self, id: &DropId) -> Result<Option<StoredDrop>, StoreError> {
        let mut inner = self.lock()?;

        Ok(inner.drops.remove(id).map(|record| StoredDrop { id: id.clone(), record }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(created_at: u64) -> SealedDrop {
        SealedDrop { nonce: [7; 12], ciphertext: vec![1, 2, 3], created_at }
    }

    #[tokio::test]
    async fn insert_then_fetch() {
        let store = MemoryStore::new();
        let id = store.insert(&record(10)).await.unwrap();

        let stored = store.fetch(&id).await.unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.record, record(10));
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let store = MemoryStore::new();
        let a = store.insert(&record(1)).await.unwrap();
        let b = store.insert(&record(1)).await.unwrap();

        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let store = MemoryStore::new();
        let a = store.insert(&record(1)).await.unwrap();
        store.delete(&a).await.unwrap();

        let b = store.insert(&record(1)).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::new();
        let id = store.insert(&record(1)).await.unwrap();

        store.delete(&id).await.unwrap();
        store.delete(&id).await.unwrap();

        assert!(store.fetch(&id).await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn take_removes_record() {
        let store = MemoryStore::new();
        let id = store.insert(&record(1)).await.unwrap();

        assert!(store.take(&id).await.unwrap().is_some());
        assert!(store.take(&id).await.unwrap().is_none());
        assert!(!store.contains(&id));
    }

    #[tokio::test]
    async fn clones_share_records() {
        let store = MemoryStore::new();
        let clone = store.clone();

        let id = store.insert(&record(1)).await.unwrap();
        assert!(clone.contains(&id));
    }

    #[tokio::test]
    async fn modify_changes_stored_bytes() {
        let store = MemoryStore::new();
        let id = store.insert(&record(1)).await.unwrap();

        assert!(store.modify(&id, |r| r.ciphertext[0] ^= 0xFF));
        let stored = store.fetch(&id).await.unwrap().unwrap();
        assert_eq!(stored.record.ciphertext[0], 1 ^ 0xFF);

        assert!(!store.modify(&DropId::from(999u128), |_| {}));
    }

    #[tokio::test]
    async fn purge_removes_only_old_records() {
        let store = MemoryStore::new();
        let old = store.insert(&record(100)).await.unwrap();
        let fresh = store.insert(&record(200)).await.unwrap();

        assert_eq!(store.purge_created_before(200).unwrap(), 1);
        assert!(!store.contains(&old));
        assert!(store.contains(&fresh));
    }
}
