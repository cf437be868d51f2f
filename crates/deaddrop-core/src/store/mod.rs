//! Drop Store abstraction.
//!
//! The store is an untrusted key-value collaborator: it assigns ids, answers
//! point lookups, and deletes by id. It never sees key material or
//! plaintext. Methods are async because every call is an I/O boundary; the
//! runtime bounds each one with a timeout.

mod chaotic;
mod error;
mod memory;

use std::future::Future;

pub use chaotic::ChaoticStore;
use deaddrop_crypto::{NONCE_SIZE, SealedPayload};
pub use error::StoreError;
pub use memory::MemoryStore;
use serde::{Deserialize, Serialize};

use crate::drop_id::DropId;

/// Record contents handed to the store by the sender.
///
/// Contains no key material and no plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedDrop {
    /// AEAD nonce used for this drop.
    pub nonce: [u8; NONCE_SIZE],
    /// Ciphertext including the authentication tag.
    pub ciphertext: Vec<u8>,
    /// Unix timestamp (seconds) stamped by the sender.
    pub created_at: u64,
}

impl SealedDrop {
    /// Wrap an encryption result with its creation time.
    pub fn new(sealed: SealedPayload, created_at: u64) -> Self {
        Self { nonce: sealed.nonce, ciphertext: sealed.ciphertext, created_at }
    }
}

/// A persisted drop record as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDrop {
    /// Store-assigned identifier.
    pub id: DropId,
    /// Record contents.
    pub record: SealedDrop,
}

/// Storage backend for drop records.
///
/// Must be Clone (shared between sender and receiver flows), Send + Sync,
/// and `'static`. Implementations share state via Arc, so clones see the
/// same records.
pub trait DropStore: Clone + Send + Sync + 'static {
    /// Persist a record and return its newly assigned id.
    ///
    /// # Invariants
    ///
    /// - Post: exactly one record exists under the returned id
    /// - Post: on error, no record was created
    fn insert(
        &self,
        record: &SealedDrop,
    ) -> impl Future<Output = Result<DropId, StoreError>> + Send;

    /// Point lookup by id. `None` if absent.
    ///
    /// Absent covers both "never existed" and "already consumed"; the
    /// store must not distinguish them.
    fn fetch(
        &self,
        id: &DropId,
    ) -> impl Future<Output = Result<Option<StoredDrop>, StoreError>> + Send;

    /// Delete by id. Deleting an absent id is not an error.
    fn delete(&self, id: &DropId) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Stores that can fetch and delete a record as one atomic step.
///
/// Two concurrent `take` calls on the same id never both return the record.
pub trait AtomicTake: DropStore {
    /// Remove and return the record under `id`, or `None` if absent.
    fn take(
        &self,
        id: &DropId,
    ) -> impl Future<Output = Result<Option<StoredDrop>, StoreError>> + Send;
}
