//! Sender and receiver flows against a drop store.
//!
//! [`DeadDrop`] is the driver for the pure pieces: it runs the Crypto Engine
//! for the sender, executes [`BurnMachine`] actions for the receiver, and
//! bounds every store call with the configured timeout. Store calls are the
//! only suspension points.

use std::future::Future;

use crate::{
    burn::{BurnAction, BurnMachine, BurnMode, BurnOutcome},
    config::DropConfig,
    drop_id::DropId,
    engine::CryptoEngine,
    env::Environment,
    error::{BurnError, DropError},
    reference::{Reference, build_reference},
    store::{AtomicTake, DropStore, SealedDrop, StoreError, StoredDrop},
};

/// One-time drop runtime bound to an environment and a store.
///
/// Cheap to clone when the store is; clones share the store.
#[derive(Debug, Clone)]
pub struct DeadDrop<E: Environment, S: DropStore> {
    engine: CryptoEngine<E>,
    store: S,
    config: DropConfig,
}

impl<E: Environment, S: DropStore> DeadDrop<E, S> {
    /// Create a runtime.
    pub fn new(env: E, store: S, config: DropConfig) -> Self {
        Self { engine: CryptoEngine::new(env), store, config }
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Active configuration.
    pub fn config(&self) -> &DropConfig {
        &self.config
    }

    /// Crypto Engine used for keys and sealing.
    pub fn engine(&self) -> &CryptoEngine<E> {
        &self.engine
    }

    /// Encrypt `plaintext`, store the ciphertext, and return the reference.
    ///
    /// Creates exactly one record on success and none on failure. The key
    /// exists only in the returned reference; on failure it is dropped
    /// (and zeroized) without ever being reused.
    ///
    /// # Errors
    ///
    /// - `Config` if the reference base would hide the drop id, before any
    ///   key is generated
    /// - `PayloadTooLarge` before any key is generated
    /// - `StorageUnavailable` if the insert fails or times out
    pub async fn create_drop(&self, plaintext: &[u8]) -> Result<Reference, DropError> {
        self.config.validate().map_err(DropError::Config)?;

        if let Some(max) = self.config.max_payload_len
            && plaintext.len() > max
        {
            return Err(DropError::PayloadTooLarge { len: plaintext.len(), max });
        }

        let key = self.engine.generate_key();
        let sealed = self.engine.encrypt(plaintext, &key);
        let record = SealedDrop::new(sealed, self.engine.env().wall_clock_secs());

        let drop_id = match self.bounded("insert", self.store.insert(&record)).await {
            Ok(drop_id) => drop_id,
            Err(err) => {
                tracing::warn!(error = %err, "drop insert failed, key discarded");
                return Err(DropError::StorageUnavailable(err));
            },
        };

        tracing::info!(drop_id = %drop_id, len = plaintext.len(), "drop created");

        build_reference(&self.config.reference_base, drop_id, key).map_err(DropError::Config)
    }

    /// Parse a raw reference and burn the drop with read-then-delete.
    ///
    /// # Errors
    ///
    /// - `InvalidReference` if the reference does not parse
    /// - otherwise as [`Self::open_reference`]
    pub async fn open_drop(&self, raw: &str) -> Result<BurnOutcome, DropError> {
        let reference: Reference = raw.parse()?;
        self.open_reference(reference).await
    }

    /// Burn the drop behind an already parsed reference.
    ///
    /// Reads the record, issues a best-effort delete, then decrypts. A failed
    /// delete is logged and does not block the reader. Two receivers racing
    /// on the same reference may both read the record before either delete
    /// lands; use [`Self::open_drop_atomic`] where the store supports it.
    ///
    /// # Errors
    ///
    /// - `StorageUnavailable` if the read fails or times out. Nothing was
    ///   obtained, so the drop may still exist and the call may be retried.
    /// - `Decryption` if the record was obtained but did not authenticate.
    ///   The record is gone; do not retry.
    pub async fn open_reference(&self, reference: Reference) -> Result<BurnOutcome, DropError> {
        let machine = BurnMachine::for_reference(reference, BurnMode::ReadThenDelete);
        self.burn(machine, "fetch", |id| async move { self.store.fetch(&id).await }).await
    }

    async fn burn<F, Fut>(
        &self,
        mut machine: BurnMachine,
        operation: &'static str,
        lookup: F,
    ) -> Result<BurnOutcome, DropError>
    where
        F: FnOnce(DropId) -> Fut,
        Fut: Future<Output = Result<Option<StoredDrop>, StoreError>>,
    {
        let mut lookup = Some(lookup);
        let mut action = machine.start()?;

        loop {
            let next = match action {
                BurnAction::Fetch(drop_id) | BurnAction::Take(drop_id) => {
                    // The machine never asks for a second lookup in one attempt.
                    let Some(lookup) = lookup.take() else {
                        return Err(DropError::Protocol(BurnError::InvalidState {
                            state: machine.state(),
                            operation,
                        }));
                    };

                    match self.bounded(operation, lookup(drop_id.clone())).await {
                        Ok(found) => machine.handle_fetched(found),
                        Err(err) => {
                            machine.handle_fetch_failed()?;
                            tracing::warn!(drop_id = %drop_id, error = %err, "drop lookup failed");
                            return Err(DropError::StorageUnavailable(err));
                        },
                    }
                },
                BurnAction::Delete(drop_id) => {
                    if let Err(err) = self.bounded("delete", self.store.delete(&drop_id)).await {
                        tracing::warn!(
                            drop_id = %drop_id,
                            error = %err,
                            "drop delete failed, record may remain in store"
                        );
                    }
                    machine.handle_deleted()
                },
                BurnAction::Finish(outcome) => {
                    match &outcome {
                        BurnOutcome::Revealed(payload) => {
                            tracing::info!(
                                drop_id = %machine.drop_id(),
                                len = payload.len(),
                                "drop revealed"
                            );
                        },
                        BurnOutcome::Destroyed => {
                            tracing::info!(drop_id = %machine.drop_id(), "drop not found");
                        },
                    }
                    return Ok(outcome);
                },
            };

            action = next.inspect_err(|err| {
                tracing::warn!(drop_id = %machine.drop_id(), error = %err, "drop burn failed");
            })?;
        }
    }

    /// Run a store operation under the configured timeout.
    ///
    /// A timeout is reported as `StoreError::Timeout`, never as absence.
    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        let after = self.config.store_timeout;

        tokio::time::timeout(after, call)
            .await
            .unwrap_or_else(|_| Err(StoreError::Timeout { operation, after }))
    }
}

impl<E: Environment, S: AtomicTake> DeadDrop<E, S> {
    /// Parse a raw reference and burn the drop with a single atomic take.
    ///
    /// # Errors
    ///
    /// As [`Self::open_drop`].
    pub async fn open_drop_atomic(&self, raw: &str) -> Result<BurnOutcome, DropError> {
        let reference: Reference = raw.parse()?;
        self.open_reference_atomic(reference).await
    }

    /// Burn the drop behind a parsed reference with a single atomic take.
    ///
    /// At most one concurrent caller obtains the record. If the take times
    /// out after the store applied it, the record is gone but unseen; this
    /// is reported as `StorageUnavailable` and a retry observes `Destroyed`.
    ///
    /// # Errors
    ///
    /// As [`Self::open_reference`].
    pub async fn open_reference_atomic(
        &self,
        reference: Reference,
    ) -> Result<BurnOutcome, DropError> {
        let machine = BurnMachine::for_reference(reference, BurnMode::AtomicTake);
        self.burn(machine, "take", |id| async move { self.store.take(&id).await }).await
    }
}
