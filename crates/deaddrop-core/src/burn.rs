//! Receiver-side burn protocol state machine.
//!
//! Coordinates fetch-and-destroy for one drop. Uses the action pattern:
//! methods take store results as input and return actions for the driver to
//! execute. The machine performs no I/O and reads no clock, so every
//! ordering rule below is checked without a store.
//!
//! # State Machine
//!
//! ```text
//!              Fetch failed (stays, retry allowed)
//!                 ┌────┐
//!                 ↓    │
//!            ┌──────────┐  record   ┌─────────┐ deleted (ok or not) ┌────────────┐
//!  start ───>│ Locating │──────────>│ Burning │────────────────────>│ Decrypting │
//!            └──────────┘           └─────────┘                     └────────────┘
//!                 │  │                                                 │       │
//!                 │  │ taken (atomic mode)                             │       │
//!                 │  └─────────────────────────────────────────────────┘       │
//!      no record  │                                               tag ok │     │ tag bad
//!                 ↓                                                      ↓     ↓
//!           ┌───────────┐                                     ┌──────────┐ ┌────────┐
//!           │ Destroyed │                                     │ Revealed │ │ Failed │
//!           └───────────┘                                     └──────────┘ └────────┘
//! ```
//!
//! # Ordering
//!
//! Within one attempt the read completes before the delete is issued, and
//! the delete is issued before decryption. `Destroyed`, `Revealed` and
//! `Failed` are terminal: nothing is ever re-fetched after a record has been
//! obtained, including after a failed decryption.

use deaddrop_crypto::EncryptionKey;

use crate::{
    drop_id::DropId,
    error::BurnError,
    payload::SecretPayload,
    reference::Reference,
    store::{SealedDrop, StoredDrop},
};

/// How the receiver removes the record from the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BurnMode {
    /// Point read followed by a best-effort delete.
    ///
    /// Works against any store. Two receivers racing on one id can both
    /// read before either delete lands.
    #[default]
    ReadThenDelete,

    /// Single atomic fetch-and-delete. Requires an
    /// [`AtomicTake`](crate::store::AtomicTake) store.
    AtomicTake,
}

/// Burn protocol state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurnState {
    /// Initial state - looking the id up in the store
    Locating,
    /// Record obtained, delete issued
    Burning,
    /// Record removed (or removal attempted), decrypting locally
    Decrypting,
    /// Terminal - plaintext released to the caller
    Revealed,
    /// Terminal - no record under this id (consumed or never existed)
    Destroyed,
    /// Terminal - record obtained but did not authenticate
    Failed,
}

impl BurnState {
    /// True for states that never emit further actions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Revealed | Self::Destroyed | Self::Failed)
    }
}

/// Result of a finished burn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BurnOutcome {
    /// Plaintext, held only in receiver memory
    Revealed(SecretPayload),
    /// Already consumed or never existed. The two are indistinguishable.
    Destroyed,
}

/// Actions returned by the burn state machine.
///
/// The driver executes these against the store:
/// - `Fetch`: point read, report with `handle_fetched` / `handle_fetch_failed`
/// - `Take`: atomic fetch-and-delete, reported the same way as `Fetch`
/// - `Delete`: best-effort delete, report with `handle_deleted`
/// - `Finish`: no more I/O, hand the outcome to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BurnAction {
    /// Read the record by id
    Fetch(DropId),
    /// Read and delete the record in one step
    Take(DropId),
    /// Delete the record by id
    Delete(DropId),
    /// Burn complete
    Finish(BurnOutcome),
}

/// Burn protocol state machine for a single drop
///
/// Holds the drop id and key for one receiver attempt. Pure: no I/O, no
/// Environment.
#[derive(Debug)]
pub struct BurnMachine {
    state: BurnState,
    mode: BurnMode,
    drop_id: DropId,
    key: EncryptionKey,
    /// Record obtained from the store, held between Burning and Decrypting
    held: Option<SealedDrop>,
    /// True while a Fetch/Take is outstanding
    lookup_in_flight: bool,
}

impl BurnMachine {
    /// Create a machine in [`BurnState::Locating`].
    pub fn new(drop_id: DropId, key: EncryptionKey, mode: BurnMode) -> Self {
        Self {
            state: BurnState::Locating,
            mode,
            drop_id,
            key,
            held: None,
            lookup_in_flight: false,
        }
    }

    /// Create a machine for a parsed reference.
    pub fn for_reference(reference: Reference, mode: BurnMode) -> Self {
        let (drop_id, key) = reference.into_parts();
        Self::new(drop_id, key, mode)
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> BurnState {
        self.state
    }

    /// Burn mode
    pub fn mode(&self) -> BurnMode {
        self.mode
    }

    /// Drop being burned
    pub fn drop_id(&self) -> &DropId {
        &self.drop_id
    }

    /// Issue the lookup for this drop.
    ///
    /// Valid in `Locating` with no lookup outstanding, so it is also the
    /// retry entry point after [`Self::handle_fetch_failed`].
    pub fn start(&mut self) -> Result<BurnAction, BurnError> {
        if self.state != BurnState::Locating || self.lookup_in_flight {
            return Err(self.invalid("start"));
        }

        self.lookup_in_flight = true;

        Ok(match self.mode {
            BurnMode::ReadThenDelete => BurnAction::Fetch(self.drop_id.clone()),
            BurnMode::AtomicTake => BurnAction::Take(self.drop_id.clone()),
        })
    }

    /// Handle the store's answer to `Fetch` or `Take`.
    ///
    /// - `None`: transition to `Destroyed`
    /// - `Some` (read mode): transition to `Burning`, returns `Delete`
    /// - `Some` (take mode): the record is already gone, decrypt immediately
    ///
    /// # Errors
    ///
    /// - `InvalidState` if no lookup is outstanding
    /// - `MismatchedRecord` if the answer carries another drop's id; the
    ///   machine stays in `Locating` and may be started again
    /// - `Decryption` if a taken record does not authenticate (state becomes
    ///   `Failed`)
    pub fn handle_fetched(&mut self, found: Option<StoredDrop>) -> Result<BurnAction, BurnError> {
        if self.state != BurnState::Locating || !self.lookup_in_flight {
            return Err(self.invalid("handle_fetched"));
        }
        self.lookup_in_flight = false;

        let Some(stored) = found else {
            self.state = BurnState::Destroyed;
            return Ok(BurnAction::Finish(BurnOutcome::Destroyed));
        };

        if stored.id != self.drop_id {
            return Err(BurnError::MismatchedRecord {
                expected: self.drop_id.clone(),
                found: stored.id,
            });
        }

        self.held = Some(stored.record);

        match self.mode {
            BurnMode::ReadThenDelete => {
                self.state = BurnState::Burning;
                Ok(BurnAction::Delete(self.drop_id.clone()))
            },
            BurnMode::AtomicTake => self.decrypt(),
        }
    }

    /// Handle a lookup that failed or timed out.
    ///
    /// The machine stays in `Locating`: nothing was obtained, so the drop
    /// must not be reported as destroyed, and the caller may call
    /// [`Self::start`] again.
    pub fn handle_fetch_failed(&mut self) -> Result<(), BurnError> {
        if self.state != BurnState::Locating || !self.lookup_in_flight {
            return Err(self.invalid("handle_fetch_failed"));
        }

        self.lookup_in_flight = false;
        Ok(())
    }

    /// Handle completion of the delete, successful or not.
    ///
    /// Possession was established by the read; the delete is cleanup. The
    /// machine always proceeds to decryption.
    ///
    /// # Errors
    ///
    /// - `InvalidState` unless in `Burning`
    /// - `Decryption` if the record does not authenticate (state becomes
    ///   `Failed`)
    pub fn handle_deleted(&mut self) -> Result<BurnAction, BurnError> {
        if self.state != BurnState::Burning {
            return Err(self.invalid("handle_deleted"));
        }

        self.decrypt()
    }

    fn decrypt(&mut self) -> Result<BurnAction, BurnError> {
        self.state = BurnState::Decrypting;

        let Some(record) = self.held.take() else {
            self.state = BurnState::Failed;
            return Err(self.invalid("decrypt"));
        };

        match deaddrop_crypto::open(&record.ciphertext, &record.nonce, &self.key) {
            Ok(plaintext) => {
                self.state = BurnState::Revealed;
                Ok(BurnAction::Finish(BurnOutcome::Revealed(SecretPayload::new(plaintext))))
            },
            Err(err) => {
                self.state = BurnState::Failed;
                Err(BurnError::Decryption(err))
            },
        }
    }

    fn invalid(&self, operation: &'static str) -> BurnError {
        BurnError::InvalidState { state: self.state, operation }
    }
}
