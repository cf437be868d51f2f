//! Error types for the drop protocol.
//!
//! Strongly-typed errors per layer: reference parsing, burn state machine
//! transitions, and the top-level [`DropError`] surfaced to sender and
//! receiver code. No message ever carries key material, plaintext, or a full
//! reference string.

use deaddrop_crypto::{DecryptionError, FormatError};
use thiserror::Error;

use crate::{burn::BurnState, drop_id::DropId, store::StoreError};

/// Errors from parsing a reference. Permanent and caller-caused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    /// Reference has no identifier segment
    #[error("reference has no drop id")]
    MissingId,

    /// Reference has no key segment
    #[error("reference has no key")]
    MissingKey,

    /// Identifier contains characters outside `[A-Za-z0-9_-]` or is too long
    #[error("reference has an invalid drop id")]
    InvalidId,

    /// Key segment is present but does not decode to a key
    #[error("reference has a malformed key: {0}")]
    MalformedKey(#[from] FormatError),

    /// Location prefix would not parse back to the same id and prefix
    #[error("reference base must be empty or end with '/' and contain no '?', '#' or whitespace")]
    InvalidBase,
}

/// Errors from the burn state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BurnError {
    /// Operation is not valid in the current state
    #[error("invalid burn transition: cannot {operation} from {state:?}")]
    InvalidState {
        /// State when the error occurred
        state: BurnState,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Fetched record did not authenticate under the reference key
    #[error(transparent)]
    Decryption(#[from] DecryptionError),

    /// Store answered a lookup with the record of another drop.
    ///
    /// Nothing is taken from the answer; the machine stays in `Locating`.
    #[error("store answered lookup for {expected} with record {found}")]
    MismatchedRecord {
        /// Id that was looked up
        expected: DropId,
        /// Id carried by the answer
        found: DropId,
    },
}

/// Errors surfaced by sender and receiver flows.
#[derive(Error, Debug)]
pub enum DropError {
    /// Store could not be reached, failed, or timed out.
    ///
    /// Transient. Safe to retry the same step; on the receiver side this is
    /// only ever returned before a record was obtained.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] StoreError),

    /// Reference could not be parsed. Shown to users as "invalid link".
    #[error("invalid link: {0}")]
    InvalidReference(#[from] ReferenceError),

    /// Record was obtained (and burned) but did not decrypt.
    ///
    /// Wrong key and tampered ciphertext are deliberately indistinguishable.
    #[error("message corrupted or invalid")]
    Decryption(#[source] DecryptionError),

    /// Payload exceeds the configured limit; nothing was stored
    #[error("payload too large: {len} bytes exceeds limit of {max}")]
    PayloadTooLarge {
        /// Payload length in bytes
        len: usize,
        /// Configured limit in bytes
        max: usize,
    },

    /// Runtime configuration cannot produce parseable references; nothing
    /// was stored
    #[error("invalid configuration: {0}")]
    Config(#[source] ReferenceError),

    /// Burn state machine was driven out of order (logic bug)
    #[error("burn protocol violation: {0}")]
    Protocol(BurnError),
}

impl DropError {
    /// Returns true if retrying the same call may succeed.
    ///
    /// Only storage failures before possession are retryable. Everything
    /// else is terminal: a failed decryption must not re-fetch because the
    /// record is already gone.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::StorageUnavailable(_) => true,

            Self::InvalidReference(_)
            | Self::Decryption(_)
            | Self::PayloadTooLarge { .. }
            | Self::Config(_)
            | Self::Protocol(_) => false,
        }
    }
}

impl From<BurnError> for DropError {
    fn from(err: BurnError) -> Self {
        match err {
            BurnError::Decryption(err) => Self::Decryption(err),
            err @ BurnError::MismatchedRecord { .. } => {
                Self::StorageUnavailable(StoreError::Unavailable(err.to_string()))
            },
            err @ BurnError::InvalidState { .. } => Self::Protocol(err),
        }
    }
}

impl From<StoreError> for DropError {
    fn from(err: StoreError) -> Self {
        Self::StorageUnavailable(err)
    }
}
