//! Deaddrop Core
//!
//! One-time encrypted message exchange through an untrusted store. The
//! sender encrypts locally and uploads only ciphertext and nonce; the key
//! travels out of band inside a reference. The receiver burns the record
//! (fetch, then delete) and decrypts locally.
//!
//! # Architecture
//!
//! ```text
//! Sender:   plaintext ──> CryptoEngine ──> DropStore::insert ──> Reference
//! Receiver: Reference ──> BurnMachine ──> fetch ──> delete ──> decrypt
//! ```
//!
//! - [`CryptoEngine`], [`reference`] and [`BurnMachine`] are pure and
//!   synchronous. Randomness and time come from an [`Environment`].
//! - [`DropStore`] is the only I/O seam. [`DeadDrop`] drives the pure pieces
//!   against it and bounds each call with a timeout.
//!
//! # Residual Risks
//!
//! - Read and delete are separate calls, so two receivers racing on one id
//!   can both read before either delete lands. Stores implementing
//!   [`AtomicTake`] close this window via
//!   [`DeadDrop::open_drop_atomic`]. No client-side lock is attempted; it
//!   could not span independent receiver processes.
//! - Delete is best effort. If it fails, or the receiver stops between read
//!   and delete, the record can be read again.
//! - The key stays out of the store only because it sits in the reference
//!   fragment, which transports do not forward. Callers must send
//!   [`Reference::request_path`] and never the full reference.
//! - Single use is by convention, not cryptography. A reference copied
//!   before first use is as good as the original.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod burn;
pub mod config;
mod dead_drop;
mod drop_id;
mod engine;
pub mod env;
pub mod error;
mod payload;
pub mod reference;
pub mod store;

pub use burn::{BurnAction, BurnMachine, BurnMode, BurnOutcome, BurnState};
pub use config::DropConfig;
pub use dead_drop::DeadDrop;
pub use deaddrop_crypto::{DecryptionError, EncryptionKey, FormatError};
pub use drop_id::{DropId, MAX_DROP_ID_LEN};
pub use engine::CryptoEngine;
pub use env::Environment;
pub use error::{BurnError, DropError, ReferenceError};
pub use payload::SecretPayload;
pub use reference::{Reference, build_reference, check_base, parse_reference};
pub use store::{AtomicTake, ChaoticStore, DropStore, MemoryStore, SealedDrop, StoreError, StoredDrop};
