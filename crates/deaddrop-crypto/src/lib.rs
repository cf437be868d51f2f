//! Deaddrop Cryptographic Primitives
//!
//! Cryptographic building blocks for one-time encrypted drops. Pure functions
//! with deterministic outputs. Callers provide random bytes (keys and nonces)
//! for deterministic testing.
//!
//! # Key Lifecycle
//!
//! ```text
//! OS RNG (caller) ──> EncryptionKey ──export──> reference fragment
//!                          │
//!                          ▼
//! OS RNG (caller) ──> nonce ──> seal ──> SealedPayload ──> drop store
//! ```
//!
//! A key encrypts exactly one payload. It is zeroized when dropped and never
//! leaves the sender except inside the out-of-band reference.
//!
//! # Security
//!
//! Authenticity:
//! - `ChaCha20-Poly1305` AEAD, 256-bit key, 96-bit nonce, 16-byte tag
//! - The tag is verified before plaintext is released
//! - Every decryption failure maps to the single
//!   [`DecryptionError::AuthenticationFailed`] so no oracle distinguishes
//!   "wrong key" from "tampered record"
//!
//! Encoding:
//! - Keys export as unpadded URL-safe base64 (43 characters), which is safe
//!   to place in a URL fragment

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod cipher;
mod error;
mod key;

pub use cipher::{NONCE_SIZE, SealedPayload, TAG_SIZE, open, seal};
pub use error::{DecryptionError, FormatError};
pub use key::{EXPORTED_KEY_LEN, EncryptionKey, KEY_SIZE, export_key, import_key};
