//! Per-drop symmetric key and its portable encoding
//!
//! # Security Properties
//!
//! - Key bytes are zeroized when the key is dropped
//! - `Debug` never prints key material
//! - The export encoding is canonical: one key has exactly one string form

use std::fmt;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use zeroize::{Zeroize, Zeroizing};

use crate::error::FormatError;

/// Size of a drop key in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

/// Length of an exported key string (unpadded base64 of [`KEY_SIZE`] bytes)
pub const EXPORTED_KEY_LEN: usize = 43;

/// A 256-bit ChaCha20-Poly1305 key, one per drop.
///
/// Generated by the sender, carried only inside the out-of-band reference,
/// and never handed to the drop store.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey {
    bytes: [u8; KEY_SIZE],
}

impl EncryptionKey {
    /// Wrap raw key bytes.
    ///
    /// Callers generating a fresh key MUST fill `bytes` from a
    /// cryptographically secure source.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Encode the key for transport inside a reference.
    pub fn export(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.bytes)
    }

    /// Decode a key previously produced by [`export`](Self::export).
    ///
    /// # Errors
    ///
    /// - `InvalidEncoding`: not URL-safe unpadded base64 (padding, whitespace
    ///   and the standard alphabet are all rejected)
    /// - `InvalidLength`: decodes to anything other than 32 bytes
    pub fn import(encoded: &str) -> Result<Self, FormatError> {
        let decoded = Zeroizing::new(
            URL_SAFE_NO_PAD.decode(encoded).map_err(|_| FormatError::InvalidEncoding)?,
        );

        if decoded.len() != KEY_SIZE {
            return Err(FormatError::InvalidLength { expected: KEY_SIZE, actual: decoded.len() });
        }

        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(&decoded);
        Ok(Self { bytes })
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey([REDACTED])")
    }
}

impl Drop for EncryptionKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

/// Encode `key` for embedding in a reference.
pub fn export_key(key: &EncryptionKey) -> String {
    key.export()
}

/// Decode a key segment taken from a reference.
pub fn import_key(encoded: &str) -> Result<EncryptionKey, FormatError> {
    EncryptionKey::import(encoded)
}
