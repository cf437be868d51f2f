//! Error types for drop cryptography

use thiserror::Error;

/// Decryption failure.
///
/// There is exactly one variant on purpose: a wrong key, a flipped ciphertext
/// bit, a flipped nonce bit and a truncated record all look the same to the
/// caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecryptionError {
    /// Authentication tag did not verify
    #[error("decryption failed")]
    AuthenticationFailed,
}

/// Key import failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Input is not URL-safe unpadded base64
    #[error("key is not valid base64url")]
    InvalidEncoding,

    /// Decoded key has the wrong number of bytes
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Required key length in bytes
        expected: usize,
        /// Decoded length in bytes
        actual: usize,
    },
}
