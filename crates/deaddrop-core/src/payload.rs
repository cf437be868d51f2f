//! Plaintext secret held in process memory.

use std::{fmt, str::Utf8Error};

use zeroize::Zeroize;

/// The plaintext secret.
///
/// Exists only in the sender before encryption and in the receiver after
/// decryption. Zeroized on drop; `Debug` prints only the length.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretPayload {
    bytes: Vec<u8>,
}

impl SecretPayload {
    /// Wrap plaintext bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Plaintext bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Plaintext as UTF-8 text.
    pub fn as_str(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(&self.bytes)
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<Vec<u8>> for SecretPayload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&str> for SecretPayload {
    fn from(text: &str) -> Self {
        Self::new(text.as_bytes().to_vec())
    }
}

impl fmt::Debug for SecretPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretPayload({} bytes)", self.bytes.len())
    }
}

impl Drop for SecretPayload {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_view() {
        let payload = SecretPayload::from("launch codes: 4815162342");
        assert_eq!(payload.as_str(), Ok("launch codes: 4815162342"));
        assert_eq!(payload.len(), 24);
    }

    #[test]
    fn binary_payload_is_not_text() {
        let payload = SecretPayload::new(vec![0xFF, 0xFE]);
        assert!(payload.as_str().is_err());
        assert_eq!(payload.as_bytes(), &[0xFF, 0xFE]);
    }

    #[test]
    fn debug_hides_contents() {
        let payload = SecretPayload::from("hunter2");
        assert_eq!(format!("{payload:?}"), "SecretPayload(7 bytes)");
    }
}
