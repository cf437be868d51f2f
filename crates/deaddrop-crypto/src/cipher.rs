//! Payload encryption using `ChaCha20-Poly1305`
//!
//! All functions are pure - the nonce must be provided by the caller.
//! This enables deterministic testing and keeps the crate free of any
//! randomness source.

use chacha20poly1305::{
    ChaCha20Poly1305, Nonce,
    aead::{Aead, KeyInit},
};

use crate::{error::DecryptionError, key::EncryptionKey};

/// Size of the `ChaCha20-Poly1305` nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Poly1305 tag size (16 bytes)
pub const TAG_SIZE: usize = 16;

/// Ciphertext and the nonce it was sealed under.
///
/// Neither field is secret; both are handed to the drop store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    /// The 12-byte nonce, unique per seal
    pub nonce: [u8; NONCE_SIZE],
    /// The ciphertext including the 16-byte Poly1305 tag
    pub ciphertext: Vec<u8>,
}

impl SealedPayload {
    /// Plaintext length (ciphertext length minus authentication tag).
    pub fn plaintext_len(&self) -> usize {
        self.ciphertext.len().saturating_sub(TAG_SIZE)
    }
}

/// Encrypt `plaintext` under `key` with a caller-supplied nonce.
///
/// # Security
///
/// - Caller MUST never reuse `nonce` with the same key; in production it is
///   drawn fresh from the OS RNG for every call
/// - Output length is always `plaintext.len() + TAG_SIZE`
pub fn seal(plaintext: &[u8], key: &EncryptionKey, nonce: [u8; NONCE_SIZE]) -> SealedPayload {
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());

    let Ok(ciphertext) = cipher.encrypt(Nonce::from_slice(&nonce), plaintext) else {
        unreachable!("ChaCha20-Poly1305 encryption cannot fail with valid inputs");
    };

    debug_assert_eq!(ciphertext.len(), plaintext.len() + TAG_SIZE);

    SealedPayload { nonce, ciphertext }
}

/// Verify and decrypt a sealed payload.
///
/// The tag is checked before any plaintext is released.
///
/// # Errors
///
/// - `AuthenticationFailed`: wrong key, tampered ciphertext, tampered nonce,
///   wrong nonce length or a ciphertext shorter than the tag. The cases are
///   deliberately indistinguishable.
pub fn open(
    ciphertext: &[u8],
    nonce: &[u8],
    key: &EncryptionKey,
) -> Result<Vec<u8>, DecryptionError> {
    if nonce.len() != NONCE_SIZE || ciphertext.len() < TAG_SIZE {
        return Err(DecryptionError::AuthenticationFailed);
    }

    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| DecryptionError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KEY_SIZE;

    fn test_key(seed: u8) -> EncryptionKey {
        let mut bytes = [0u8; KEY_SIZE];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = seed.wrapping_add(i as u8);
        }
        EncryptionKey::from_bytes(bytes)
    }

    #[test]
    fn seal_open_roundtrip() {
        let key = test_key(1);
        let plaintext = b"launch codes: 4815162342";

        let sealed = seal(plaintext, &key, [0xAB; NONCE_SIZE]);
        let opened = open(&sealed.ciphertext, &sealed.nonce, &key).unwrap();

        assert_eq!(opened, plaintext);
    }

    #[test]
    fn seal_open_empty_payload() {
        let key = test_key(2);

        let sealed = seal(b"", &key, [0x00; NONCE_SIZE]);
        assert_eq!(sealed.ciphertext.len(), TAG_SIZE);

        let opened = open(&sealed.ciphertext, &sealed.nonce, &key).unwrap();
        assert!(opened.is_empty());
    }

    #[test]
    fn ciphertext_carries_tag_overhead() {
        let key = test_key(3);
        let plaintext = b"twelve bytes";

        let sealed = seal(plaintext, &key, [0x01; NONCE_SIZE]);

        assert_eq!(sealed.ciphertext.len(), plaintext.len() + TAG_SIZE);
        assert_eq!(sealed.plaintext_len(), plaintext.len());
    }

    #[test]
    fn wrong_key_fails() {
        let sealed = seal(b"secret", &test_key(4), [0x02; NONCE_SIZE]);

        let result = open(&sealed.ciphertext, &sealed.nonce, &test_key(5));
        assert_eq!(result, Err(DecryptionError::AuthenticationFailed));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let key = test_key(6);
        let mut sealed = seal(b"original message", &key, [0x03; NONCE_SIZE]);

        sealed.ciphertext[0] ^= 0x01;

        let result = open(&sealed.ciphertext, &sealed.nonce, &key);
        assert_eq!(result, Err(DecryptionError::AuthenticationFailed));
    }

    #[test]
    fn tampered_tag_fails() {
        let key = test_key(7);
        let mut sealed = seal(b"original message", &key, [0x04; NONCE_SIZE]);

        let last = sealed.ciphertext.len() - 1;
        sealed.ciphertext[last] ^= 0x80;

        let result = open(&sealed.ciphertext, &sealed.nonce, &key);
        assert_eq!(result, Err(DecryptionError::AuthenticationFailed));
    }

    #[test]
    fn tampered_nonce_fails() {
        let key = test_key(8);
        let mut sealed = seal(b"original message", &key, [0x05; NONCE_SIZE]);

        sealed.nonce[11] ^= 0x01;

        let result = open(&sealed.ciphertext, &sealed.nonce, &key);
        assert_eq!(result, Err(DecryptionError::AuthenticationFailed));
    }

    #[test]
    fn wrong_nonce_length_fails() {
        let key = test_key(9);
        let sealed = seal(b"payload", &key, [0x06; NONCE_SIZE]);

        assert_eq!(
            open(&sealed.ciphertext, &sealed.nonce[..8], &key),
            Err(DecryptionError::AuthenticationFailed)
        );
        assert_eq!(
            open(&sealed.ciphertext, &[0x06; 24], &key),
            Err(DecryptionError::AuthenticationFailed)
        );
    }

    #[test]
    fn truncated_ciphertext_fails() {
        let key = test_key(10);
        let sealed = seal(b"payload", &key, [0x07; NONCE_SIZE]);

        assert_eq!(
            open(&sealed.ciphertext[..TAG_SIZE - 1], &sealed.nonce, &key),
            Err(DecryptionError::AuthenticationFailed)
        );
        assert_eq!(open(&[], &sealed.nonce, &key), Err(DecryptionError::AuthenticationFailed));
    }

    #[test]
    fn different_nonces_produce_different_ciphertexts() {
        let key = test_key(11);

        let a = seal(b"same", &key, [0x00; NONCE_SIZE]);
        let b = seal(b"same", &key, [0xFF; NONCE_SIZE]);

        assert_ne!(a.ciphertext, b.ciphertext);
    }
}
