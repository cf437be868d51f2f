//! Crypto Engine: key generation and AEAD bound to an [`Environment`].
//!
//! The primitives in `deaddrop_crypto` are pure and take their nonce from
//! the caller. This wrapper draws keys and nonces from the environment's
//! secure RNG so each drop gets a fresh key and each seal a fresh nonce.
//! Nothing here blocks or holds state between calls.

use deaddrop_crypto::{
    DecryptionError, EncryptionKey, FormatError, KEY_SIZE, NONCE_SIZE, SealedPayload,
};
use zeroize::Zeroizing;

use crate::{env::Environment, payload::SecretPayload};

/// Key lifecycle and payload encryption.
#[derive(Debug, Clone)]
pub struct CryptoEngine<E: Environment> {
    env: E,
}

impl<E: Environment> CryptoEngine<E> {
    /// Create an engine drawing randomness from `env`.
    pub fn new(env: E) -> Self {
        Self { env }
    }

    /// Generate a fresh 256-bit drop key.
    ///
    /// # Security
    ///
    /// Never reuses a key: every call reads 32 new bytes from the
    /// environment RNG. If the RNG is unavailable the environment aborts;
    /// there is no fallback source.
    pub fn generate_key(&self) -> EncryptionKey {
        let mut bytes = Zeroizing::new([0u8; KEY_SIZE]);
        self.env.random_bytes(&mut *bytes);
        EncryptionKey::from_bytes(*bytes)
    }

    /// Encrypt `plaintext` under `key` with a fresh random 96-bit nonce.
    pub fn encrypt(&self, plaintext: &[u8], key: &EncryptionKey) -> SealedPayload {
        let mut nonce = [0u8; NONCE_SIZE];
        self.env.random_bytes(&mut nonce);
        deaddrop_crypto::seal(plaintext, key, nonce)
    }

    /// Verify and decrypt a stored ciphertext.
    ///
    /// # Errors
    ///
    /// `AuthenticationFailed` for any failure; which check failed is never
    /// revealed.
    pub fn decrypt(
        &self,
        ciphertext: &[u8],
        nonce: &[u8],
        key: &EncryptionKey,
    ) -> Result<SecretPayload, DecryptionError> {
        deaddrop_crypto::open(ciphertext, nonce, key).map(SecretPayload::new)
    }

    /// Encode a key for the reference key segment.
    pub fn export_key(&self, key: &EncryptionKey) -> String {
        deaddrop_crypto::export_key(key)
    }

    /// Decode a key from a reference key segment.
    pub fn import_key(&self, encoded: &str) -> Result<EncryptionKey, FormatError> {
        deaddrop_crypto::import_key(encoded)
    }

    /// Environment this engine draws from.
    pub fn env(&self) -> &E {
        &self.env
    }
}
