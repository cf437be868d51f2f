//! Property-based tests for drop cryptography
//!
//! 1. **Round-trip**: open(seal(p, k), k) == p for all payloads
//! 2. **Authentication**: any other key, or any single flipped ciphertext or
//!    nonce bit, yields `AuthenticationFailed` and never a plaintext
//! 3. **Key encoding**: import(export(k)) == k for all keys

use deaddrop_crypto::{
    DecryptionError, EXPORTED_KEY_LEN, EncryptionKey, NONCE_SIZE, TAG_SIZE, export_key,
    import_key, open, seal,
};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_seal_open_roundtrip(
        plaintext in prop::collection::vec(any::<u8>(), 0..2048),
        key_bytes in any::<[u8; 32]>(),
        nonce in any::<[u8; NONCE_SIZE]>(),
    ) {
        let key = EncryptionKey::from_bytes(key_bytes);

        let sealed = seal(&plaintext, &key, nonce);
        prop_assert_eq!(sealed.ciphertext.len(), plaintext.len() + TAG_SIZE);

        let opened = open(&sealed.ciphertext, &sealed.nonce, &key).unwrap();
        prop_assert_eq!(opened, plaintext);
    }

    #[test]
    fn prop_other_key_fails(
        plaintext in prop::collection::vec(any::<u8>(), 0..256),
        key_bytes in any::<[u8; 32]>(),
        other_bytes in any::<[u8; 32]>(),
        nonce in any::<[u8; NONCE_SIZE]>(),
    ) {
        prop_assume!(key_bytes != other_bytes);

        let sealed = seal(&plaintext, &EncryptionKey::from_bytes(key_bytes), nonce);
        let result = open(&sealed.ciphertext, &sealed.nonce, &EncryptionKey::from_bytes(other_bytes));

        prop_assert_eq!(result, Err(DecryptionError::AuthenticationFailed));
    }

    #[test]
    fn prop_ciphertext_bit_flip_fails(
        plaintext in prop::collection::vec(any::<u8>(), 0..256),
        key_bytes in any::<[u8; 32]>(),
        nonce in any::<[u8; NONCE_SIZE]>(),
        position in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let key = EncryptionKey::from_bytes(key_bytes);
        let mut sealed = seal(&plaintext, &key, nonce);

        let idx = position.index(sealed.ciphertext.len());
        sealed.ciphertext[idx] ^= 1 << bit;

        prop_assert_eq!(
            open(&sealed.ciphertext, &sealed.nonce, &key),
            Err(DecryptionError::AuthenticationFailed)
        );
    }

    #[test]
    fn prop_nonce_bit_flip_fails(
        plaintext in prop::collection::vec(any::<u8>(), 0..256),
        key_bytes in any::<[u8; 32]>(),
        nonce in any::<[u8; NONCE_SIZE]>(),
        idx in 0usize..NONCE_SIZE,
        bit in 0u8..8,
    ) {
        let key = EncryptionKey::from_bytes(key_bytes);
        let mut sealed = seal(&plaintext, &key, nonce);

        sealed.nonce[idx] ^= 1 << bit;

        prop_assert_eq!(
            open(&sealed.ciphertext, &sealed.nonce, &key),
            Err(DecryptionError::AuthenticationFailed)
        );
    }

    #[test]
    fn prop_key_export_roundtrip(key_bytes in any::<[u8; 32]>()) {
        let key = EncryptionKey::from_bytes(key_bytes);
        let exported = export_key(&key);

        prop_assert_eq!(exported.len(), EXPORTED_KEY_LEN);
        prop_assert_eq!(import_key(&exported).unwrap(), key);
    }

    #[test]
    fn prop_key_import_never_panics(input in ".{0,128}") {
        let _ = import_key(&input);
    }
}
