//! Fuzz target for key import
//!
//! # Strategy
//!
//! - Arbitrary strings as key segments
//! - Arbitrary 32-byte keys exported then imported
//!
//! # Invariants
//!
//! - NEVER panic on malformed input
//! - Any accepted string re-exports to exactly itself (canonical encoding)
//! - Export/import of a real key is lossless

#![no_main]

use arbitrary::Arbitrary;
use deaddrop_crypto::{EXPORTED_KEY_LEN, EncryptionKey, import_key};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Input {
    Encoded(String),
    Key([u8; 32]),
}

fuzz_target!(|input: Input| {
    match input {
        Input::Encoded(encoded) => {
            if let Ok(key) = import_key(&encoded) {
                assert_eq!(encoded.len(), EXPORTED_KEY_LEN);
                assert_eq!(key.export(), encoded);
            }
        },
        Input::Key(bytes) => {
            let key = EncryptionKey::from_bytes(bytes);
            let exported = key.export();
            assert_eq!(exported.len(), EXPORTED_KEY_LEN);
            assert_eq!(import_key(&exported).expect("exported key must import"), key);
        },
    }
});
