//! Fuzz target for reference parsing
//!
//! References arrive from untrusted users (pasted links, chat messages).
//!
//! # Strategy
//!
//! - Raw strings: arbitrary UTF-8 fed to both `parse_reference` and `FromStr`
//! - Structured: base, id and key segments assembled from fuzzer input so
//!   delimiters, query strings and schemes land in odd places
//!
//! # Invariants
//!
//! - NEVER panic on malformed input
//! - A parsed id only contains `[A-Za-z0-9_-]` and is non-empty
//! - A successfully parsed `Reference` re-renders to a string that parses
//!   back to the same id and key
//! - `request_path()` never contains the key delimiter

#![no_main]

use arbitrary::Arbitrary;
use deaddrop_core::{Reference, parse_reference, reference::KEY_DELIMITER};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Input {
    Raw(String),
    Structured { base: String, id: String, key: String, query: Option<String> },
}

fuzz_target!(|input: Input| {
    let raw = match input {
        Input::Raw(raw) => raw,
        Input::Structured { base, id, key, query } => match query {
            Some(query) => format!("{base}{id}?{query}#{key}"),
            None => format!("{base}{id}#{key}"),
        },
    };

    if let Ok((id, _key)) = parse_reference(&raw) {
        assert!(!id.as_str().is_empty());
        assert!(id.as_str().bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
    }

    if let Ok(reference) = raw.parse::<Reference>() {
        assert!(!reference.request_path().contains(KEY_DELIMITER));

        let reparsed: Reference = reference.to_string().parse().expect("rendered reference must parse");
        assert_eq!(reparsed.drop_id(), reference.drop_id());
        assert_eq!(reparsed.key(), reference.key());
    }
});
