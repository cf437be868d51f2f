//! Out-of-band reference codec.
//!
//! A reference bundles the store identifier and the drop key into one
//! shareable string:
//!
//! ```text
//! https://drop.example/d/0000000000000000000000000000002a#q83vASNFZ4mrze8BI0VniavN7wEjRWeJq83vASNFZ4k
//! └──────── base ───────┘└──────────── drop id ─────────┘ └────────────── exported key ──────────────┘
//! ```
//!
//! The key sits in the URL fragment. User agents never send the fragment in
//! a request, so a transport that fetches [`Reference::request_path`] cannot
//! leak the key to the store. This is a transport convention, not something
//! this layer can enforce; the contract tests in `tests/key_isolation.rs`
//! guard against regressions on the store path.
//!
//! The base must let the id be recovered as the last path segment: empty, or
//! ending in `/` with no `?`, `#` or whitespace. [`check_base`] enforces this
//! and every constructor goes through it.

use std::{fmt, str::FromStr};

use deaddrop_crypto::{EncryptionKey, import_key};
use zeroize::Zeroizing;

use crate::{drop_id::DropId, error::ReferenceError};

/// Delimiter between the locator and the key segment.
pub const KEY_DELIMITER: char = '#';

/// Stand-ins used by [`check_base`] to parse a reference built on a base.
const SAMPLE_ID: &str = "0";
const SAMPLE_KEY: &str = "k";

/// Bearer credential for a single drop.
///
/// Anyone holding it can burn and read the drop. Single use is by
/// convention: the store forgets the record after the first successful read.
#[derive(Clone, PartialEq, Eq)]
pub struct Reference {
    base: String,
    drop_id: DropId,
    key: EncryptionKey,
}

impl Reference {
    /// Bundle a store-assigned id and the drop key under a location prefix.
    ///
    /// # Errors
    ///
    /// `InvalidBase` if the rendered reference would not parse back to the
    /// same base and id.
    pub fn new(
        base: impl Into<String>,
        drop_id: DropId,
        key: EncryptionKey,
    ) -> Result<Self, ReferenceError> {
        let base = base.into();
        check_base(&base)?;

        Ok(Self { base, drop_id, key })
    }

    /// Location prefix preceding the id (may be empty).
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Store identifier.
    pub fn drop_id(&self) -> &DropId {
        &self.drop_id
    }

    /// Drop key.
    pub fn key(&self) -> &EncryptionKey {
        &self.key
    }

    /// The part of the reference a transport may send to the store.
    ///
    /// Never contains the key segment.
    pub fn request_path(&self) -> String {
        format!("{}{}", self.base, self.drop_id)
    }

    /// Split into id and key.
    pub fn into_parts(self) -> (DropId, EncryptionKey) {
        (self.drop_id, self.key)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}{}", self.base, self.drop_id, KEY_DELIMITER, self.key.export())
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reference")
            .field("base", &self.base)
            .field("drop_id", &self.drop_id)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl FromStr for Reference {
    type Err = ReferenceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let parsed = split(raw)?;
        let key = import_key(&parsed.key)?;

        Ok(Self { base: parsed.base.to_string(), drop_id: parsed.drop_id, key })
    }
}

/// Build the shareable reference for a stored drop.
///
/// # Errors
///
/// `InvalidBase` as for [`Reference::new`].
pub fn build_reference(
    base: &str,
    drop_id: DropId,
    key: EncryptionKey,
) -> Result<Reference, ReferenceError> {
    Reference::new(base, drop_id, key)
}

/// Check that references built on `base` parse back to `base` and their id.
///
/// Accepts the empty base and bases ending in `/` whose final segment
/// boundary survives parsing. Rejects a missing trailing `/` (the id would
/// merge into the previous segment), a `?` (the id would be cut as a query)
/// and a `#` (the id would land in the key segment).
///
/// # Errors
///
/// `InvalidBase` if the base does not round-trip.
pub fn check_base(base: &str) -> Result<(), ReferenceError> {
    if !(base.is_empty() || base.ends_with('/')) || base.chars().any(char::is_whitespace) {
        return Err(ReferenceError::InvalidBase);
    }

    let sample = format!("{base}{SAMPLE_ID}{KEY_DELIMITER}{SAMPLE_KEY}");
    let roundtrips = split(&sample)
        .is_ok_and(|parsed| parsed.base == base && parsed.drop_id.as_str() == SAMPLE_ID);

    if roundtrips { Ok(()) } else { Err(ReferenceError::InvalidBase) }
}

/// Split a raw reference into its id and (still encoded) key segment.
///
/// Surrounding whitespace is ignored. The id is the last path segment of the
/// locator, with any query string removed; for `scheme://authority/...`
/// locators the authority is never taken as an id.
///
/// # Errors
///
/// Checked in order:
/// - `MissingId`: no identifier segment
/// - `InvalidId`: identifier has characters outside `[A-Za-z0-9_-]`
/// - `MissingKey`: no `#`, or nothing after it
pub fn parse_reference(raw: &str) -> Result<(DropId, Zeroizing<String>), ReferenceError> {
    let parsed = split(raw)?;
    Ok((parsed.drop_id, parsed.key))
}

struct Parsed<'a> {
    /// Locator prefix preceding the id
    base: &'a str,
    drop_id: DropId,
    key: Zeroizing<String>,
}

fn split(raw: &str) -> Result<Parsed<'_>, ReferenceError> {
    let raw = raw.trim();

    let (locator, fragment) = match raw.split_once(KEY_DELIMITER) {
        Some((locator, fragment)) => (locator, Some(fragment)),
        None => (raw, None),
    };

    let locator = locator.split_once('?').map_or(locator, |(path, _)| path);

    let path = match locator.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map_or("", |(_, path)| path),
        None => locator,
    };

    let id = path.rsplit('/').next().unwrap_or_default();
    let drop_id = DropId::parse(id)?;

    let key = match fragment.map(str::trim) {
        Some(key) if !key.is_empty() => Zeroizing::new(key.to_string()),
        _ => return Err(ReferenceError::MissingKey),
    };

    let base = &locator[..locator.len() - drop_id.as_str().len()];

    Ok(Parsed { base, drop_id, key })
}

#[cfg(test)]
mod tests {
    use deaddrop_crypto::{FormatError, KEY_SIZE};

    use super::*;

    const BASE: &str = "https://drop.example/d/";

    fn test_key() -> EncryptionKey {
        EncryptionKey::from_bytes([0x5A; KEY_SIZE])
    }

    fn test_id() -> DropId {
        DropId::parse("0000000000000000000000000000002a").unwrap()
    }

    #[test]
    fn display_places_key_in_fragment() {
        let reference = build_reference(BASE, test_id(), test_key()).unwrap();
        let rendered = reference.to_string();

        assert_eq!(
            rendered,
            format!("{BASE}0000000000000000000000000000002a#{}", test_key().export())
        );
    }

    #[test]
    fn parse_roundtrip() {
        let reference = build_reference(BASE, test_id(), test_key()).unwrap();

        let (id, key) = parse_reference(&reference.to_string()).unwrap();

        assert_eq!(id, test_id());
        assert_eq!(key.as_str(), test_key().export());
    }

    #[test]
    fn from_str_roundtrip() {
        let reference = build_reference(BASE, test_id(), test_key()).unwrap();
        let parsed: Reference = reference.to_string().parse().unwrap();

        assert_eq!(parsed, reference);
        assert_eq!(parsed.base(), BASE);
    }

    #[test]
    fn bare_reference_without_base() {
        let reference = build_reference("", test_id(), test_key()).unwrap();
        let parsed: Reference = reference.to_string().parse().unwrap();

        assert_eq!(parsed.base(), "");
        assert_eq!(parsed.drop_id(), &test_id());
    }

    #[test]
    fn request_path_never_contains_key() {
        let reference = build_reference(BASE, test_id(), test_key()).unwrap();
        let path = reference.request_path();

        assert_eq!(path, format!("{BASE}0000000000000000000000000000002a"));
        assert!(!path.contains(KEY_DELIMITER));
        assert!(!path.contains(&test_key().export()));
    }

    #[test]
    fn missing_key_segment() {
        assert_eq!(
            parse_reference("https://drop.example/d/abc").unwrap_err(),
            ReferenceError::MissingKey
        );
        assert_eq!(
            parse_reference("https://drop.example/d/abc#").unwrap_err(),
            ReferenceError::MissingKey
        );
        assert_eq!(parse_reference("abc#   ").unwrap_err(), ReferenceError::MissingKey);
    }

    #[test]
    fn missing_id_segment() {
        assert_eq!(
            parse_reference("https://drop.example/d/#somekey").unwrap_err(),
            ReferenceError::MissingId
        );
        assert_eq!(
            parse_reference("https://drop.example#somekey").unwrap_err(),
            ReferenceError::MissingId
        );
        assert_eq!(parse_reference("#somekey").unwrap_err(), ReferenceError::MissingId);
        assert_eq!(parse_reference("").unwrap_err(), ReferenceError::MissingId);
    }

    #[test]
    fn query_string_is_not_part_of_id() {
        let raw = format!("{BASE}abc?utm=1#{}", test_key().export());
        let (id, _) = parse_reference(&raw).unwrap();
        assert_eq!(id.as_str(), "abc");
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let raw = format!("  {BASE}abc#{}\n", test_key().export());
        let parsed: Reference = raw.parse().unwrap();
        assert_eq!(parsed.drop_id().as_str(), "abc");
        assert_eq!(parsed.key(), &test_key());
    }

    #[test]
    fn invalid_id_characters() {
        assert_eq!(parse_reference("https://h/d/a%20b#key").unwrap_err(), ReferenceError::InvalidId);
    }

    #[test]
    fn malformed_key_is_rejected_on_import() {
        let err = "https://drop.example/d/abc#tooshort".parse::<Reference>().unwrap_err();
        assert!(matches!(
            err,
            ReferenceError::MalformedKey(FormatError::InvalidLength { expected: 32, .. })
        ));

        let err = "https://drop.example/d/abc#!!!".parse::<Reference>().unwrap_err();
        assert_eq!(err, ReferenceError::MalformedKey(FormatError::InvalidEncoding));
    }

    #[test]
    fn accepts_slash_terminated_bases() {
        for base in ["", "/", "/d/", "d/", BASE, "https://drop.example/", "drop.example/d/"] {
            assert_eq!(check_base(base), Ok(()), "{base:?}");

            let reference = build_reference(base, test_id(), test_key()).unwrap();
            let parsed: Reference = reference.to_string().parse().unwrap();
            assert_eq!(parsed, reference, "{base:?}");
        }
    }

    #[test]
    fn rejects_bases_that_hide_the_id() {
        for base in [
            "https://drop.example/d",
            "https://drop.example/open?id=",
            "https://drop.example/open?x=/",
            "https://app.example/#/d/",
            "drop-",
            "https://",
            "https://drop.example",
            " /d/",
            "/d /",
        ] {
            assert_eq!(check_base(base), Err(ReferenceError::InvalidBase), "{base:?}");
            assert_eq!(
                build_reference(base, test_id(), test_key()).unwrap_err(),
                ReferenceError::InvalidBase,
                "{base:?}"
            );
        }
    }

    #[test]
    fn debug_redacts_key() {
        let reference = build_reference(BASE, test_id(), test_key()).unwrap();
        let debug = format!("{reference:?}");

        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains(&test_key().export()));
    }
}
