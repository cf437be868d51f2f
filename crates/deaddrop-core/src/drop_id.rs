//! Opaque drop identifier assigned by the store.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ReferenceError;

/// Maximum identifier length accepted from a reference.
pub const MAX_DROP_ID_LEN: usize = 128;

/// Store-assigned identifier of a drop record.
///
/// Restricted to `[A-Za-z0-9_-]` so it can sit in a URL path segment without
/// escaping and can never contain the `#` that starts the key segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DropId(String);

impl DropId {
    /// Validate an identifier taken from a reference or a store.
    ///
    /// # Errors
    ///
    /// - `MissingId` if `raw` is empty
    /// - `InvalidId` if `raw` is too long or contains characters outside
    ///   `[A-Za-z0-9_-]`
    pub fn parse(raw: &str) -> Result<Self, ReferenceError> {
        if raw.is_empty() {
            return Err(ReferenceError::MissingId);
        }

        let valid = raw.len() <= MAX_DROP_ID_LEN
            && raw.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');

        if !valid {
            return Err(ReferenceError::InvalidId);
        }

        Ok(Self(raw.to_string()))
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Fixed-width lowercase hex rendering, used by stores that draw ids from
/// random or sequential 128-bit values.
impl From<u128> for DropId {
    fn from(value: u128) -> Self {
        Self(format!("{value:032x}"))
    }
}

impl fmt::Display for DropId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
