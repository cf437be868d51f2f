//! Drop runtime configuration.

use std::time::Duration;

use crate::{error::ReferenceError, reference::check_base};

/// Bound applied to every store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest payload accepted by `create_drop` unless configured otherwise.
pub const DEFAULT_MAX_PAYLOAD_LEN: usize = 64 * 1024;

/// Configuration for [`DeadDrop`](crate::DeadDrop).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropConfig {
    /// Timeout for each store insert, fetch, take or delete
    pub store_timeout: Duration,
    /// Prefix placed before the drop id in generated references.
    ///
    /// Empty, or ending in `/` with no `?`, `#` or whitespace.
    pub reference_base: String,
    /// Reject larger payloads before generating a key (`None` = unlimited)
    pub max_payload_len: Option<usize>,
}

impl Default for DropConfig {
    fn default() -> Self {
        Self {
            store_timeout: DEFAULT_STORE_TIMEOUT,
            reference_base: String::new(),
            max_payload_len: Some(DEFAULT_MAX_PAYLOAD_LEN),
        }
    }
}

impl DropConfig {
    /// Check that the configuration can produce references that parse back.
    ///
    /// # Errors
    ///
    /// `InvalidBase` if `reference_base` would hide the drop id.
    pub fn validate(&self) -> Result<(), ReferenceError> {
        check_base(&self.reference_base)
    }
}
