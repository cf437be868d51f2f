//! Deaddrop Node
//!
//! Production glue for the drop protocol: the OS-backed [`SystemEnv`], the
//! durable [`RedbStore`], and the `deaddrop` command-line binary.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod storage;
pub mod system_env;

use std::path::Path;

use deaddrop_core::{DeadDrop, DropConfig, StoreError};
pub use storage::RedbStore;
pub use system_env::SystemEnv;

/// Drop runtime backed by the OS RNG and a redb database.
pub type NodeDeadDrop = DeadDrop<SystemEnv, RedbStore>;

/// Open (or create) the database at `path` and build a runtime over it.
///
/// # Errors
///
/// Returns `StoreError::Io` if the database cannot be opened.
pub fn open_node(path: impl AsRef<Path>, config: DropConfig) -> Result<NodeDeadDrop, StoreError> {
    let store = RedbStore::open(path)?;
    Ok(DeadDrop::new(SystemEnv::new(), store, config))
}
