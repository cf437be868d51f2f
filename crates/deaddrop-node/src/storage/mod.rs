//! Durable drop store backends.
//!
//! `MemoryStore` and `ChaoticStore` live in `deaddrop-core`; this module adds
//! the on-disk backend used by the CLI.

mod redb;

pub use self::redb::RedbStore;
