//! LMDB storage backend for trusted introductions.
//!
//! Implements all storage traits from `ti-store` using the `heed` LMDB bindings.
//! Each logical table maps to one LMDB database within a single environment, so a
//! [`ti_store::TrustBatch`] commits in one LMDB write transaction.

pub mod environment;
pub mod error;
pub mod introduction;
pub mod ledger;
pub mod meta;
pub mod migration;
pub mod write_batch;

pub use environment::LmdbTrustStore;
pub use error::LmdbError;
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
