//! Schema versioning for the trust store.
//!
//! Version 1 is the layout described on [`LmdbTrustStore`]: bincode records keyed by
//! big-endian id, the `address ++ 0x00 ++ id` introducee index, one code byte per ledger
//! row, and the `schema_version`/`next_introduction_id` meta keys. A store opened with
//! version 0 is empty and only needs stamping.

use crate::{LmdbError, LmdbTrustStore};

/// Layout version written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

pub struct Migrator;

impl Migrator {
    /// Bring the store at `store` to [`CURRENT_SCHEMA_VERSION`], one step at a time.
    ///
    /// A store stamped by a newer build is refused rather than misread, since ledger
    /// bytes from an unknown layout could decode as a trusted level.
    pub fn run(store: &LmdbTrustStore) -> Result<(), LmdbError> {
        let found = store.schema_version()?;

        if found > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::Heed(format!(
                "trust store schema {found} was written by a newer build (supported: {CURRENT_SCHEMA_VERSION})"
            )));
        }
        if found == CURRENT_SCHEMA_VERSION {
            tracing::debug!(version = found, "trust store schema current");
            return Ok(());
        }

        for from in found..CURRENT_SCHEMA_VERSION {
            upgrade(from)?;
            tracing::info!(from, to = from + 1, "trust store schema upgraded");
        }
        store.set_schema_version(CURRENT_SCHEMA_VERSION)
    }
}

/// Upgrade the layout from version `from` to `from + 1`.
fn upgrade(from: u32) -> Result<(), LmdbError> {
    match from {
        // Empty store: the databases were just created by `open`.
        0 => Ok(()),
        _ => Err(LmdbError::Heed(format!(
            "no upgrade path from trust store schema {from}"
        ))),
    }
}
