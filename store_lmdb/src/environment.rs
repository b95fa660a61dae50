//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::migration::Migrator;
use crate::LmdbError;

/// Named databases inside the environment.
const INTRODUCTIONS_DB: &str = "introductions";
const INTRODUCEE_INDEX_DB: &str = "introducee_index";
const LEDGER_DB: &str = "verification_ledger";
const META_DB: &str = "meta";

const MAX_DBS: u32 = 4;

/// Wraps the LMDB environment and all database handles.
///
/// Layout:
/// - `introductions`: `id_be` -> bincode([`ti_types::IntroductionRecord`])
/// - `introducee_index`: `address ++ 0x00 ++ id_be` -> empty
/// - `verification_ledger`: `address` -> one level code byte
/// - `meta`: schema version and the id counter
#[derive(Clone)]
pub struct LmdbTrustStore {
    pub(crate) env: Arc<Env>,
    pub(crate) introductions_db: Database<Bytes, Bytes>,
    pub(crate) introducee_index_db: Database<Bytes, Bytes>,
    pub(crate) ledger_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbTrustStore {
    /// Open or create an environment at `path` and bring its schema up to date.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path).map_err(|e| LmdbError::Io(e.to_string()))?;

        // SAFETY: the environment is opened once per process for this path and the
        // memory map is only accessed through heed.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let introductions_db = env.create_database(&mut wtxn, Some(INTRODUCTIONS_DB))?;
        let introducee_index_db = env.create_database(&mut wtxn, Some(INTRODUCEE_INDEX_DB))?;
        let ledger_db = env.create_database(&mut wtxn, Some(LEDGER_DB))?;
        let meta_db = env.create_database(&mut wtxn, Some(META_DB))?;
        wtxn.commit()?;

        let store = Self {
            env: Arc::new(env),
            introductions_db,
            introducee_index_db,
            ledger_db,
            meta_db,
        };
        Migrator::run(&store)?;

        tracing::info!(path = %path.display(), map_size, "opened trust store");
        Ok(store)
    }

    pub(crate) fn env(&self) -> &Env {
        &self.env
    }
}

/// Index key for one record: `address ++ 0x00 ++ id_be`.
///
/// Addresses never contain control characters, so the separator keeps `bob` and
/// `bobby` in disjoint key ranges.
pub(crate) fn index_key(address: &str, id: ti_types::IntroductionId) -> Vec<u8> {
    let mut key = index_prefix(address);
    key.extend_from_slice(&id.to_be_bytes());
    key
}

/// Inclusive lower bound of an address's index range.
pub(crate) fn index_prefix(address: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(address.len() + 9);
    key.extend_from_slice(address.as_bytes());
    key.push(0x00);
    key
}

/// Exclusive upper bound of an address's index range.
pub(crate) fn index_upper(address: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(address.len() + 1);
    key.extend_from_slice(address.as_bytes());
    key.push(0x01);
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use ti_types::IntroductionId;

    #[test]
    fn index_ranges_do_not_overlap_for_prefix_addresses() {
        let bob = index_key("bob", IntroductionId::new(u64::MAX));
        let bobby = index_key("bobby", IntroductionId::new(0));
        assert!(bob.as_slice() < index_upper("bob").as_slice());
        assert!(bobby.as_slice() >= index_upper("bob").as_slice());
    }

    #[test]
    fn open_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("db");
        LmdbTrustStore::open(&path, 10 * 1024 * 1024).unwrap();
        assert!(path.exists());
    }
}
