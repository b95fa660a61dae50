//! Nullable store — thread-safe in-memory storage for testing.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use ti_store::{BatchOp, IntroductionStore, StoreError, TrustBatch, TrustStore, VerificationLedger};
use ti_types::{IdentityAddress, IntroductionId, IntroductionRecord, IntroductionState, VerificationLevel};

#[derive(Clone, Default)]
struct Tables {
    next_id: u64,
    introductions: BTreeMap<IntroductionId, IntroductionRecord>,
    levels: HashMap<IdentityAddress, VerificationLevel>,
}

impl Tables {
    fn create(&mut self, record: &IntroductionRecord) -> IntroductionId {
        self.next_id += 1;
        let id = IntroductionId::new(self.next_id);
        self.introductions
            .insert(id, record.clone().with_id(id));
        id
    }

    fn put(&mut self, record: &IntroductionRecord) -> Result<(), StoreError> {
        let id = record
            .id
            .ok_or(StoreError::MissingId)?;
        match self.introductions.get_mut(&id) {
            Some(slot) => {
                *slot = record.clone();
                Ok(())
            }
            None => Err(StoreError::IntroductionNotFound(id)),
        }
    }

    fn set_state(&mut self, id: IntroductionId, state: IntroductionState) -> Result<(), StoreError> {
        match self.introductions.get_mut(&id) {
            Some(record) => {
                record.state = state;
                Ok(())
            }
            None => Err(StoreError::IntroductionNotFound(id)),
        }
    }
}

/// An in-memory introduction store and verification ledger.
///
/// Both tables sit behind a single mutex, so a commit is trivially atomic: it is applied
/// to a scratch copy and swapped in only if every operation succeeded.
pub struct NullTrustStore {
    tables: Mutex<Tables>,
    fail_next_commit: AtomicBool,
}

impl NullTrustStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            fail_next_commit: AtomicBool::new(false),
        }
    }

    /// Make the next [`TrustStore::commit`] fail with a backend error without writing.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for NullTrustStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IntroductionStore for NullTrustStore {
    fn create_introduction(
        &self,
        record: &IntroductionRecord,
    ) -> Result<IntroductionId, StoreError> {
        Ok(self.tables().create(record))
    }

    fn get_introduction(
        &self,
        id: IntroductionId,
    ) -> Result<Option<IntroductionRecord>, StoreError> {
        Ok(self.tables().introductions.get(&id).cloned())
    }

    fn put_introduction(&self, record: &IntroductionRecord) -> Result<(), StoreError> {
        self.tables().put(record)
    }

    fn set_introduction_state(
        &self,
        id: IntroductionId,
        state: IntroductionState,
    ) -> Result<(), StoreError> {
        self.tables().set_state(id, state)
    }

    fn delete_introduction(&self, id: IntroductionId) -> Result<bool, StoreError> {
        Ok(self.tables().introductions.remove(&id).is_some())
    }

    fn introductions_for(
        &self,
        introducee: &IdentityAddress,
    ) -> Result<Vec<IntroductionRecord>, StoreError> {
        Ok(self
            .tables()
            .introductions
            .values()
            .filter(|r| &r.introducee == introducee)
            .cloned()
            .collect())
    }

    fn iter_introductions(&self) -> Result<Vec<IntroductionRecord>, StoreError> {
        Ok(self.tables().introductions.values().cloned().collect())
    }
}

impl VerificationLedger for NullTrustStore {
    fn get_level(&self, address: &IdentityAddress) -> Result<VerificationLevel, StoreError> {
        Ok(self
            .tables()
            .levels
            .get(address)
            .copied()
            .unwrap_or_default())
    }

    fn set_level(
        &self,
        address: &IdentityAddress,
        level: VerificationLevel,
    ) -> Result<(), StoreError> {
        self.tables().levels.insert(address.clone(), level);
        Ok(())
    }

    fn delete_level(&self, address: &IdentityAddress) -> Result<(), StoreError> {
        self.tables().levels.remove(address);
        Ok(())
    }

    fn iter_levels(&self) -> Result<Vec<(IdentityAddress, VerificationLevel)>, StoreError> {
        let mut rows: Vec<_> = self
            .tables()
            .levels
            .iter()
            .map(|(a, l)| (a.clone(), *l))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(rows)
    }
}

impl TrustStore for NullTrustStore {
    fn commit(&self, batch: TrustBatch) -> Result<Vec<IntroductionId>, StoreError> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("injected commit failure".into()));
        }

        let mut guard = self.tables();
        let mut scratch = guard.clone();
        let mut created = Vec::new();
        for op in batch {
            match op {
                BatchOp::CreateIntroduction(record) => created.push(scratch.create(&record)),
                BatchOp::PutIntroduction(record) => scratch.put(&record)?,
                BatchOp::SetIntroductionState { id, state } => scratch.set_state(id, state)?,
                BatchOp::SetLevel { address, level } => {
                    scratch.levels.insert(address, level);
                }
            }
        }
        *guard = scratch;
        Ok(created)
    }
}
