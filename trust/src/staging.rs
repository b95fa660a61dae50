//! Staged changes over a [`TrustStore`].
//!
//! A single service operation may move several records and recompute the ledger more
//! than once. `StagedChanges` collects those writes into one [`TrustBatch`] while
//! answering evidence queries as if they had already been applied, so the engine sees
//! a consistent picture and the store commits all of it or none of it.

use std::collections::HashMap;

use ti_store::{StoreError, TrustBatch, TrustStore};
use ti_types::{
    IdentityAddress, IntroductionId, IntroductionRecord, IntroductionState, VerificationLevel,
};

use crate::engine::{EvidenceLookup, TransitionEngine};
use crate::error::TrustError;

/// One ledger move recorded while staging.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelChange {
    pub address: IdentityAddress,
    pub from: VerificationLevel,
    pub to: VerificationLevel,
}

pub struct StagedChanges<'a, S: TrustStore + ?Sized> {
    store: &'a S,
    states: HashMap<IntroductionId, IntroductionState>,
    created: Vec<IntroductionRecord>,
    levels: HashMap<IdentityAddress, VerificationLevel>,
    changes: Vec<LevelChange>,
    batch: TrustBatch,
}

impl<'a, S: TrustStore + ?Sized> StagedChanges<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            states: HashMap::new(),
            created: Vec::new(),
            levels: HashMap::new(),
            changes: Vec::new(),
            batch: TrustBatch::new(),
        }
    }

    /// The level of `address` with staged writes applied.
    pub fn level(&self, address: &IdentityAddress) -> Result<VerificationLevel, StoreError> {
        match self.levels.get(address) {
            Some(level) => Ok(*level),
            None => self.store.get_level(address),
        }
    }

    pub fn set_state(&mut self, id: IntroductionId, state: IntroductionState) {
        self.states.insert(id, state);
        self.batch.set_introduction_state(id, state);
    }

    /// Stage a full overwrite of a persisted record.
    pub fn put(&mut self, record: IntroductionRecord) -> Result<(), StoreError> {
        let id = record.id.ok_or(StoreError::MissingId)?;
        self.states.insert(id, record.state);
        self.batch.put_introduction(record);
        Ok(())
    }

    pub fn create(&mut self, record: IntroductionRecord) {
        self.created.push(record.clone());
        self.batch.create_introduction(record);
    }

    pub fn set_level(
        &mut self,
        address: &IdentityAddress,
        level: VerificationLevel,
    ) -> Result<(), StoreError> {
        let previous = self.level(address)?;
        if previous != level {
            self.changes.push(LevelChange {
                address: address.clone(),
                from: previous,
                to: level,
            });
        }
        self.levels.insert(address.clone(), level);
        self.batch.set_level(address.clone(), level);
        Ok(())
    }

    /// Run the engine for a record of `introducee` that has just been staged into
    /// `new_state`, and stage the resulting level.
    pub fn apply_introduction_transition(
        &mut self,
        introducee: &IdentityAddress,
        new_state: IntroductionState,
    ) -> Result<VerificationLevel, TrustError> {
        let previous = self.level(introducee)?;
        let next = TransitionEngine.next_level(&*self, introducee, previous, new_state)?;
        self.set_level(introducee, next)?;
        Ok(next)
    }

    /// Commit every staged write at once. Returns the ids of created records in
    /// staging order, and the level moves that became visible.
    pub fn commit(self) -> Result<(Vec<IntroductionId>, Vec<LevelChange>), StoreError> {
        if self.batch.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }
        let created = self.store.commit(self.batch)?;
        Ok((created, self.changes))
    }
}

impl<'a, S: TrustStore + ?Sized> EvidenceLookup for StagedChanges<'a, S> {
    fn exists_with_state(
        &self,
        introducee: &IdentityAddress,
        state: IntroductionState,
    ) -> Result<bool, StoreError> {
        if self
            .created
            .iter()
            .any(|r| &r.introducee == introducee && r.state == state)
        {
            return Ok(true);
        }
        Ok(self.store.introductions_for(introducee)?.iter().any(|r| {
            let current = r
                .id
                .and_then(|id| self.states.get(&id).copied())
                .unwrap_or(r.state);
            current == state
        }))
    }
}
