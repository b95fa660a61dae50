//! Introduction record storage trait.

use crate::StoreError;
use ti_types::{IdentityAddress, IntroductionId, IntroductionRecord, IntroductionState};

/// Keyed storage of introduction records.
///
/// No transition logic lives here. Single-record writes are atomic; anything that must
/// change together with the ledger goes through [`crate::TrustStore::commit`].
pub trait IntroductionStore {
    /// Persist a new record and assign it an id. Any id already on `record` is ignored.
    fn create_introduction(&self, record: &IntroductionRecord)
        -> Result<IntroductionId, StoreError>;

    fn get_introduction(&self, id: IntroductionId)
        -> Result<Option<IntroductionRecord>, StoreError>;

    /// Overwrite an existing record. The record must carry an id that already exists.
    fn put_introduction(&self, record: &IntroductionRecord) -> Result<(), StoreError>;

    /// Change only the state of an existing record.
    fn set_introduction_state(
        &self,
        id: IntroductionId,
        state: IntroductionState,
    ) -> Result<(), StoreError>;

    /// Remove a record. Returns whether it existed.
    fn delete_introduction(&self, id: IntroductionId) -> Result<bool, StoreError>;

    /// Every record (live or stale) about `introducee`.
    fn introductions_for(
        &self,
        introducee: &IdentityAddress,
    ) -> Result<Vec<IntroductionRecord>, StoreError>;

    /// Every stored record.
    fn iter_introductions(&self) -> Result<Vec<IntroductionRecord>, StoreError>;

    /// Whether at least one record about `introducee` is currently in `state`.
    fn exists_with_state(
        &self,
        introducee: &IdentityAddress,
        state: IntroductionState,
    ) -> Result<bool, StoreError> {
        Ok(self
            .introductions_for(introducee)?
            .iter()
            .any(|r| r.state == state))
    }

    /// Live (non-stale) records about `introducee`.
    fn live_introductions_for(
        &self,
        introducee: &IdentityAddress,
    ) -> Result<Vec<IntroductionRecord>, StoreError> {
        let mut records = self.introductions_for(introducee)?;
        records.retain(|r| r.state.is_live());
        Ok(records)
    }
}
