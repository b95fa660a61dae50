//! LMDB implementation of IntroductionStore.
//!
//! Records live in `introductions` keyed by big-endian id. The `introducee_index`
//! database holds one empty-valued key per record, `address ++ 0x00 ++ id_be`, so
//! listing an introducee's records is a range scan followed by point lookups.

use std::ops::Bound;

use heed::{RoTxn, RwTxn};

use ti_store::{IntroductionStore, StoreError};
use ti_types::{IdentityAddress, IntroductionId, IntroductionRecord, IntroductionState};

use crate::environment::{index_key, index_prefix, index_upper};
use crate::{LmdbError, LmdbTrustStore};

const EMPTY: &[u8] = &[];

impl LmdbTrustStore {
    pub(crate) fn read_record(
        &self,
        txn: &RoTxn,
        id: IntroductionId,
    ) -> Result<Option<IntroductionRecord>, LmdbError> {
        match self.introductions_db.get(txn, &id.to_be_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            None => Ok(None),
        }
    }

    pub(crate) fn insert_record(
        &self,
        wtxn: &mut RwTxn,
        record: &IntroductionRecord,
    ) -> Result<IntroductionId, LmdbError> {
        let id = self.allocate_id(wtxn)?;
        let stored = record.clone().with_id(id);
        let bytes = bincode::serialize(&stored)?;
        self.introductions_db.put(wtxn, &id.to_be_bytes(), &bytes)?;
        self.introducee_index_db
            .put(wtxn, &index_key(stored.introducee.as_str(), id), EMPTY)?;
        Ok(id)
    }

    /// Overwrite a record, moving its index entry if the introducee changed.
    pub(crate) fn overwrite_record(
        &self,
        wtxn: &mut RwTxn,
        record: &IntroductionRecord,
    ) -> Result<(), LmdbError> {
        let id = record
            .id
            .ok_or(LmdbError::MissingId)?;
        let previous = self
            .read_record(wtxn, id)?
            .ok_or(LmdbError::IntroductionNotFound(id))?;
        if previous.introducee != record.introducee {
            self.introducee_index_db
                .delete(wtxn, &index_key(previous.introducee.as_str(), id))?;
            self.introducee_index_db
                .put(wtxn, &index_key(record.introducee.as_str(), id), EMPTY)?;
        }
        let bytes = bincode::serialize(record)?;
        self.introductions_db.put(wtxn, &id.to_be_bytes(), &bytes)?;
        Ok(())
    }

    pub(crate) fn write_state(
        &self,
        wtxn: &mut RwTxn,
        id: IntroductionId,
        state: IntroductionState,
    ) -> Result<(), LmdbError> {
        let mut record = self
            .read_record(wtxn, id)?
            .ok_or(LmdbError::IntroductionNotFound(id))?;
        record.state = state;
        let bytes = bincode::serialize(&record)?;
        self.introductions_db.put(wtxn, &id.to_be_bytes(), &bytes)?;
        Ok(())
    }

    fn records_for(
        &self,
        txn: &RoTxn,
        introducee: &IdentityAddress,
    ) -> Result<Vec<IntroductionRecord>, LmdbError> {
        let lower = index_prefix(introducee.as_str());
        let upper = index_upper(introducee.as_str());
        let bounds = (
            Bound::Included(lower.as_slice()),
            Bound::Excluded(upper.as_slice()),
        );

        let mut ids = Vec::new();
        for entry in self.introducee_index_db.range(txn, &bounds)? {
            let (key, _) = entry?;
            let id_bytes: [u8; 8] = key[key.len().saturating_sub(8)..]
                .try_into()
                .map_err(|_| LmdbError::Serialization("short introducee index key".into()))?;
            ids.push(IntroductionId::from_be_bytes(id_bytes));
        }

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            match self.read_record(txn, id)? {
                Some(record) => records.push(record),
                None => tracing::warn!(id = %id, "introducee index points at a missing record"),
            }
        }
        Ok(records)
    }
}

impl IntroductionStore for LmdbTrustStore {
    fn create_introduction(
        &self,
        record: &IntroductionRecord,
    ) -> Result<IntroductionId, StoreError> {
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        let id = self.insert_record(&mut wtxn, record)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(id)
    }

    fn get_introduction(
        &self,
        id: IntroductionId,
    ) -> Result<Option<IntroductionRecord>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        Ok(self.read_record(&rtxn, id)?)
    }

    fn put_introduction(&self, record: &IntroductionRecord) -> Result<(), StoreError> {
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        self.overwrite_record(&mut wtxn, record)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn set_introduction_state(
        &self,
        id: IntroductionId,
        state: IntroductionState,
    ) -> Result<(), StoreError> {
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        self.write_state(&mut wtxn, id, state)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn delete_introduction(&self, id: IntroductionId) -> Result<bool, StoreError> {
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        let Some(record) = self.read_record(&wtxn, id)? else {
            return Ok(false);
        };
        self.introducee_index_db
            .delete(&mut wtxn, &index_key(record.introducee.as_str(), id))
            .map_err(LmdbError::from)?;
        self.introductions_db
            .delete(&mut wtxn, &id.to_be_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(true)
    }

    fn introductions_for(
        &self,
        introducee: &IdentityAddress,
    ) -> Result<Vec<IntroductionRecord>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        Ok(self.records_for(&rtxn, introducee)?)
    }

    fn iter_introductions(&self) -> Result<Vec<IntroductionRecord>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let mut records = Vec::new();
        for entry in self.introductions_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_, bytes) = entry.map_err(LmdbError::from)?;
            records.push(bincode::deserialize(bytes).map_err(LmdbError::from)?);
        }
        Ok(records)
    }
}
