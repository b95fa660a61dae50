//! Schema version and id counter kept in the `meta` database.

use heed::RwTxn;

use ti_types::IntroductionId;

use crate::{LmdbError, LmdbTrustStore};

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";
const NEXT_INTRODUCTION_ID_KEY: &[u8] = b"next_introduction_id";

impl LmdbTrustStore {
    /// Stored schema version; `0` for a fresh database.
    pub fn schema_version(&self) -> Result<u32, LmdbError> {
        let rtxn = self.env().read_txn()?;
        match self.meta_db.get(&rtxn, SCHEMA_VERSION_KEY)? {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                    LmdbError::Serialization("schema_version has unexpected byte length".into())
                })?;
                Ok(u32::from_le_bytes(arr))
            }
            None => Ok(0),
        }
    }

    pub fn set_schema_version(&self, version: u32) -> Result<(), LmdbError> {
        let mut wtxn = self.env().write_txn()?;
        self.meta_db
            .put(&mut wtxn, SCHEMA_VERSION_KEY, &version.to_le_bytes())?;
        wtxn.commit()?;
        Ok(())
    }

    /// Hand out the next record id inside an open write transaction.
    ///
    /// Ids start at 1 and are never reused, even after deletes.
    pub(crate) fn allocate_id(&self, wtxn: &mut RwTxn) -> Result<IntroductionId, LmdbError> {
        let next = match self.meta_db.get(wtxn, NEXT_INTRODUCTION_ID_KEY)? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes.try_into().map_err(|_| {
                    LmdbError::Serialization(
                        "next_introduction_id has unexpected byte length".into(),
                    )
                })?;
                u64::from_be_bytes(arr)
            }
            None => 1,
        };
        let following = next
            .checked_add(1)
            .ok_or_else(|| LmdbError::Heed("introduction id space exhausted".into()))?;
        self.meta_db
            .put(wtxn, NEXT_INTRODUCTION_ID_KEY, &following.to_be_bytes())?;
        Ok(IntroductionId::new(next))
    }
}
