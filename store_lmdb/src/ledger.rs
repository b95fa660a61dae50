//! LMDB implementation of VerificationLedger.

use heed::{RoTxn, RwTxn};

use ti_store::{StoreError, VerificationLedger};
use ti_types::{IdentityAddress, VerificationLevel};

use crate::{LmdbError, LmdbTrustStore};

/// Decode a stored level byte. Anything unreadable fails closed to `Unverified`.
fn decode_level(address: &str, bytes: &[u8]) -> VerificationLevel {
    match bytes {
        [code] => VerificationLevel::from_code(*code).unwrap_or_else(|_| {
            tracing::warn!(address, code, "unknown verification level code, failing closed");
            VerificationLevel::Unverified
        }),
        _ => {
            tracing::warn!(address, len = bytes.len(), "malformed ledger row, failing closed");
            VerificationLevel::Unverified
        }
    }
}

impl LmdbTrustStore {
    pub(crate) fn read_level(
        &self,
        txn: &RoTxn,
        address: &IdentityAddress,
    ) -> Result<VerificationLevel, LmdbError> {
        Ok(self
            .ledger_db
            .get(txn, address.as_str().as_bytes())?
            .map(|bytes| decode_level(address.as_str(), bytes))
            .unwrap_or_default())
    }

    pub(crate) fn write_level(
        &self,
        wtxn: &mut RwTxn,
        address: &IdentityAddress,
        level: VerificationLevel,
    ) -> Result<(), LmdbError> {
        self.ledger_db
            .put(wtxn, address.as_str().as_bytes(), &[level.code()])?;
        Ok(())
    }
}

impl VerificationLedger for LmdbTrustStore {
    fn get_level(&self, address: &IdentityAddress) -> Result<VerificationLevel, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        Ok(self.read_level(&rtxn, address)?)
    }

    fn set_level(
        &self,
        address: &IdentityAddress,
        level: VerificationLevel,
    ) -> Result<(), StoreError> {
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        self.write_level(&mut wtxn, address, level)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn delete_level(&self, address: &IdentityAddress) -> Result<(), StoreError> {
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        self.ledger_db
            .delete(&mut wtxn, address.as_str().as_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn iter_levels(&self) -> Result<Vec<(IdentityAddress, VerificationLevel)>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let mut rows = Vec::new();
        for entry in self.ledger_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (key, value) = entry.map_err(LmdbError::from)?;
            let raw = std::str::from_utf8(key)
                .map_err(|e| StoreError::Corruption(format!("ledger key is not UTF-8: {e}")))?;
            let address = IdentityAddress::new(raw)
                .map_err(|e| StoreError::Corruption(e.to_string()))?;
            let level = decode_level(raw, value);
            rows.push((address, level));
        }
        Ok(rows)
    }
}
