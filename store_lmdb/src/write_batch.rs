//! Atomic batch commit: every operation of a [`TrustBatch`] is applied inside a single
//! LMDB write transaction.
//!
//! If any operation fails the transaction is dropped without calling `commit`, which
//! aborts it, so neither the record changes nor the ledger changes become visible.

use ti_store::{BatchOp, StoreError, TrustBatch, TrustStore};
use ti_types::IntroductionId;

use crate::{LmdbError, LmdbTrustStore};

impl TrustStore for LmdbTrustStore {
    fn commit(&self, batch: TrustBatch) -> Result<Vec<IntroductionId>, StoreError> {
        let op_count = batch.len();
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        let mut created = Vec::new();

        for op in batch {
            match op {
                BatchOp::CreateIntroduction(record) => {
                    created.push(self.insert_record(&mut wtxn, &record)?);
                }
                BatchOp::PutIntroduction(record) => {
                    self.overwrite_record(&mut wtxn, &record)?;
                }
                BatchOp::SetIntroductionState { id, state } => {
                    self.write_state(&mut wtxn, id, state)?;
                }
                BatchOp::SetLevel { address, level } => {
                    self.write_level(&mut wtxn, &address, level)?;
                }
            }
        }

        wtxn.commit().map_err(LmdbError::from)?;
        tracing::debug!(ops = op_count, created = created.len(), "committed trust batch");
        Ok(created)
    }
}
