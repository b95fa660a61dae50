//! Atomic groups of record and ledger writes.

use ti_types::{IdentityAddress, IntroductionId, IntroductionRecord, IntroductionState, VerificationLevel};

/// One write inside a [`TrustBatch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOp {
    /// Insert a new record; the backend assigns the id.
    CreateIntroduction(IntroductionRecord),
    /// Overwrite an existing record (must carry its id).
    PutIntroduction(IntroductionRecord),
    SetIntroductionState {
        id: IntroductionId,
        state: IntroductionState,
    },
    SetLevel {
        address: IdentityAddress,
        level: VerificationLevel,
    },
}

/// Writes that must land together or not at all.
///
/// Operations are applied in insertion order, so a later `SetLevel` for the same
/// address wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrustBatch {
    ops: Vec<BatchOp>,
}

impl TrustBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: BatchOp) {
        self.ops.push(op);
    }

    pub fn create_introduction(&mut self, record: IntroductionRecord) {
        self.push(BatchOp::CreateIntroduction(record));
    }

    pub fn put_introduction(&mut self, record: IntroductionRecord) {
        self.push(BatchOp::PutIntroduction(record));
    }

    pub fn set_introduction_state(&mut self, id: IntroductionId, state: IntroductionState) {
        self.push(BatchOp::SetIntroductionState { id, state });
    }

    pub fn set_level(&mut self, address: IdentityAddress, level: VerificationLevel) {
        self.push(BatchOp::SetLevel { address, level });
    }

    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

impl IntoIterator for TrustBatch {
    type Item = BatchOp;
    type IntoIter = std::vec::IntoIter<BatchOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}
