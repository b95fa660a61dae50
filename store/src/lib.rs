//! Abstract storage traits for trusted introductions.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these traits. The
//! rest of the codebase depends only on the traits.

pub mod batch;
pub mod error;
pub mod introduction;
pub mod ledger;

pub use batch::{BatchOp, TrustBatch};
pub use error::StoreError;
pub use introduction::IntroductionStore;
pub use ledger::VerificationLedger;

/// A backend holding both introduction records and the verification ledger, able to
/// apply a [`TrustBatch`] atomically.
///
/// Record-state changes and the ledger write they cause are always committed through
/// this trait so that readers never observe one without the other.
pub trait TrustStore: IntroductionStore + VerificationLedger {
    /// Apply every operation in `batch` or none of them.
    ///
    /// Returns the ids assigned to `BatchOp::CreateIntroduction` operations, in order.
    fn commit(&self, batch: TrustBatch) -> Result<Vec<ti_types::IntroductionId>, StoreError>;
}
