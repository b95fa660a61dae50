//! Verification ledger storage trait.

use crate::StoreError;
use ti_types::{IdentityAddress, VerificationLevel};

/// Per-identity mapping from address to current [`VerificationLevel`].
///
/// Pure upsert semantics; no business logic.
pub trait VerificationLedger {
    /// Current level, or [`VerificationLevel::Default`] for an address with no row.
    ///
    /// Only a backend failure is an error; an unknown address never is.
    fn get_level(&self, address: &IdentityAddress) -> Result<VerificationLevel, StoreError>;

    /// Insert or overwrite the level for `address`.
    fn set_level(
        &self,
        address: &IdentityAddress,
        level: VerificationLevel,
    ) -> Result<(), StoreError>;

    /// Drop the row for `address` (identity purged). Missing rows are not an error.
    fn delete_level(&self, address: &IdentityAddress) -> Result<(), StoreError>;

    /// Every stored row.
    fn iter_levels(&self) -> Result<Vec<(IdentityAddress, VerificationLevel)>, StoreError>;
}
