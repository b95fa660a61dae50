//! Gating predicates over [`VerificationLevel`].
//!
//! Every caller that originates or accepts an introduction reads the current level and
//! asks one of these first.

use ti_types::VerificationLevel;

/// Only identities verified out-of-band by this device may have their key propagated,
/// which bounds transitive trust to a single hop of unverifiable claims.
pub fn can_forward_as_introducer(level: VerificationLevel) -> bool {
    matches!(
        level,
        VerificationLevel::DirectlyVerified | VerificationLevel::DuplexVerified
    )
}

pub fn can_receive_introduction(level: VerificationLevel) -> bool {
    matches!(
        level,
        VerificationLevel::DirectlyVerified
            | VerificationLevel::DuplexVerified
            | VerificationLevel::Introduced
    )
}

/// Coarse "trusted at all" query for display purposes. Never used for gating.
pub fn is_verified(level: VerificationLevel) -> bool {
    matches!(
        level,
        VerificationLevel::DirectlyVerified
            | VerificationLevel::Introduced
            | VerificationLevel::DuplexVerified
            | VerificationLevel::ManuallyVerified
    )
}

/// Levels whose removal must be confirmed by the user.
pub fn is_strongly_positive(level: VerificationLevel) -> bool {
    matches!(
        level,
        VerificationLevel::DirectlyVerified
            | VerificationLevel::DuplexVerified
            | VerificationLevel::Introduced
    )
}
