//! Events emitted by the introduction service for the host to surface.

use serde::Serialize;

use ti_types::{IdentityAddress, IntroductionId, IntroductionState, VerificationLevel};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TrustEvent {
    /// A new introduction was stored.
    IntroductionSubmitted {
        id: IntroductionId,
        introducee: IdentityAddress,
        state: IntroductionState,
    },
    /// Existing live records were flagged conflicting by a newer introduction.
    ConflictDetected {
        introducee: IdentityAddress,
        flagged: Vec<IntroductionId>,
    },
    LevelChanged {
        address: IdentityAddress,
        from: VerificationLevel,
        to: VerificationLevel,
    },
    /// Must always be shown to the user and acknowledged explicitly.
    SuspectedCompromise { address: IdentityAddress },
}
