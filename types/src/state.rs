//! Lifecycle state of an introduction record.
//!
//! Three base outcomes (`Pending`, `Accepted`, `Rejected`), each with an orthogonal
//! *conflicting* flag and an orthogonal *stale* flag, give twelve states. The states are
//! spelled out as a closed enum so that every consumer matches on them exhaustively.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// The user's (or the introducer's) decision on an introduction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum IntroductionState {
    Pending,
    Accepted,
    Rejected,
    PendingConflicting,
    AcceptedConflicting,
    RejectedConflicting,
    StalePending,
    StaleAccepted,
    StaleRejected,
    StalePendingConflicting,
    StaleAcceptedConflicting,
    StaleRejectedConflicting,
}

impl IntroductionState {
    pub const ALL: [IntroductionState; 12] = [
        Self::Pending,
        Self::Accepted,
        Self::Rejected,
        Self::PendingConflicting,
        Self::AcceptedConflicting,
        Self::RejectedConflicting,
        Self::StalePending,
        Self::StaleAccepted,
        Self::StaleRejected,
        Self::StalePendingConflicting,
        Self::StaleAcceptedConflicting,
        Self::StaleRejectedConflicting,
    ];

    /// Build a state from its three components.
    pub fn compose(outcome: Outcome, conflicting: bool, stale: bool) -> Self {
        match (outcome, conflicting, stale) {
            (Outcome::Pending, false, false) => Self::Pending,
            (Outcome::Accepted, false, false) => Self::Accepted,
            (Outcome::Rejected, false, false) => Self::Rejected,
            (Outcome::Pending, true, false) => Self::PendingConflicting,
            (Outcome::Accepted, true, false) => Self::AcceptedConflicting,
            (Outcome::Rejected, true, false) => Self::RejectedConflicting,
            (Outcome::Pending, false, true) => Self::StalePending,
            (Outcome::Accepted, false, true) => Self::StaleAccepted,
            (Outcome::Rejected, false, true) => Self::StaleRejected,
            (Outcome::Pending, true, true) => Self::StalePendingConflicting,
            (Outcome::Accepted, true, true) => Self::StaleAcceptedConflicting,
            (Outcome::Rejected, true, true) => Self::StaleRejectedConflicting,
        }
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            Self::Pending
            | Self::PendingConflicting
            | Self::StalePending
            | Self::StalePendingConflicting => Outcome::Pending,
            Self::Accepted
            | Self::AcceptedConflicting
            | Self::StaleAccepted
            | Self::StaleAcceptedConflicting => Outcome::Accepted,
            Self::Rejected
            | Self::RejectedConflicting
            | Self::StaleRejected
            | Self::StaleRejectedConflicting => Outcome::Rejected,
        }
    }

    pub fn is_conflicting(&self) -> bool {
        matches!(
            self,
            Self::PendingConflicting
                | Self::AcceptedConflicting
                | Self::RejectedConflicting
                | Self::StalePendingConflicting
                | Self::StaleAcceptedConflicting
                | Self::StaleRejectedConflicting
        )
    }

    /// Stale states are terminal for a record.
    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            Self::StalePending
                | Self::StaleAccepted
                | Self::StaleRejected
                | Self::StalePendingConflicting
                | Self::StaleAcceptedConflicting
                | Self::StaleRejectedConflicting
        )
    }

    /// Live records can still transition and count as evidence.
    pub fn is_live(&self) -> bool {
        !self.is_stale()
    }

    /// The `STALE_*` variant of this state (identity for stale states).
    pub fn to_stale(&self) -> Self {
        Self::compose(self.outcome(), self.is_conflicting(), true)
    }

    /// The `_CONFLICTING` variant of this state (identity for conflicting states).
    pub fn to_conflicting(&self) -> Self {
        Self::compose(self.outcome(), true, self.is_stale())
    }

    /// Replace the outcome, keeping the conflicting and stale flags.
    pub fn with_outcome(&self, outcome: Outcome) -> Self {
        Self::compose(outcome, self.is_conflicting(), self.is_stale())
    }

    /// Stable integer code used by storage and the document encoding.
    pub fn code(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Accepted => 1,
            Self::Rejected => 2,
            Self::PendingConflicting => 3,
            Self::AcceptedConflicting => 4,
            Self::RejectedConflicting => 5,
            Self::StalePending => 6,
            Self::StaleAccepted => 7,
            Self::StaleRejected => 8,
            Self::StalePendingConflicting => 9,
            Self::StaleAcceptedConflicting => 10,
            Self::StaleRejectedConflicting => 11,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, TypesError> {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.code() == code)
            .ok_or(TypesError::UnknownStateCode(code))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
            Self::PendingConflicting => "PENDING_CONFLICTING",
            Self::AcceptedConflicting => "ACCEPTED_CONFLICTING",
            Self::RejectedConflicting => "REJECTED_CONFLICTING",
            Self::StalePending => "STALE_PENDING",
            Self::StaleAccepted => "STALE_ACCEPTED",
            Self::StaleRejected => "STALE_REJECTED",
            Self::StalePendingConflicting => "STALE_PENDING_CONFLICTING",
            Self::StaleAcceptedConflicting => "STALE_ACCEPTED_CONFLICTING",
            Self::StaleRejectedConflicting => "STALE_REJECTED_CONFLICTING",
        }
    }
}

impl fmt::Display for IntroductionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for IntroductionState {
    type Error = TypesError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl From<IntroductionState> for u8 {
    fn from(state: IntroductionState) -> Self {
        state.code()
    }
}
