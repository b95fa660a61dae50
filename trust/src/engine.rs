//! Trust transition engine: derives an introducee's next verification level from an
//! introduction-state change and the level it held before.
//!
//! The table is monotone-cautious. Conflicting evidence only raises suspicion or keeps
//! it, rejecting an introduction never upgrades trust, and staleness always drops to
//! `Unverified` (not `Default`, since the address is known).

use ti_store::StoreError;
use ti_types::{IdentityAddress, IntroductionState, VerificationLevel};

use crate::error::TrustError;

/// Read access to the live introduction evidence for an address.
///
/// The engine only ever asks whether some record currently sits in a given state.
pub trait EvidenceLookup {
    fn exists_with_state(
        &self,
        introducee: &IdentityAddress,
        state: IntroductionState,
    ) -> Result<bool, StoreError>;
}

pub struct TransitionEngine;

impl TransitionEngine {
    /// Compute the level that follows `previous` when one of `introducee`'s records
    /// moves into `new_state`.
    ///
    /// `lookup` must already reflect the record's new state, so that "another live
    /// accepted introduction" never counts the record being rejected.
    pub fn next_level(
        &self,
        lookup: &impl EvidenceLookup,
        introducee: &IdentityAddress,
        previous: VerificationLevel,
        new_state: IntroductionState,
    ) -> Result<VerificationLevel, TrustError> {
        use IntroductionState as S;
        use VerificationLevel as L;

        let accepted_remains = || lookup.exists_with_state(introducee, S::Accepted);

        let next = match new_state {
            S::Pending => return Err(TrustError::PendingTransition),

            S::StalePending
            | S::StaleAccepted
            | S::StaleRejected
            | S::StalePendingConflicting
            | S::StaleAcceptedConflicting
            | S::StaleRejectedConflicting => L::Unverified,

            S::Accepted => match previous {
                L::DuplexVerified | L::DirectlyVerified => L::DuplexVerified,
                L::Default | L::Unverified | L::Introduced | L::ManuallyVerified => L::Introduced,
                L::SuspectedCompromise => L::SuspectedCompromise,
            },

            S::Rejected => match previous {
                L::DirectlyVerified | L::ManuallyVerified | L::Default | L::Unverified => previous,
                L::DuplexVerified => {
                    if accepted_remains()? {
                        L::DuplexVerified
                    } else {
                        L::DirectlyVerified
                    }
                }
                L::Introduced => {
                    if accepted_remains()? {
                        L::Introduced
                    } else {
                        L::Unverified
                    }
                }
                L::SuspectedCompromise => L::SuspectedCompromise,
            },

            S::AcceptedConflicting => L::SuspectedCompromise,

            S::RejectedConflicting => match previous {
                L::SuspectedCompromise => {
                    if lookup.exists_with_state(introducee, S::AcceptedConflicting)? {
                        L::SuspectedCompromise
                    } else if accepted_remains()? {
                        L::Introduced
                    } else {
                        L::Unverified
                    }
                }
                L::Default
                | L::ManuallyVerified
                | L::Unverified
                | L::DirectlyVerified
                | L::Introduced
                | L::DuplexVerified => previous,
            },

            S::PendingConflicting => previous,
        };

        tracing::debug!(
            address = %introducee,
            state = %new_state,
            from = ?previous,
            to = ?next,
            "trust transition"
        );
        Ok(next)
    }
}
