use thiserror::Error;

use ti_store::StoreError;
use ti_types::{IdentityAddress, IntroductionId, IntroductionState, TypesError, VerificationLevel};

#[derive(Debug, Error)]
pub enum TrustError {
    #[error("a transition into PENDING carries no trust decision")]
    PendingTransition,

    #[error("introduction {0} does not exist")]
    UnknownIntroduction(IntroductionId),

    #[error("introduction {id} is {state} and can no longer transition")]
    TerminalIntroduction {
        id: IntroductionId,
        state: IntroductionState,
    },

    #[error("introduction {0} is still pending and cannot be deleted")]
    PendingDeletion(IntroductionId),

    #[error("introduction {id} is {state} and still backs the ledger")]
    UndeletableIntroduction {
        id: IntroductionId,
        state: IntroductionState,
    },

    #[error("clearing {0} requires explicit confirmation")]
    ConfirmationRequired(VerificationLevel),

    #[error("{0} is suspected compromised")]
    SuspectedCompromise(IdentityAddress),

    #[error("malformed introduction: {0}")]
    MalformedRecord(String),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<TypesError> for TrustError {
    fn from(e: TypesError) -> Self {
        TrustError::MalformedRecord(e.to_string())
    }
}
