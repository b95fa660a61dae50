//! Per-identity verification level.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// The trust tag maintained per identity address.
///
/// This is the only trust signal consumed by forwarding and receiving decisions. An
/// address with no ledger row reads as [`VerificationLevel::Default`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum VerificationLevel {
    /// Never verified and never involved in an introduction.
    #[default]
    Default,
    /// The user marked the contact verified without comparing fingerprints.
    ManuallyVerified,
    /// Known, but currently backed by no trustworthy evidence.
    Unverified,
    /// Fingerprint compared out-of-band by this device.
    DirectlyVerified,
    /// Backed by at least one accepted introduction.
    Introduced,
    /// Both directly verified and introduced.
    DuplexVerified,
    /// Accepted introductions disagree on the identity key.
    SuspectedCompromise,
}

/// Three-valued status for peers that do not understand the fine-grained levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoarseStatus {
    Default,
    Verified,
    Unverified,
}

impl VerificationLevel {
    pub const ALL: [VerificationLevel; 7] = [
        Self::Default,
        Self::ManuallyVerified,
        Self::Unverified,
        Self::DirectlyVerified,
        Self::Introduced,
        Self::DuplexVerified,
        Self::SuspectedCompromise,
    ];

    pub fn code(&self) -> u8 {
        match self {
            Self::Default => 0,
            Self::ManuallyVerified => 1,
            Self::Unverified => 2,
            Self::DirectlyVerified => 3,
            Self::Introduced => 4,
            Self::DuplexVerified => 5,
            Self::SuspectedCompromise => 6,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, TypesError> {
        Self::ALL
            .iter()
            .copied()
            .find(|l| l.code() == code)
            .ok_or(TypesError::UnknownLevelCode(code))
    }

    /// Collapse onto [`CoarseStatus`]. Suspected compromise reads as unverified.
    pub fn coarse(&self) -> CoarseStatus {
        match self {
            Self::Default => CoarseStatus::Default,
            Self::DirectlyVerified
            | Self::Introduced
            | Self::DuplexVerified
            | Self::ManuallyVerified => CoarseStatus::Verified,
            Self::Unverified | Self::SuspectedCompromise => CoarseStatus::Unverified,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "DEFAULT",
            Self::ManuallyVerified => "MANUALLY_VERIFIED",
            Self::Unverified => "UNVERIFIED",
            Self::DirectlyVerified => "DIRECTLY_VERIFIED",
            Self::Introduced => "INTRODUCED",
            Self::DuplexVerified => "DUPLEX_VERIFIED",
            Self::SuspectedCompromise => "SUSPECTED_COMPROMISE",
        }
    }
}

impl fmt::Display for VerificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for VerificationLevel {
    type Error = TypesError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl From<VerificationLevel> for u8 {
    fn from(level: VerificationLevel) -> Self {
        level.code()
    }
}
