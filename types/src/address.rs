//! Stable identity address.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// A stable identifier for a cryptographic identity (a service id), independent of
/// display name or contact-book metadata.
///
/// Addresses are opaque to this crate. They are used verbatim as storage keys, so they
/// must be non-empty, carry no surrounding whitespace and contain no control characters.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentityAddress(String);

impl IdentityAddress {
    /// Create an address from a raw string.
    pub fn new(raw: impl Into<String>) -> Result<Self, TypesError> {
        let s = raw.into();
        if s.is_empty() || s.trim() != s || s.chars().any(char::is_control) {
            return Err(TypesError::InvalidAddress(s));
        }
        Ok(Self(s))
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for IdentityAddress {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<IdentityAddress> for String {
    fn from(addr: IdentityAddress) -> Self {
        addr.0
    }
}

impl std::str::FromStr for IdentityAddress {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_padded() {
        assert!(IdentityAddress::new("").is_err());
        assert!(IdentityAddress::new(" abc").is_err());
        assert!(IdentityAddress::new("abc\n").is_err());
        assert!(IdentityAddress::new("a\0b").is_err());
    }

    #[test]
    fn accepts_service_id() {
        let addr = IdentityAddress::new("6f1b0c1e-2b3a-4e4f-9a55-0d2c3b4a5e6f").unwrap();
        assert_eq!(addr.as_str(), "6f1b0c1e-2b3a-4e4f-9a55-0d2c3b4a5e6f");
    }

    #[test]
    fn deserialize_validates() {
        let err = serde_json::from_str::<IdentityAddress>("\"\"");
        assert!(err.is_err());
        let ok: IdentityAddress = serde_json::from_str("\"alice\"").unwrap();
        assert_eq!(ok.as_str(), "alice");
    }
}
