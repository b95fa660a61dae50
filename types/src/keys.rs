//! Public identity key as carried in introductions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// The introduced public identity key, kept as its textual (base64) encoding.
///
/// The key is opaque: it is only ever compared for equality to detect conflicting
/// introductions, never decoded.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn new(encoded: impl Into<String>) -> Result<Self, TypesError> {
        let s = encoded.into();
        if s.is_empty() {
            return Err(TypesError::InvalidIdentityKey("empty key".into()));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Keys are long; a prefix is enough to tell them apart in logs.
        let shown: String = self.0.chars().take(12).collect();
        if shown.len() < self.0.len() {
            write!(f, "{shown}…")
        } else {
            write!(f, "{shown}")
        }
    }
}

impl TryFrom<String> for IdentityKey {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<IdentityKey> for String {
    fn from(key: IdentityKey) -> Self {
        key.0
    }
}
