//! The introduction record and its flat document encoding.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{IdentityAddress, IdentityKey, IntroductionState, Timestamp, TypesError};

/// Surrogate key assigned to a record when it is first persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntroductionId(u64);

impl IntroductionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Big-endian bytes, so that keys sort in id order.
    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    pub fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }
}

impl fmt::Display for IntroductionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One introduction claim: `introducer` vouches that `introducee` owns
/// `introducee_identity_key`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntroductionRecord {
    /// Absent until the record has been persisted.
    pub id: Option<IntroductionId>,
    pub state: IntroductionState,
    /// Absent when this device made the introduction, or after the introducer was forgotten.
    pub introducer: Option<IdentityAddress>,
    pub introducee: IdentityAddress,
    pub introducee_name: String,
    pub introducee_number: String,
    pub introducee_identity_key: IdentityKey,
    /// Safety number predicted for the introduced key, if it could be derived.
    pub predicted_security_number: Option<String>,
    pub timestamp: Timestamp,
}

impl IntroductionRecord {
    /// A fresh, not yet persisted, pending introduction.
    pub fn pending(
        introducer: Option<IdentityAddress>,
        introducee: IdentityAddress,
        introducee_identity_key: IdentityKey,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: None,
            state: IntroductionState::Pending,
            introducer,
            introducee,
            introducee_name: String::new(),
            introducee_number: String::new(),
            introducee_identity_key,
            predicted_security_number: None,
            timestamp,
        }
    }

    pub fn with_id(mut self, id: IntroductionId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_display(mut self, name: impl Into<String>, number: impl Into<String>) -> Self {
        self.introducee_name = name.into();
        self.introducee_number = number.into();
        self
    }

    /// Whether two records make the same claim from the same introducer.
    ///
    /// Records without an introducer never match anything.
    pub fn same_claim(&self, other: &IntroductionRecord) -> bool {
        self.introducer.is_some()
            && self.introducer == other.introducer
            && self.introducee == other.introducee
            && self.introducee_identity_key == other.introducee_identity_key
    }

    /// Encode as a flat JSON document. Absent optional fields are omitted.
    pub fn to_document(&self) -> Result<String, TypesError> {
        serde_json::to_string(&RecordDocument::from(self))
            .map_err(|e| TypesError::MalformedDocument(e.to_string()))
    }

    /// Decode a flat JSON document.
    ///
    /// A missing optional key decodes as `None`; a missing required key rejects the
    /// whole document.
    pub fn from_document(document: &str) -> Result<Self, TypesError> {
        let doc: RecordDocument = serde_json::from_str(document)
            .map_err(|e| TypesError::MalformedDocument(e.to_string()))?;
        Ok(doc.into())
    }
}

/// Wire shape of [`IntroductionRecord`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<IntroductionId>,
    state: IntroductionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    introducer_address: Option<IdentityAddress>,
    introducee_address: IdentityAddress,
    introducee_name: String,
    introducee_number: String,
    introducee_identity_key: IdentityKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    predicted_security_number: Option<String>,
    timestamp: Timestamp,
}

impl From<&IntroductionRecord> for RecordDocument {
    fn from(r: &IntroductionRecord) -> Self {
        Self {
            id: r.id,
            state: r.state,
            introducer_address: r.introducer.clone(),
            introducee_address: r.introducee.clone(),
            introducee_name: r.introducee_name.clone(),
            introducee_number: r.introducee_number.clone(),
            introducee_identity_key: r.introducee_identity_key.clone(),
            predicted_security_number: r.predicted_security_number.clone(),
            timestamp: r.timestamp,
        }
    }
}

impl From<RecordDocument> for IntroductionRecord {
    fn from(d: RecordDocument) -> Self {
        Self {
            id: d.id,
            state: d.state,
            introducer: d.introducer_address,
            introducee: d.introducee_address,
            introducee_name: d.introducee_name,
            introducee_number: d.introducee_number,
            introducee_identity_key: d.introducee_identity_key,
            predicted_security_number: d.predicted_security_number,
            timestamp: d.timestamp,
        }
    }
}
