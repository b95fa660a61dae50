//! Error type for value construction and decoding.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("invalid identity address: {0:?}")]
    InvalidAddress(String),

    #[error("invalid identity key: {0}")]
    InvalidIdentityKey(String),

    #[error("unknown introduction state code: {0}")]
    UnknownStateCode(u8),

    #[error("unknown verification level code: {0}")]
    UnknownLevelCode(u8),

    #[error("malformed introduction document: {0}")]
    MalformedDocument(String),
}
