use thiserror::Error;

use ti_types::IntroductionId;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("introduction {0} not found")]
    IntroductionNotFound(IntroductionId),

    #[error("introduction record has no id")]
    MissingId,

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        LmdbError::Heed(e.to_string())
    }
}

impl From<bincode::Error> for LmdbError {
    fn from(e: bincode::Error) -> Self {
        LmdbError::Serialization(e.to_string())
    }
}

impl From<LmdbError> for ti_store::StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::IntroductionNotFound(id) => ti_store::StoreError::IntroductionNotFound(id),
            LmdbError::MissingId => ti_store::StoreError::MissingId,
            LmdbError::Serialization(msg) => ti_store::StoreError::Serialization(msg),
            other => ti_store::StoreError::Backend(other.to_string()),
        }
    }
}
