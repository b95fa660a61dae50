use thiserror::Error;

use ti_types::IntroductionId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("introduction {0} not found")]
    IntroductionNotFound(IntroductionId),

    /// A write addressed a record that was never persisted.
    #[error("introduction record has no id")]
    MissingId,

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("store holds inconsistent data: {0}")]
    Corruption(String),
}
