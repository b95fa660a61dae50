//! Fundamental types for trusted introductions.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! identity addresses and keys, timestamps, introduction states, verification levels,
//! and the introduction record itself together with its flat document encoding.

pub mod address;
pub mod error;
pub mod keys;
pub mod level;
pub mod record;
pub mod state;
pub mod time;

pub use address::IdentityAddress;
pub use error::TypesError;
pub use keys::IdentityKey;
pub use level::{CoarseStatus, VerificationLevel};
pub use record::{IntroductionId, IntroductionRecord};
pub use state::{IntroductionState, Outcome};
pub use time::Timestamp;
