//! Trusted introductions.
//!
//! An introduction is a claim by one contact that a third party owns a given identity
//! key. This crate turns a stream of such claims into one authoritative
//! [`VerificationLevel`](ti_types::VerificationLevel) per identity address:
//!
//! 1. **Conflict detection**: live claims that disagree on the key are flagged `_CONFLICTING`.
//! 2. **Transitions**: every introduction-state change is fed through the
//!    [`TransitionEngine`], which derives the next level from the previous one.
//! 3. **Gating**: callers consult the [`gating`] predicates before forwarding or accepting
//!    further introductions.
//!
//! [`IntroductionService`] ties these together over any [`ti_store::TrustStore`], committing
//! each record change together with the ledger write it causes.

pub mod conflict;
pub mod engine;
pub mod error;
pub mod events;
pub mod gating;
pub mod locks;
pub mod service;
pub mod staging;

pub use conflict::ConflictDetector;
pub use engine::{EvidenceLookup, TransitionEngine};
pub use error::TrustError;
pub use events::TrustEvent;
pub use locks::AddressLocks;
pub use service::IntroductionService;
pub use staging::{LevelChange, StagedChanges};
