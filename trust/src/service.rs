//! Introduction service: the entry point for transport and UI collaborators.
//!
//! Every operation that touches an introducee runs under that address's lock and
//! commits record states together with the ledger writes they cause.

use std::sync::{Arc, Mutex, PoisonError};

use ti_store::{StoreError, TrustStore};
use ti_types::{
    IdentityAddress, IntroductionId, IntroductionRecord, IntroductionState, Outcome,
    VerificationLevel,
};

use crate::conflict::ConflictDetector;
use crate::engine::EvidenceLookup;
use crate::error::TrustError;
use crate::events::TrustEvent;
use crate::gating;
use crate::locks::AddressLocks;
use crate::staging::{LevelChange, StagedChanges};

pub struct IntroductionService<S: TrustStore> {
    store: Arc<S>,
    detector: ConflictDetector,
    locks: AddressLocks,
    /// Pending events for the host to surface.
    pending_events: Mutex<Vec<TrustEvent>>,
}

fn missing_id() -> TrustError {
    TrustError::Store(StoreError::MissingId)
}

impl<S: TrustStore> IntroductionService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            detector: ConflictDetector,
            locks: AddressLocks::new(),
            pending_events: Mutex::new(Vec::new()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // ── Introductions ───────────────────────────────────────────────────

    /// Store a newly received or sent introduction and return its id.
    ///
    /// A claim already on file (same introducer, introducee and key) only has its
    /// timestamp refreshed. A claim whose key disagrees with another live record is
    /// stored as `PENDING_CONFLICTING`, and the live records it contradicts are flagged
    /// conflicting and fed through the transition engine.
    pub fn submit_introduction(
        &self,
        record: IntroductionRecord,
    ) -> Result<IntroductionId, TrustError> {
        if record.state != IntroductionState::Pending {
            return Err(TrustError::MalformedRecord(format!(
                "new introductions must be PENDING, got {}",
                record.state
            )));
        }
        let introducee = record.introducee.clone();
        self.locks
            .with_lock(&introducee, || self.submit_locked(record))
    }

    /// Parse a flat introduction document and submit it.
    pub fn submit_document(&self, document: &str) -> Result<IntroductionId, TrustError> {
        let record = IntroductionRecord::from_document(document)?;
        self.submit_introduction(record)
    }

    fn submit_locked(&self, mut record: IntroductionRecord) -> Result<IntroductionId, TrustError> {
        let existing = self.store.introductions_for(&record.introducee)?;

        if let Some(duplicate) = existing.iter().find(|r| r.same_claim(&record)) {
            let id = duplicate.id.ok_or_else(missing_id)?;
            let mut refreshed = duplicate.clone();
            refreshed.timestamp = record.timestamp;
            let mut staged = StagedChanges::new(self.store.as_ref());
            staged.put(refreshed)?;
            staged.commit()?;
            tracing::debug!(id = %id, address = %record.introducee, "duplicate introduction, timestamp refreshed");
            return Ok(id);
        }

        let conflicts = self.detector.find_conflicts(
            &existing,
            &record.introducee,
            &record.introducee_identity_key,
        );
        if !conflicts.is_empty() {
            record.state = self.detector.reclassify(record.state);
        }

        let introducee = record.introducee.clone();
        let state = record.state;
        let mut staged = StagedChanges::new(self.store.as_ref());
        staged.create(record);

        let mut flagged = Vec::new();
        for other in conflicts {
            if other.state.is_conflicting() {
                continue;
            }
            let id = other.id.ok_or_else(missing_id)?;
            let reclassified = self.detector.reclassify(other.state);
            staged.set_state(id, reclassified);
            staged.apply_introduction_transition(&introducee, reclassified)?;
            flagged.push(id);
        }
        if state != IntroductionState::Pending {
            staged.apply_introduction_transition(&introducee, state)?;
        }

        let (created, changes) = staged.commit()?;
        let id = created.first().copied().ok_or_else(missing_id)?;

        tracing::info!(id = %id, address = %introducee, state = %state, "introduction submitted");
        let mut events = vec![TrustEvent::IntroductionSubmitted {
            id,
            introducee: introducee.clone(),
            state,
        }];
        if state.is_conflicting() {
            tracing::warn!(id = %id, address = %introducee, flagged = ?flagged, "conflicting introduction");
            events.push(TrustEvent::ConflictDetected {
                introducee,
                flagged,
            });
        }
        self.publish(events, &changes);
        Ok(id)
    }

    /// Record the user's decision on an introduction and return the introducee's new level.
    pub fn resolve_introduction(
        &self,
        id: IntroductionId,
        outcome: Outcome,
    ) -> Result<VerificationLevel, TrustError> {
        if outcome == Outcome::Pending {
            return Err(TrustError::PendingTransition);
        }
        self.transition(id, |state| state.with_outcome(outcome))
    }

    /// Mark an introduction as superseded. The introducee drops to `UNVERIFIED`.
    pub fn mark_stale(&self, id: IntroductionId) -> Result<VerificationLevel, TrustError> {
        self.transition(id, |state| state.to_stale())
    }

    fn transition(
        &self,
        id: IntroductionId,
        next_state: impl FnOnce(IntroductionState) -> IntroductionState,
    ) -> Result<VerificationLevel, TrustError> {
        let introducee = self.introducee_of(id)?;
        self.locks.with_lock(&introducee, || {
            let record = self
                .store
                .get_introduction(id)?
                .ok_or(TrustError::UnknownIntroduction(id))?;
            if record.state.is_stale() {
                return Err(TrustError::TerminalIntroduction {
                    id,
                    state: record.state,
                });
            }

            let new_state = next_state(record.state);
            if new_state == record.state {
                tracing::debug!(id = %id, state = %new_state, "introduction already in requested state");
                return Ok(self.store.get_level(&record.introducee)?);
            }

            let mut staged = StagedChanges::new(self.store.as_ref());
            staged.set_state(id, new_state);
            let level = staged.apply_introduction_transition(&record.introducee, new_state)?;
            let (_, changes) = staged.commit()?;

            tracing::info!(
                id = %id,
                address = %record.introducee,
                from = %record.state,
                to = %new_state,
                level = %level,
                "introduction transitioned"
            );
            self.publish(Vec::new(), &changes);
            Ok(level)
        })
    }

    /// The introducee's identity key changed: every live introduction about it is
    /// superseded and the address can no longer be trusted until re-verified.
    pub fn identity_key_changed(
        &self,
        address: &IdentityAddress,
    ) -> Result<VerificationLevel, TrustError> {
        self.locks.with_lock(address, || {
            let live = self.store.live_introductions_for(address)?;
            let mut staged = StagedChanges::new(self.store.as_ref());

            for record in &live {
                let id = record.id.ok_or_else(missing_id)?;
                let stale = record.state.to_stale();
                staged.set_state(id, stale);
                staged.apply_introduction_transition(address, stale)?;
            }
            if live.is_empty() && staged.level(address)? != VerificationLevel::Default {
                staged.set_level(address, VerificationLevel::Unverified)?;
            }

            let level = staged.level(address)?;
            let (_, changes) = staged.commit()?;
            tracing::info!(address = %address, superseded = live.len(), level = %level, "identity key changed");
            self.publish(Vec::new(), &changes);
            Ok(level)
        })
    }

    // ── Levels and gating ───────────────────────────────────────────────

    pub fn current_level(&self, address: &IdentityAddress) -> Result<VerificationLevel, TrustError> {
        Ok(self.store.get_level(address)?)
    }

    pub fn can_forward(&self, address: &IdentityAddress) -> Result<bool, TrustError> {
        Ok(gating::can_forward_as_introducer(self.current_level(address)?))
    }

    pub fn can_receive(&self, address: &IdentityAddress) -> Result<bool, TrustError> {
        Ok(gating::can_receive_introduction(self.current_level(address)?))
    }

    /// The user compared fingerprints out-of-band and they matched.
    pub fn record_direct_verification(
        &self,
        address: &IdentityAddress,
    ) -> Result<VerificationLevel, TrustError> {
        self.locks.with_lock(address, || {
            let mut staged = StagedChanges::new(self.store.as_ref());
            if staged.level(address)? == VerificationLevel::SuspectedCompromise {
                return Err(TrustError::SuspectedCompromise(address.clone()));
            }
            let next = if staged.exists_with_state(address, IntroductionState::Accepted)? {
                VerificationLevel::DuplexVerified
            } else {
                VerificationLevel::DirectlyVerified
            };
            staged.set_level(address, next)?;
            let (_, changes) = staged.commit()?;
            tracing::info!(address = %address, level = %next, "direct verification recorded");
            self.publish(Vec::new(), &changes);
            Ok(next)
        })
    }

    /// Flip the manual "verified" mark. Clearing a strongly positive level needs
    /// `confirmed`.
    pub fn toggle_manual_verification(
        &self,
        address: &IdentityAddress,
        confirmed: bool,
    ) -> Result<VerificationLevel, TrustError> {
        self.locks.with_lock(address, || {
            let mut staged = StagedChanges::new(self.store.as_ref());
            let next = match staged.level(address)? {
                VerificationLevel::SuspectedCompromise => {
                    return Err(TrustError::SuspectedCompromise(address.clone()))
                }
                level if gating::is_strongly_positive(level) => {
                    if !confirmed {
                        return Err(TrustError::ConfirmationRequired(level));
                    }
                    VerificationLevel::Unverified
                }
                VerificationLevel::ManuallyVerified => VerificationLevel::Unverified,
                _ => VerificationLevel::ManuallyVerified,
            };
            staged.set_level(address, next)?;
            let (_, changes) = staged.commit()?;
            tracing::info!(address = %address, level = %next, "manual verification toggled");
            self.publish(Vec::new(), &changes);
            Ok(next)
        })
    }

    // ── Housekeeping ────────────────────────────────────────────────────

    /// Drop the introducer from a record. State and history are kept.
    pub fn forget_introducer(&self, id: IntroductionId) -> Result<IntroductionRecord, TrustError> {
        let introducee = self.introducee_of(id)?;
        self.locks.with_lock(&introducee, || {
            let mut record = self
                .store
                .get_introduction(id)?
                .ok_or(TrustError::UnknownIntroduction(id))?;
            record.introducer = None;
            let mut staged = StagedChanges::new(self.store.as_ref());
            staged.put(record.clone())?;
            staged.commit()?;
            tracing::info!(id = %id, "introducer forgotten");
            Ok(record)
        })
    }

    /// Delete a record that no longer backs any trust decision.
    pub fn delete_introduction(&self, id: IntroductionId) -> Result<(), TrustError> {
        let introducee = self.introducee_of(id)?;
        self.locks.with_lock(&introducee, || {
            let record = self
                .store
                .get_introduction(id)?
                .ok_or(TrustError::UnknownIntroduction(id))?;
            let state = record.state;
            if !state.is_stale() {
                match state.outcome() {
                    Outcome::Pending => return Err(TrustError::PendingDeletion(id)),
                    Outcome::Accepted => {
                        return Err(TrustError::UndeletableIntroduction { id, state })
                    }
                    Outcome::Rejected => {}
                }
            }
            if !self.store.delete_introduction(id)? {
                return Err(TrustError::UnknownIntroduction(id));
            }
            tracing::info!(id = %id, state = %state, "introduction deleted");
            Ok(())
        })
    }

    /// Records that still name an introducer.
    pub fn displayable_introductions(&self) -> Result<Vec<IntroductionRecord>, TrustError> {
        let mut records = self.store.iter_introductions()?;
        records.retain(|r| r.introducer.is_some());
        Ok(records)
    }

    pub fn introductions_for(
        &self,
        introducee: &IdentityAddress,
    ) -> Result<Vec<IntroductionRecord>, TrustError> {
        Ok(self.store.introductions_for(introducee)?)
    }

    /// Contacts whose key this device may introduce to others.
    pub fn forwardable_contacts(&self) -> Result<Vec<IdentityAddress>, TrustError> {
        Ok(self
            .store
            .iter_levels()?
            .into_iter()
            .filter(|(_, level)| gating::can_forward_as_introducer(*level))
            .map(|(address, _)| address)
            .collect())
    }

    /// Forget the ledger entry of an identity that was removed from the directory.
    pub fn purge_identity(&self, address: &IdentityAddress) -> Result<(), TrustError> {
        self.locks.with_lock(address, || {
            let previous = self.store.get_level(address)?;
            self.store.delete_level(address)?;
            tracing::info!(address = %address, from = %previous, "identity purged");
            if previous != VerificationLevel::Default {
                let change = LevelChange {
                    address: address.clone(),
                    from: previous,
                    to: VerificationLevel::Default,
                };
                self.publish(Vec::new(), &[change]);
            }
            Ok(())
        })
    }

    // ── Events ──────────────────────────────────────────────────────────

    /// Take all events buffered since the last call.
    pub fn drain_events(&self) -> Vec<TrustEvent> {
        let mut events = self
            .pending_events
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *events)
    }

    fn publish(&self, mut events: Vec<TrustEvent>, changes: &[LevelChange]) {
        for change in changes {
            tracing::info!(
                address = %change.address,
                from = %change.from,
                to = %change.to,
                "verification level changed"
            );
            events.push(TrustEvent::LevelChanged {
                address: change.address.clone(),
                from: change.from,
                to: change.to,
            });
            if change.to == VerificationLevel::SuspectedCompromise {
                tracing::warn!(address = %change.address, "identity suspected compromised");
                events.push(TrustEvent::SuspectedCompromise {
                    address: change.address.clone(),
                });
            }
        }
        self.pending_events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(events);
    }

    fn introducee_of(&self, id: IntroductionId) -> Result<IdentityAddress, TrustError> {
        self.store
            .get_introduction(id)?
            .map(|r| r.introducee)
            .ok_or(TrustError::UnknownIntroduction(id))
    }
}
