//! End-to-end scenarios for the introduction service over the in-memory store, plus
//! one pass over the LMDB backend.

use std::sync::Arc;
use std::thread;

use ti_nullables::NullTrustStore;
use ti_store::{IntroductionStore, StoreError, TrustStore, VerificationLedger};
use ti_store_lmdb::LmdbTrustStore;
use ti_trust::{IntroductionService, TrustError, TrustEvent};
use ti_types::{
    IdentityAddress, IdentityKey, IntroductionId, IntroductionRecord, IntroductionState, Outcome,
    Timestamp, VerificationLevel,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn addr(s: &str) -> IdentityAddress {
    IdentityAddress::new(s).unwrap()
}

fn claim(introducer: &str, introducee: &str, key: &str) -> IntroductionRecord {
    IntroductionRecord::pending(
        Some(addr(introducer)),
        addr(introducee),
        IdentityKey::new(key).unwrap(),
        Timestamp::from_millis(1_000),
    )
}

fn service() -> IntroductionService<NullTrustStore> {
    IntroductionService::new(Arc::new(NullTrustStore::new()))
}

fn state_of<S: TrustStore>(svc: &IntroductionService<S>, id: IntroductionId) -> IntroductionState {
    svc.store().get_introduction(id).unwrap().unwrap().state
}

/// Submit and accept an introduction of `introducee` by `introducer`.
fn accepted<S: TrustStore>(
    svc: &IntroductionService<S>,
    introducer: &str,
    introducee: &str,
    key: &str,
) -> IntroductionId {
    let id = svc
        .submit_introduction(claim(introducer, introducee, key))
        .unwrap();
    svc.resolve_introduction(id, Outcome::Accepted).unwrap();
    id
}

// ---------------------------------------------------------------------------
// Core scenarios
// ---------------------------------------------------------------------------

#[test]
fn scenario_a_accepting_from_default_introduces() {
    let svc = service();
    let bob = addr("bob");
    let id = svc.submit_introduction(claim("alice", "bob", "k1")).unwrap();
    assert_eq!(svc.current_level(&bob).unwrap(), VerificationLevel::Default);
    assert!(!svc.can_receive(&bob).unwrap());

    let level = svc.resolve_introduction(id, Outcome::Accepted).unwrap();
    assert_eq!(level, VerificationLevel::Introduced);
    assert_eq!(state_of(&svc, id), IntroductionState::Accepted);
    assert!(svc.can_receive(&bob).unwrap());
    assert!(!svc.can_forward(&bob).unwrap());
}

#[test]
fn scenario_b_rejecting_last_acceptance_keeps_direct_verification() {
    let svc = service();
    let bob = addr("bob");
    svc.record_direct_verification(&bob).unwrap();
    let id = accepted(&svc, "alice", "bob", "k1");
    assert_eq!(svc.current_level(&bob).unwrap(), VerificationLevel::DuplexVerified);

    let level = svc.resolve_introduction(id, Outcome::Rejected).unwrap();
    assert_eq!(level, VerificationLevel::DirectlyVerified);
    assert!(svc.can_forward(&bob).unwrap());
}

#[test]
fn scenario_c_rejecting_one_of_two_acceptances_holds() {
    let svc = service();
    let bob = addr("bob");
    let first = accepted(&svc, "alice", "bob", "k1");
    let second = accepted(&svc, "carol", "bob", "k1");

    assert_eq!(
        svc.resolve_introduction(first, Outcome::Rejected).unwrap(),
        VerificationLevel::Introduced
    );
    assert_eq!(
        svc.resolve_introduction(second, Outcome::Rejected).unwrap(),
        VerificationLevel::Unverified
    );
}

#[test]
fn scenario_d_contradicting_key_raises_suspicion() {
    let svc = service();
    let bob = addr("bob");
    let original = accepted(&svc, "alice", "bob", "k1");
    svc.drain_events();

    let contradicting = svc.submit_introduction(claim("mallory", "bob", "k2")).unwrap();

    assert_eq!(state_of(&svc, contradicting), IntroductionState::PendingConflicting);
    assert_eq!(state_of(&svc, original), IntroductionState::AcceptedConflicting);
    assert_eq!(
        svc.current_level(&bob).unwrap(),
        VerificationLevel::SuspectedCompromise
    );

    let events = svc.drain_events();
    assert!(events.contains(&TrustEvent::ConflictDetected {
        introducee: bob.clone(),
        flagged: vec![original],
    }));
    assert!(events.contains(&TrustEvent::SuspectedCompromise { address: bob.clone() }));
    assert!(events.contains(&TrustEvent::LevelChanged {
        address: bob,
        from: VerificationLevel::Introduced,
        to: VerificationLevel::SuspectedCompromise,
    }));
}

#[test]
fn scenario_e_staling_conflicting_acceptance_unverifies() {
    let svc = service();
    let bob = addr("bob");
    let original = accepted(&svc, "alice", "bob", "k1");
    svc.submit_introduction(claim("mallory", "bob", "k2")).unwrap();

    let level = svc.mark_stale(original).unwrap();
    assert_eq!(level, VerificationLevel::Unverified);
    assert_eq!(state_of(&svc, original), IntroductionState::StaleAcceptedConflicting);
}

#[test]
fn suspicion_clears_only_when_conflicting_acceptance_is_rejected() {
    let svc = service();
    let bob = addr("bob");
    let original = accepted(&svc, "alice", "bob", "k1");
    let contradicting = svc.submit_introduction(claim("mallory", "bob", "k2")).unwrap();

    // The conflicting acceptance still stands.
    assert_eq!(
        svc.resolve_introduction(contradicting, Outcome::Rejected).unwrap(),
        VerificationLevel::SuspectedCompromise
    );
    assert_eq!(state_of(&svc, contradicting), IntroductionState::RejectedConflicting);

    // Nothing accepted is left.
    assert_eq!(
        svc.resolve_introduction(original, Outcome::Rejected).unwrap(),
        VerificationLevel::Unverified
    );
    assert_eq!(svc.current_level(&bob).unwrap(), VerificationLevel::Unverified);
}

#[test]
fn accepting_a_conflicting_claim_raises_suspicion() {
    let svc = service();
    let bob = addr("bob");
    svc.submit_introduction(claim("alice", "bob", "k1")).unwrap();
    let second = svc.submit_introduction(claim("carol", "bob", "k2")).unwrap();
    assert_eq!(svc.current_level(&bob).unwrap(), VerificationLevel::Default);

    let level = svc.resolve_introduction(second, Outcome::Accepted).unwrap();
    assert_eq!(level, VerificationLevel::SuspectedCompromise);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn unknown_introduction_is_a_precondition_violation() {
    let svc = service();
    let ghost = IntroductionId::new(99);
    assert!(matches!(
        svc.resolve_introduction(ghost, Outcome::Accepted),
        Err(TrustError::UnknownIntroduction(id)) if id == ghost
    ));
    assert!(matches!(svc.mark_stale(ghost), Err(TrustError::UnknownIntroduction(_))));
}

#[test]
fn stale_records_are_terminal() {
    let svc = service();
    let id = svc.submit_introduction(claim("alice", "bob", "k1")).unwrap();
    svc.mark_stale(id).unwrap();
    assert!(matches!(
        svc.resolve_introduction(id, Outcome::Accepted),
        Err(TrustError::TerminalIntroduction { state: IntroductionState::StalePending, .. })
    ));
    assert!(matches!(
        svc.mark_stale(id),
        Err(TrustError::TerminalIntroduction { .. })
    ));
}

#[test]
fn storage_failure_leaves_nothing_applied_and_retry_succeeds() {
    let store = Arc::new(NullTrustStore::new());
    let svc = IntroductionService::new(Arc::clone(&store));
    let bob = addr("bob");
    let id = svc.submit_introduction(claim("alice", "bob", "k1")).unwrap();

    store.fail_next_commit();
    let err = svc.resolve_introduction(id, Outcome::Accepted).unwrap_err();
    assert!(matches!(err, TrustError::Store(StoreError::Backend(_))));
    assert_eq!(state_of(&svc, id), IntroductionState::Pending);
    assert_eq!(svc.current_level(&bob).unwrap(), VerificationLevel::Default);

    let level = svc.resolve_introduction(id, Outcome::Accepted).unwrap();
    assert_eq!(level, VerificationLevel::Introduced);
}

#[test]
fn malformed_document_is_rejected_whole() {
    let svc = service();
    let missing_key = r#"{"state":0,"introduceeAddress":"bob","timestamp":1}"#;
    assert!(matches!(
        svc.submit_document(missing_key),
        Err(TrustError::MalformedRecord(_))
    ));
    assert!(svc.displayable_introductions().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Supplementary operations
// ---------------------------------------------------------------------------

#[test]
fn duplicate_submission_refreshes_timestamp() {
    let svc = service();
    let bob = addr("bob");
    let first = svc.submit_introduction(claim("alice", "bob", "k1")).unwrap();

    let mut again = claim("alice", "bob", "k1");
    again.timestamp = Timestamp::from_millis(5_000);
    let second = svc.submit_introduction(again).unwrap();

    assert_eq!(first, second);
    let records = svc.introductions_for(&bob).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].timestamp, Timestamp::from_millis(5_000));
}

#[test]
fn duplicate_refresh_goes_through_commit() {
    let store = Arc::new(NullTrustStore::new());
    let svc = IntroductionService::new(Arc::clone(&store));
    let bob = addr("bob");
    svc.submit_introduction(claim("alice", "bob", "k1")).unwrap();

    let mut again = claim("alice", "bob", "k1");
    again.timestamp = Timestamp::from_millis(7_000);
    store.fail_next_commit();
    assert!(matches!(
        svc.submit_introduction(again.clone()),
        Err(TrustError::Store(StoreError::Backend(_)))
    ));
    assert_eq!(
        svc.introductions_for(&bob).unwrap()[0].timestamp,
        Timestamp::from_millis(1_000)
    );

    svc.submit_introduction(again).unwrap();
    assert_eq!(
        svc.introductions_for(&bob).unwrap()[0].timestamp,
        Timestamp::from_millis(7_000)
    );
}

#[test]
fn forgetting_introducer_is_all_or_nothing() {
    let store = Arc::new(NullTrustStore::new());
    let svc = IntroductionService::new(Arc::clone(&store));
    let id = accepted(&svc, "alice", "bob", "k1");

    store.fail_next_commit();
    assert!(svc.forget_introducer(id).is_err());
    assert_eq!(svc.displayable_introductions().unwrap().len(), 1);

    svc.forget_introducer(id).unwrap();
    assert!(svc.displayable_introductions().unwrap().is_empty());
}

#[test]
fn unknown_introduction_carries_its_id() {
    let svc = service();
    let err = svc.forget_introducer(IntroductionId::new(42)).unwrap_err();
    assert!(matches!(err, TrustError::UnknownIntroduction(id) if id == IntroductionId::new(42)));
}

#[test]
fn introductions_without_introducer_are_not_deduplicated() {
    let svc = service();
    let bob = addr("bob");
    let own = || {
        IntroductionRecord::pending(
            None,
            addr("bob"),
            IdentityKey::new("k1").unwrap(),
            Timestamp::from_millis(1),
        )
    };
    let a = svc.submit_introduction(own()).unwrap();
    let b = svc.submit_introduction(own()).unwrap();
    assert_ne!(a, b);
    assert_eq!(svc.introductions_for(&bob).unwrap().len(), 2);
    assert!(svc.displayable_introductions().unwrap().is_empty());
}

#[test]
fn key_change_supersedes_live_introductions() {
    let svc = service();
    let bob = addr("bob");
    let accepted_id = accepted(&svc, "alice", "bob", "k1");
    let pending_id = svc.submit_introduction(claim("carol", "bob", "k1")).unwrap();

    let level = svc.identity_key_changed(&bob).unwrap();
    assert_eq!(level, VerificationLevel::Unverified);
    assert_eq!(state_of(&svc, accepted_id), IntroductionState::StaleAccepted);
    assert_eq!(state_of(&svc, pending_id), IntroductionState::StalePending);
}

#[test]
fn key_change_without_introductions() {
    let svc = service();
    let bob = addr("bob");
    let carol = addr("carol");
    svc.toggle_manual_verification(&bob, false).unwrap();

    assert_eq!(svc.identity_key_changed(&bob).unwrap(), VerificationLevel::Unverified);
    assert_eq!(svc.identity_key_changed(&carol).unwrap(), VerificationLevel::Default);
}

#[test]
fn direct_verification_with_accepted_introduction_is_duplex() {
    let svc = service();
    let bob = addr("bob");
    accepted(&svc, "alice", "bob", "k1");
    assert_eq!(
        svc.record_direct_verification(&bob).unwrap(),
        VerificationLevel::DuplexVerified
    );
    assert_eq!(svc.forwardable_contacts().unwrap(), vec![bob]);
}

#[test]
fn manual_toggle_cycle() {
    let svc = service();
    let bob = addr("bob");
    assert_eq!(
        svc.toggle_manual_verification(&bob, false).unwrap(),
        VerificationLevel::ManuallyVerified
    );
    assert_eq!(
        svc.toggle_manual_verification(&bob, false).unwrap(),
        VerificationLevel::Unverified
    );
    assert_eq!(
        svc.toggle_manual_verification(&bob, false).unwrap(),
        VerificationLevel::ManuallyVerified
    );
}

#[test]
fn clearing_strong_level_needs_confirmation() {
    let svc = service();
    let bob = addr("bob");
    svc.record_direct_verification(&bob).unwrap();
    assert!(matches!(
        svc.toggle_manual_verification(&bob, false),
        Err(TrustError::ConfirmationRequired(VerificationLevel::DirectlyVerified))
    ));
    assert_eq!(
        svc.toggle_manual_verification(&bob, true).unwrap(),
        VerificationLevel::Unverified
    );
}

#[test]
fn manual_actions_refused_under_suspicion() {
    let svc = service();
    let bob = addr("bob");
    accepted(&svc, "alice", "bob", "k1");
    svc.submit_introduction(claim("mallory", "bob", "k2")).unwrap();

    assert!(matches!(
        svc.toggle_manual_verification(&bob, true),
        Err(TrustError::SuspectedCompromise(_))
    ));
    assert!(matches!(
        svc.record_direct_verification(&bob),
        Err(TrustError::SuspectedCompromise(_))
    ));
    assert_eq!(
        svc.current_level(&bob).unwrap(),
        VerificationLevel::SuspectedCompromise
    );
}

#[test]
fn deletion_rules() {
    let svc = service();
    let pending = svc.submit_introduction(claim("alice", "bob", "k1")).unwrap();
    assert!(matches!(
        svc.delete_introduction(pending),
        Err(TrustError::PendingDeletion(_))
    ));

    let accepted_id = accepted(&svc, "carol", "bob", "k1");
    assert!(matches!(
        svc.delete_introduction(accepted_id),
        Err(TrustError::UndeletableIntroduction { .. })
    ));

    svc.resolve_introduction(pending, Outcome::Rejected).unwrap();
    svc.delete_introduction(pending).unwrap();

    svc.mark_stale(accepted_id).unwrap();
    svc.delete_introduction(accepted_id).unwrap();

    assert!(svc.introductions_for(&addr("bob")).unwrap().is_empty());
}

#[test]
fn forgetting_introducer_hides_record_from_display() {
    let svc = service();
    let id = accepted(&svc, "alice", "bob", "k1");
    assert_eq!(svc.displayable_introductions().unwrap().len(), 1);

    let record = svc.forget_introducer(id).unwrap();
    assert!(record.introducer.is_none());
    assert_eq!(record.state, IntroductionState::Accepted);
    assert!(svc.displayable_introductions().unwrap().is_empty());
    assert_eq!(svc.introductions_for(&addr("bob")).unwrap().len(), 1);
}

#[test]
fn purge_resets_to_default() {
    let svc = service();
    let bob = addr("bob");
    accepted(&svc, "alice", "bob", "k1");
    svc.drain_events();

    svc.purge_identity(&bob).unwrap();
    assert_eq!(svc.current_level(&bob).unwrap(), VerificationLevel::Default);
    assert_eq!(
        svc.drain_events(),
        vec![TrustEvent::LevelChanged {
            address: bob,
            from: VerificationLevel::Introduced,
            to: VerificationLevel::Default,
        }]
    );
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn concurrent_transitions_on_many_addresses() {
    let svc = Arc::new(service());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let svc = Arc::clone(&svc);
            thread::spawn(move || {
                let introducee = format!("contact-{}", i % 4);
                let introducer = format!("friend-{i}");
                accepted(&svc, &introducer, &introducee, "shared-key");
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for i in 0..4 {
        let address = addr(&format!("contact-{i}"));
        assert_eq!(svc.current_level(&address).unwrap(), VerificationLevel::Introduced);
        assert_eq!(svc.introductions_for(&address).unwrap().len(), 2);
    }
}

#[test]
fn concurrent_rejections_leave_consistent_level() {
    let svc = Arc::new(service());
    let bob = addr("bob");
    let ids: Vec<_> = (0..6)
        .map(|i| accepted(&svc, &format!("friend-{i}"), "bob", "k1"))
        .collect();

    let handles: Vec<_> = ids
        .into_iter()
        .map(|id| {
            let svc = Arc::clone(&svc);
            thread::spawn(move || svc.resolve_introduction(id, Outcome::Rejected).unwrap())
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let unverified = results
        .iter()
        .filter(|l| **l == VerificationLevel::Unverified)
        .count();
    assert_eq!(unverified, 1);
    assert_eq!(svc.current_level(&bob).unwrap(), VerificationLevel::Unverified);
}

// ---------------------------------------------------------------------------
// LMDB backend
// ---------------------------------------------------------------------------

#[test]
fn lmdb_backed_service_persists_across_reopen() {
    let dir = tempfile::tempdir().expect("temp dir");
    let bob = addr("bob");
    let (original, contradicting) = {
        let store = LmdbTrustStore::open(dir.path(), 16 * 1024 * 1024).expect("open store");
        let svc = IntroductionService::new(Arc::new(store));
        let original = accepted(&svc, "alice", "bob", "k1");
        let contradicting = svc.submit_introduction(claim("mallory", "bob", "k2")).unwrap();
        (original, contradicting)
    };

    let store = LmdbTrustStore::open(dir.path(), 16 * 1024 * 1024).expect("reopen store");
    assert_eq!(
        store.get_level(&bob).unwrap(),
        VerificationLevel::SuspectedCompromise
    );
    let svc = IntroductionService::new(Arc::new(store));
    assert_eq!(state_of(&svc, original), IntroductionState::AcceptedConflicting);
    assert_eq!(state_of(&svc, contradicting), IntroductionState::PendingConflicting);

    svc.resolve_introduction(contradicting, Outcome::Rejected).unwrap();
    assert_eq!(
        svc.resolve_introduction(original, Outcome::Rejected).unwrap(),
        VerificationLevel::Unverified
    );
}
