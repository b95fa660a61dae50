//! Conflict detection between live introductions of the same identity.

use ti_types::{IdentityAddress, IdentityKey, IntroductionRecord, IntroductionState};

pub struct ConflictDetector;

impl ConflictDetector {
    /// Live records in `existing` about `introducee` that assert a key other than `key`.
    pub fn find_conflicts<'a>(
        &self,
        existing: &'a [IntroductionRecord],
        introducee: &IdentityAddress,
        key: &IdentityKey,
    ) -> Vec<&'a IntroductionRecord> {
        existing
            .iter()
            .filter(|r| {
                r.state.is_live()
                    && &r.introducee == introducee
                    && &r.introducee_identity_key != key
            })
            .collect()
    }

    /// The state a record takes once it is known to conflict. Only the flag changes.
    pub fn reclassify(&self, state: IntroductionState) -> IntroductionState {
        state.to_conflicting()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ti_types::{IntroductionId, Timestamp};

    fn record(id: u64, key: &str, state: IntroductionState) -> IntroductionRecord {
        let mut r = IntroductionRecord::pending(
            Some(IdentityAddress::new("alice").unwrap()),
            IdentityAddress::new("bob").unwrap(),
            IdentityKey::new(key).unwrap(),
            Timestamp::from_millis(id),
        )
        .with_id(IntroductionId::new(id));
        r.state = state;
        r
    }

    #[test]
    fn same_key_is_no_conflict() {
        let bob = IdentityAddress::new("bob").unwrap();
        let existing = vec![record(1, "k1", IntroductionState::Accepted)];
        let key = IdentityKey::new("k1").unwrap();
        assert!(ConflictDetector.find_conflicts(&existing, &bob, &key).is_empty());
    }

    #[test]
    fn stale_records_are_ignored() {
        let bob = IdentityAddress::new("bob").unwrap();
        let existing = vec![
            record(1, "k1", IntroductionState::StaleAccepted),
            record(2, "k2", IntroductionState::Rejected),
            record(3, "k3", IntroductionState::PendingConflicting),
        ];
        let key = IdentityKey::new("k9").unwrap();
        let ids: Vec<u64> = ConflictDetector
            .find_conflicts(&existing, &bob, &key)
            .iter()
            .filter_map(|r| r.id.map(|id| id.as_u64()))
            .collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn reclassify_only_sets_flag() {
        assert_eq!(
            ConflictDetector.reclassify(IntroductionState::Accepted),
            IntroductionState::AcceptedConflicting
        );
        assert_eq!(
            ConflictDetector.reclassify(IntroductionState::RejectedConflicting),
            IntroductionState::RejectedConflicting
        );
    }
}
