//! Duplicate-equivalence grouping and precedence resolution.
//!
//! The same measurement re-ingested via a different path or schema
//! version shares the duplicate-equivalence key
//! `(subject, prey, primary_score, contacts with null as 0)` — note
//! this is distinct from the store key, which includes the source
//! origin. Resolution is computed group-wise over the whole corpus:
//! precedence v4 > v3 > other, ties broken by the highest identity
//! ordinal (the most recently created row). Everything else in a group
//! enters the deletion set.
//!
//! This module is pure; the repository fetches candidates and applies
//! deletions.

use std::collections::HashMap;

use crate::models::SchemaVersion;

/// One stored record competing inside a duplicate-equivalence class.
/// `subject_id` is the bait protein id for pairwise records and the
/// complex id for complex interactions.
#[derive(Debug, Clone)]
pub struct DedupCandidate {
    pub id: i64,
    pub subject_id: i64,
    pub prey_id: i64,
    pub primary_score: f64,
    pub contact_count: Option<i32>,
    pub schema_version: SchemaVersion,
}

impl DedupCandidate {
    /// Exact-equality group key. Scores group on their bit pattern:
    /// equivalence means the same stored measurement, not numeric
    /// closeness.
    fn group_key(&self) -> (i64, i64, u64, i32) {
        (
            self.subject_id,
            self.prey_id,
            self.primary_score.to_bits(),
            self.contact_count.unwrap_or(0),
        )
    }
}

/// Outcome of a resolution pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DedupOutcome {
    pub groups_found: usize,
    /// Non-canonical row ids, ascending.
    pub delete_ids: Vec<i64>,
}

/// Resolve every duplicate-equivalence class to one canonical survivor.
/// Idempotent: over a corpus with no duplicate classes the outcome is
/// empty.
pub fn resolve(candidates: Vec<DedupCandidate>) -> DedupOutcome {
    let mut groups: HashMap<(i64, i64, u64, i32), Vec<DedupCandidate>> = HashMap::new();
    for candidate in candidates {
        groups.entry(candidate.group_key()).or_default().push(candidate);
    }

    let mut outcome = DedupOutcome::default();
    for (_, mut group) in groups {
        if group.len() < 2 {
            continue;
        }
        outcome.groups_found += 1;
        // Highest (schema precedence, ordinal) wins.
        group.sort_by_key(|c| (c.schema_version, c.id));
        let survivor = group.pop().map(|c| c.id);
        tracing::debug!(survivor = ?survivor, losers = group.len(), "duplicate group resolved");
        outcome.delete_ids.extend(group.into_iter().map(|c| c.id));
    }
    outcome.delete_ids.sort_unstable();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: i64, version: SchemaVersion) -> DedupCandidate {
        DedupCandidate {
            id,
            subject_id: 1,
            prey_id: 2,
            primary_score: 0.5,
            contact_count: Some(20),
            schema_version: version,
        }
    }

    #[test]
    fn test_v4_survives_regardless_of_order() {
        // Scenario: v3-origin and v4-origin loads of the same
        // measurement; the v4 record is canonical either way round.
        for ids in [[1i64, 2], [2, 1]] {
            let out = resolve(vec![
                candidate(ids[0], SchemaVersion::V3),
                candidate(ids[1], SchemaVersion::V4),
            ]);
            assert_eq!(out.groups_found, 1);
            assert_eq!(out.delete_ids, vec![ids[0]]);
        }
    }

    #[test]
    fn test_three_way_precedence() {
        let out = resolve(vec![
            candidate(10, SchemaVersion::Legacy),
            candidate(11, SchemaVersion::V4),
            candidate(12, SchemaVersion::V3),
        ]);
        assert_eq!(out.groups_found, 1);
        assert_eq!(out.delete_ids, vec![10, 12]);
    }

    #[test]
    fn test_tie_breaks_on_highest_ordinal() {
        let out = resolve(vec![
            candidate(5, SchemaVersion::V4),
            candidate(9, SchemaVersion::V4),
        ]);
        assert_eq!(out.delete_ids, vec![5]);
    }

    #[test]
    fn test_null_contacts_group_with_zero() {
        let mut a = candidate(1, SchemaVersion::V3);
        a.contact_count = None;
        let mut b = candidate(2, SchemaVersion::V4);
        b.contact_count = Some(0);
        let out = resolve(vec![a, b]);
        assert_eq!(out.groups_found, 1);
        assert_eq!(out.delete_ids, vec![1]);
    }

    #[test]
    fn test_different_metrics_are_distinct_measurements() {
        let mut a = candidate(1, SchemaVersion::V3);
        let mut b = candidate(2, SchemaVersion::V4);
        a.primary_score = 0.50;
        b.primary_score = 0.51;
        let out = resolve(vec![a, b]);
        assert_eq!(out, DedupOutcome::default());
    }

    #[test]
    fn test_idempotent_second_pass() {
        let first = resolve(vec![
            candidate(1, SchemaVersion::V3),
            candidate(2, SchemaVersion::V4),
            candidate(3, SchemaVersion::Legacy),
        ]);
        assert_eq!(first.delete_ids, vec![1, 3]);

        // The surviving corpus resolves to nothing further.
        let second = resolve(vec![candidate(2, SchemaVersion::V4)]);
        assert_eq!(second, DedupOutcome::default());
    }
}
