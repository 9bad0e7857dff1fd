//! Pure create-or-update classification for a batch of candidates.
//!
//! The storage layer loads the ids that already exist, calls [`classify`],
//! and then executes the resulting actions in order inside one transaction.

use std::collections::HashSet;

use crate::coercion::CandidateRecord;
use crate::types::DbId;

/// What to do with one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertAction {
    /// Insert a new row from exactly these fields. The store assigns an id
    /// when the candidate carries none.
    Create(CandidateRecord),
    /// Merge these fields onto the row with this id.
    Update { id: DbId, fields: CandidateRecord },
}

impl UpsertAction {
    pub fn is_create(&self) -> bool {
        matches!(self, Self::Create(_))
    }
}

/// Row counts produced by one or more batches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub inserted: u64,
    pub updated: u64,
}

impl UpsertOutcome {
    pub fn total(&self) -> u64 {
        self.inserted + self.updated
    }
}

impl std::ops::AddAssign for UpsertOutcome {
    fn add_assign(&mut self, rhs: Self) {
        self.inserted += rhs.inserted;
        self.updated += rhs.updated;
    }
}

/// Explicit ids carried by the batch, deduplicated, in first-seen order.
pub fn explicit_ids(candidates: &[CandidateRecord]) -> Vec<DbId> {
    let mut seen = HashSet::new();
    candidates
        .iter()
        .filter_map(CandidateRecord::id)
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Classify each candidate as a create or an update, preserving input order.
///
/// A candidate whose id is in `existing` becomes an update. The first
/// candidate carrying an unknown id becomes a create; later candidates with
/// the same id in this batch update that freshly created row, so the last
/// write wins.
pub fn classify(candidates: Vec<CandidateRecord>, existing: &HashSet<DbId>) -> Vec<UpsertAction> {
    let mut known = existing.clone();

    candidates
        .into_iter()
        .map(|candidate| match candidate.id() {
            Some(id) if known.contains(&id) => UpsertAction::Update {
                id,
                fields: candidate,
            },
            Some(id) => {
                known.insert(id);
                UpsertAction::Create(candidate)
            }
            None => UpsertAction::Create(candidate),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::coercion::FieldValue;
    use crate::fields::FigureField;

    fn candidate(id: Option<i64>, name: &str) -> CandidateRecord {
        let mut c = CandidateRecord::new().with(FigureField::Name, FieldValue::Text(name.into()));
        if let Some(id) = id {
            c.set(FigureField::Id, FieldValue::Integer(id));
        }
        c
    }

    #[test]
    fn explicit_ids_skip_missing_and_null_ids() {
        let null_id = candidate(None, "Null").with(FigureField::Id, FieldValue::Null);
        let batch = vec![candidate(Some(3), "A"), candidate(None, "B"), null_id, candidate(Some(3), "C")];
        assert_eq!(explicit_ids(&batch), vec![3]);
    }

    #[test]
    fn existing_ids_update_and_others_create() {
        let existing = HashSet::from([1]);
        let actions = classify(
            vec![candidate(Some(1), "Marie Curie"), candidate(None, "Ada"), candidate(Some(7), "Newton")],
            &existing,
        );

        assert_matches!(&actions[0], UpsertAction::Update { id: 1, .. });
        assert_matches!(&actions[1], UpsertAction::Create(c) if c.id().is_none());
        assert_matches!(&actions[2], UpsertAction::Create(c) if c.id() == Some(7));
    }

    #[test]
    fn repeated_new_id_creates_once_then_updates() {
        let actions = classify(
            vec![candidate(Some(5), "First"), candidate(Some(5), "Second")],
            &HashSet::new(),
        );

        assert!(actions[0].is_create());
        assert_matches!(&actions[1], UpsertAction::Update { id: 5, fields }
            if fields.get(FigureField::Name) == Some(&FieldValue::Text("Second".into())));
    }

    #[test]
    fn repeated_existing_id_yields_ordered_updates() {
        let actions = classify(
            vec![candidate(Some(2), "First"), candidate(Some(2), "Second")],
            &HashSet::from([2]),
        );
        assert!(actions.iter().all(|a| !a.is_create()));
        assert_eq!(actions.len(), 2);
    }

    #[test]
    fn outcome_accumulates() {
        let mut total = UpsertOutcome::default();
        total += UpsertOutcome { inserted: 2, updated: 1 };
        total += UpsertOutcome { inserted: 0, updated: 4 };
        assert_eq!(total, UpsertOutcome { inserted: 2, updated: 5 });
        assert_eq!(total.total(), 7);
    }
}
