use crate::models::ClaimRecord;
use chrono::NaiveDate;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct HistoryKey {
    patient_id: String,
    procedure_code: String,
}

impl HistoryKey {
    fn of(claim: &ClaimRecord) -> Self {
        Self {
            patient_id: claim.patient_id.clone(),
            procedure_code: claim.procedure_code.clone(),
        }
    }
}

/// Whether a validation leaves a trace in the history index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryMode {
    #[default]
    Record,
    /// Check for duplicates without appending the claim
    DryRun,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorClaim {
    pub claim_id: String,
    pub claim_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DuplicateCheck {
    /// Earlier claims for the same patient and procedure inside the window
    pub conflicts: Vec<PriorClaim>,
    /// Whether this call added the claim to the index
    pub appended: bool,
}

impl DuplicateCheck {
    pub fn is_duplicate(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// Prior claim dates per (patient, procedure), keyed by claim id
///
/// The check and the append for one pair happen under a single shard
/// lock, so two concurrent submissions of the same pair cannot both miss
/// each other. A claim id is stored once: resubmitting it does not add a
/// second entry, but the stored entry still counts against it.
#[derive(Debug, Default)]
pub struct HistoryIndex {
    pairs: DashMap<HistoryKey, BTreeMap<String, NaiveDate>>,
}

impl HistoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check_and_append(
        &self,
        claim: &ClaimRecord,
        window_days: u32,
        mode: HistoryMode,
    ) -> DuplicateCheck {
        let key = HistoryKey::of(claim);
        match mode {
            HistoryMode::Record => {
                let mut prior = self.pairs.entry(key).or_default();
                let conflicts = conflicts_in(&prior, claim, window_days);
                let appended = !prior.contains_key(&claim.claim_id);
                if appended {
                    prior.insert(claim.claim_id.clone(), claim.claim_date);
                }
                DuplicateCheck { conflicts, appended }
            }
            HistoryMode::DryRun => DuplicateCheck {
                conflicts: self
                    .pairs
                    .get(&key)
                    .map(|prior| conflicts_in(&prior, claim, window_days))
                    .unwrap_or_default(),
                appended: false,
            },
        }
    }

    /// Dates on file for a patient and procedure, oldest first
    pub fn dates_for(&self, patient_id: &str, procedure_code: &str) -> Vec<NaiveDate> {
        let key = HistoryKey {
            patient_id: patient_id.to_string(),
            procedure_code: procedure_code.to_string(),
        };
        let mut dates: Vec<NaiveDate> = self
            .pairs
            .get(&key)
            .map(|prior| prior.values().copied().collect())
            .unwrap_or_default();
        dates.sort_unstable();
        dates
    }

    /// Total number of claims on file
    pub fn len(&self) -> usize {
        self.pairs.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn conflicts_in(
    prior: &BTreeMap<String, NaiveDate>,
    claim: &ClaimRecord,
    window_days: u32,
) -> Vec<PriorClaim> {
    let window = i64::from(window_days);
    prior
        .iter()
        .filter(|(_, date)| (claim.claim_date - **date).num_days().abs() <= window)
        .map(|(id, date)| PriorClaim {
            claim_id: id.clone(),
            claim_date: *date,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn claim(id: &str, patient: &str, procedure: &str, day: u32) -> ClaimRecord {
        ClaimRecord {
            claim_id: id.into(),
            patient_id: patient.into(),
            age: 50,
            gender: Gender::Other,
            diagnosis_code: "I10".into(),
            procedure_code: procedure.into(),
            treatment_cost: dec!(300),
            insurance_coverage_limit: dec!(5000),
            claim_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            hospital_id: "H0001".into(),
        }
    }

    #[test]
    fn first_claim_is_not_duplicate() {
        let index = HistoryIndex::new();
        let check = index.check_and_append(&claim("A", "P1", "99213", 10), 1, HistoryMode::Record);
        assert!(!check.is_duplicate());
        assert!(check.appended);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn window_is_inclusive() {
        let index = HistoryIndex::new();
        index.check_and_append(&claim("A", "P1", "99213", 10), 1, HistoryMode::Record);
        let next_day = index.check_and_append(&claim("B", "P1", "99213", 11), 1, HistoryMode::Record);
        assert_eq!(next_day.conflicts.len(), 1);
        assert_eq!(next_day.conflicts[0].claim_id, "A");
        let later = index.check_and_append(&claim("C", "P1", "99213", 13), 1, HistoryMode::Record);
        assert!(!later.is_duplicate());
    }

    #[test]
    fn earlier_dated_claim_still_conflicts() {
        let index = HistoryIndex::new();
        index.check_and_append(&claim("A", "P1", "99213", 10), 1, HistoryMode::Record);
        let back_dated = index.check_and_append(&claim("B", "P1", "99213", 9), 1, HistoryMode::Record);
        assert!(back_dated.is_duplicate());
    }

    #[test]
    fn other_patient_or_procedure_does_not_conflict() {
        let index = HistoryIndex::new();
        index.check_and_append(&claim("A", "P1", "99213", 10), 1, HistoryMode::Record);
        assert!(!index
            .check_and_append(&claim("B", "P2", "99213", 10), 1, HistoryMode::Record)
            .is_duplicate());
        assert!(!index
            .check_and_append(&claim("C", "P1", "99214", 10), 1, HistoryMode::Record)
            .is_duplicate());
    }

    #[test]
    fn resubmission_is_flagged_but_stored_once() {
        let index = HistoryIndex::new();
        let c = claim("A", "P1", "99213", 10);
        index.check_and_append(&c, 1, HistoryMode::Record);
        let again = index.check_and_append(&c, 1, HistoryMode::Record);
        assert!(again.is_duplicate());
        assert_eq!(again.conflicts[0].claim_id, "A");
        assert!(!again.appended);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn dry_run_leaves_no_trace() {
        let index = HistoryIndex::new();
        let check = index.check_and_append(&claim("A", "P1", "99213", 10), 1, HistoryMode::DryRun);
        assert!(!check.appended);
        assert!(index.is_empty());
    }

    #[test]
    fn concurrent_same_pair_sees_exactly_one_first() {
        let index = Arc::new(HistoryIndex::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let index = Arc::clone(&index);
                std::thread::spawn(move || {
                    index
                        .check_and_append(&claim(&format!("C{i}"), "P1", "99213", 10), 1, HistoryMode::Record)
                        .is_duplicate()
                })
            })
            .collect();
        let duplicates = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|dup| *dup)
            .count();
        assert_eq!(duplicates, 7);
        assert_eq!(index.dates_for("P1", "99213").len(), 8);
    }
}
