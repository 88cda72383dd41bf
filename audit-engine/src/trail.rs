use crate::entry::{AuditEntry, AuditEventType, GENESIS_HASH};
use crate::error::{AuditError, Result};
use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

/// Append-only audit trail
///
/// Each entry's hash covers the previous entry's hash, so editing or
/// dropping an entry anywhere breaks [`AuditTrail::verify_integrity`].
/// There is no delete operation.
#[derive(Debug, Default)]
pub struct AuditTrail {
    entries: RwLock<Vec<AuditEntry>>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event whose payload is any serializable value
    pub fn record<T: Serialize>(
        &self,
        event_type: AuditEventType,
        subject: &str,
        action: &str,
        payload: &T,
    ) -> Result<AuditEntry> {
        let data = serde_json::to_value(payload)?;
        Ok(self.append(event_type, subject, action, data))
    }

    pub fn append(
        &self,
        event_type: AuditEventType,
        subject: &str,
        action: &str,
        data: serde_json::Value,
    ) -> AuditEntry {
        let mut entries = self.entries.write();
        let (sequence, previous_hash) = match entries.last() {
            Some(last) => (last.sequence + 1, last.hash.clone()),
            None => (0, GENESIS_HASH.to_string()),
        };

        let mut entry = AuditEntry {
            id: Uuid::new_v4(),
            sequence,
            timestamp: Utc::now(),
            event_type,
            subject: subject.to_string(),
            action: action.to_string(),
            data,
            previous_hash,
            hash: String::new(),
        };
        entry.hash = entry.compute_hash();

        debug!(sequence, event_type = %event_type, subject, action, "audit entry appended");
        entries.push(entry.clone());
        entry
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot of all entries, oldest first
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().clone()
    }

    pub fn by_subject(&self, subject: &str) -> Vec<AuditEntry> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.subject == subject)
            .cloned()
            .collect()
    }

    pub fn by_event_type(&self, event_type: AuditEventType) -> Vec<AuditEntry> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    /// Recompute every hash and link
    pub fn verify_integrity(&self) -> Result<()> {
        verify_chain(&self.entries.read())
    }
}

/// Verify a chain of entries exported from a trail
pub fn verify_chain(entries: &[AuditEntry]) -> Result<()> {
    let mut expected_previous = GENESIS_HASH.to_string();
    for (index, entry) in entries.iter().enumerate() {
        if entry.sequence != index as u64 {
            return Err(AuditError::ChainBroken {
                sequence: entry.sequence,
                reason: format!("expected sequence {index}"),
            });
        }
        if entry.previous_hash != expected_previous {
            return Err(AuditError::ChainBroken {
                sequence: entry.sequence,
                reason: "previous hash mismatch".to_string(),
            });
        }
        if entry.compute_hash() != entry.hash {
            return Err(AuditError::ChainBroken {
                sequence: entry.sequence,
                reason: "entry hash mismatch".to_string(),
            });
        }
        expected_previous.clone_from(&entry.hash);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn populated() -> AuditTrail {
        let trail = AuditTrail::new();
        trail.append(AuditEventType::DecisionRecorded, "CLM1", "approved", json!({"score": 0.1}));
        trail.append(AuditEventType::AnomalyDetected, "CLM2", "duplicate", json!({"rule": "duplicate_detection"}));
        trail.append(AuditEventType::DecisionRecorded, "CLM2", "rejected", json!({"score": 0.3}));
        trail
    }

    #[test]
    fn entries_are_chained() {
        let trail = populated();
        let entries = trail.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].previous_hash, GENESIS_HASH);
        assert_eq!(entries[1].previous_hash, entries[0].hash);
        assert_eq!(entries[2].sequence, 2);
        trail.verify_integrity().unwrap();
    }

    #[test]
    fn tampering_is_detected() {
        let mut entries = populated().entries();
        entries[1].action = "approved".to_string();
        let err = verify_chain(&entries).unwrap_err();
        assert!(matches!(err, AuditError::ChainBroken { sequence: 1, .. }));
    }

    #[test]
    fn dropped_entry_is_detected() {
        let mut entries = populated().entries();
        entries.remove(1);
        assert!(verify_chain(&entries).is_err());
    }

    #[test]
    fn filters_by_subject_and_type() {
        let trail = populated();
        assert_eq!(trail.by_subject("CLM2").len(), 2);
        assert_eq!(trail.by_event_type(AuditEventType::DecisionRecorded).len(), 2);
        assert_eq!(trail.by_event_type(AuditEventType::ScorerDegraded).len(), 0);
    }

    #[test]
    fn record_serializes_payload() {
        #[derive(Serialize)]
        struct Payload {
            model_id: &'static str,
        }
        let trail = AuditTrail::new();
        let entry = trail
            .record(AuditEventType::ScorerDegraded, "CLM9", "fallback", &Payload { model_id: "forest" })
            .unwrap();
        assert_eq!(entry.data["model_id"], "forest");
    }
}
