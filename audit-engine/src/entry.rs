// Audit entry types and structures
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Hash preceding the first entry of every trail
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// A decision record was produced for a claim
    DecisionRecorded,
    /// A critical rule flagged the claim (duplicate, over-coverage, ...)
    AnomalyDetected,
    /// A scorer fell back to the neutral probability
    ScorerDegraded,
}

impl fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DecisionRecorded => "decision_recorded",
            Self::AnomalyDetected => "anomaly_detected",
            Self::ScorerDegraded => "scorer_degraded",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    /// Claim identifier the event concerns
    pub subject: String,
    pub action: String,
    pub data: serde_json::Value,
    pub previous_hash: String,
    pub hash: String,
}

impl AuditEntry {
    /// Digest over every field except `id` and `hash`
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.previous_hash.as_bytes());
        hasher.update(self.sequence.to_be_bytes());
        hasher.update(self.timestamp.to_rfc3339().as_bytes());
        hasher.update(self.event_type.to_string().as_bytes());
        hasher.update(self.subject.as_bytes());
        hasher.update(self.action.as_bytes());
        hasher.update(self.data.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
