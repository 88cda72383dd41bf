//! Audit trail for ClaimGuard decisions
//!
//! Decision records are immutable once produced and must stay reviewable.
//! This crate keeps an append-only, hash-chained log of:
//!
//! - **Decisions**: every disposition the engine produces
//! - **Anomalies**: critical rule hits such as duplicates or over-coverage
//! - **Degradations**: scorers that fell back to the neutral probability
//!
//! # Example
//!
//! ```rust
//! use audit_engine::{AuditEventType, AuditTrail};
//! use serde_json::json;
//!
//! let trail = AuditTrail::new();
//! trail.append(AuditEventType::DecisionRecorded, "CLM000001", "approved", json!({"fused_score": 0.07}));
//! trail.verify_integrity().unwrap();
//! ```

pub mod trail;
pub mod entry;
pub mod error;

pub use trail::*;
pub use entry::*;
pub use error::*;
