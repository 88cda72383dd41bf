//! ClaimGuard decision engine
//!
//! Decides Approved, Rejected or Manual Review for a medical insurance
//! claim by combining:
//!
//! - **Rules**: six deterministic compliance checks, always all evaluated
//! - **Ensemble**: logistic, tree-ensemble and outlier scorers over a
//!   versioned feature transform, each degrading to a neutral probability
//!   on failure
//! - **Fusion**: an order-independent weighted mean of the model scores
//! - **Policy**: critical rule failures dominate, then score thresholds,
//!   then warnings
//!
//! Duplicate detection reads and appends a shared [`HistoryIndex`] with an
//! atomic per-(patient, procedure) check-and-append.
//!
//! # Example
//!
//! ```rust,no_run
//! use claims_engine::{ClaimSubmission, ClaimValidationService, EngineConfig};
//!
//! # async fn run() -> Result<(), claims_engine::ClaimsError> {
//! let service = ClaimValidationService::new(EngineConfig::default())?;
//! let submission: ClaimSubmission = serde_json::from_str(
//!     r#"{"claim_id":"CLM000001","patient_id":"P1001","age":45,"gender":"M",
//!         "diagnosis_code":"E10","procedure_code":"99213","treatment_cost":"200",
//!         "insurance_coverage_limit":"5000","claim_date":"2024-01-15","hospital_id":"H0001"}"#,
//! ).expect("valid json");
//! let decision = service.submit(submission).await?;
//! println!("{}: {}", decision.claim_id(), decision.disposition());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod ensemble;
pub mod error;
pub mod explain;
pub mod features;
pub mod fusion;
pub mod history;
pub mod intake;
pub mod models;
pub mod policy;
pub mod reporting;
pub mod rules;
pub mod scoring;
pub mod service;
pub mod tables;

pub use config::*;
pub use ensemble::*;
pub use error::*;
pub use explain::*;
pub use features::*;
pub use fusion::*;
pub use history::*;
pub use intake::*;
pub use models::*;
pub use policy::*;
pub use reporting::*;
pub use rules::*;
pub use scoring::{ModelArtifact, ModelArtifacts, Scorer, ScoringModel};
pub use service::*;
pub use tables::*;
