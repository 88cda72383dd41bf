//! Common error handling utilities for ClaimGuard
//!
//! Standardized error types, error codes, and correlation context shared by
//! every crate in the workspace.
//!
//! # Error Categories
//!
//! - **Validation**: claim input malformation caught before the engine runs
//! - **Config**: configuration loading and invariant violations
//! - **Scoring**: scorer failures (degraded to a fallback, never fatal)
//! - **Audit**: audit trail append and integrity failures
//! - **Internal**: infrastructure and task failures
//!
//! # Example
//!
//! ```rust
//! use error_common::{codes, ClaimGuardError, ErrorContext, log_error};
//!
//! fn check_age(age: i64) -> Result<u8, ClaimGuardError> {
//!     u8::try_from(age)
//!         .ok()
//!         .filter(|a| *a <= 120)
//!         .ok_or_else(|| ClaimGuardError::validation(codes::intake::OUT_OF_RANGE, "age must be 0-120"))
//! }
//!
//! if let Err(e) = check_age(130) {
//!     log_error(&ErrorContext::new().with_claim_id("CLM000001"), &e);
//!     assert_eq!(e.code(), "INTAKE_1002");
//! }
//! ```

pub mod types;
pub mod context;
pub mod codes;

pub use types::*;
pub use context::*;
