//! PHI-aware logging for ClaimGuard
//!
//! Claims carry patient identifiers, and free-text fields supplied by
//! collaborators (form input, extracted PDF text) may carry more. This crate
//! keeps them out of log output:
//!
//! - [`patient_token`] turns a patient identifier into a stable correlation
//!   token for structured log fields.
//! - [`PhiRedactor`] rewrites free text, replacing emails, SSNs, phone
//!   numbers, MRNs and patient identifiers with hashed tokens or masks.
//! - [`init_tracing`] installs the process-wide `tracing` subscriber.
//!
//! # Example
//!
//! ```rust
//! use logger_redacted::{patient_token, PhiRedactor, RedactionConfig};
//!
//! let redactor = PhiRedactor::new(&RedactionConfig::default()).unwrap();
//! let line = redactor.redact("resubmission for P004211, call (555) 123-4567");
//! assert!(!line.contains("P004211"));
//!
//! tracing::info!(patient = %patient_token("P004211"), "claim received");
//! ```

pub mod redactor;
pub mod subscriber;
pub mod macros;
pub mod config;
pub mod error;

pub use redactor::*;
pub use subscriber::*;
pub use config::*;
pub use error::*;
