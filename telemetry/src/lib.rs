//! Operational signals for the ClaimGuard decision engine
//!
//! - [`EngineMetrics`]: counters and histograms through the `metrics` facade
//!   (decisions by disposition, rule failures, scorer fallbacks, latency).
//! - [`DegradationTracker`]: in-process record of scorer fallbacks that
//!   turns repeated degradation into a logged operational warning.
//!
//! Installing an exporter is the host process's job.

pub mod metrics;
pub mod degradation;

pub use crate::metrics::*;
pub use degradation::*;
