//! Layered configuration loading for ClaimGuard
//!
//! Configuration is fixed at process start. [`ConfigLoader`] merges
//! built-in defaults, an optional YAML/TOML/JSON file and `CLAIMGUARD__*`
//! environment variables, then runs the type's [`ValidateConfig`] checks.
//! [`load_document`] reads standalone artifacts such as model parameters.
//!
//! # Example
//!
//! ```rust,no_run
//! use config_engine::{ConfigLoader, ConfigSource, ValidateConfig};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Default, Serialize, Deserialize)]
//! struct AppConfig {
//!     review_threshold: f64,
//! }
//!
//! impl ValidateConfig for AppConfig {
//!     fn validate(&self) -> Result<(), Vec<String>> {
//!         Ok(())
//!     }
//! }
//!
//! let config: AppConfig = ConfigLoader::new()
//!     .add_source(ConfigSource::optional_file("claimguard.yaml"))
//!     .add_source(ConfigSource::env())
//!     .load()?;
//! # Ok::<(), config_engine::ConfigError>(())
//! ```

pub mod loader;
pub mod providers;
pub mod validation;
pub mod documents;
pub mod error;

pub use loader::*;
pub use providers::*;
pub use validation::*;
pub use documents::*;
pub use error::*;
