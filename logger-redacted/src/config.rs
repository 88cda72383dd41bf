// Logger configuration
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit newline-delimited JSON instead of human-readable lines
    pub json: bool,
    /// Include the event target (module path) in output
    pub with_target: bool,
    /// Write to stderr, leaving stdout for command output
    pub stderr: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
            with_target: true,
            stderr: false,
        }
    }
}

impl LoggerConfig {
    pub fn verbose(mut self, verbose: bool) -> Self {
        if verbose {
            self.log_level = "debug".to_string();
        }
        self
    }
}
