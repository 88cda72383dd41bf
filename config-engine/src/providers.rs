// Configuration sources layered on top of built-in defaults
use std::path::PathBuf;

/// Default environment prefix, e.g. `CLAIMGUARD__POLICY__REVIEW_THRESHOLD`
pub const DEFAULT_ENV_PREFIX: &str = "CLAIMGUARD";

/// Separator between the prefix and nested keys in environment variables
pub const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// YAML, TOML or JSON file, format inferred from the extension
    File { path: PathBuf, required: bool },
    /// Environment variables under `prefix`, nested keys split on `__`
    Environment { prefix: String },
}

impl ConfigSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File { path: path.into(), required: true }
    }

    pub fn optional_file(path: impl Into<PathBuf>) -> Self {
        Self::File { path: path.into(), required: false }
    }

    pub fn env() -> Self {
        Self::Environment { prefix: DEFAULT_ENV_PREFIX.to_string() }
    }

    pub fn env_with_prefix(prefix: impl Into<String>) -> Self {
        Self::Environment { prefix: prefix.into() }
    }
}
