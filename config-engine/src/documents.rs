// Whole-document loading for artifacts too large or too structured for
// layered merging (model artifacts, lookup tables)
use crate::error::{ConfigError, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Parse a YAML or JSON document, choosing the format by extension
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(ConfigError::SourceNotFound(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "yaml" | "yml" => Ok(serde_yaml::from_str(&raw)?),
        "json" => Ok(serde_json::from_str(&raw)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}
