use error_common::{codes, ClaimGuardError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration source not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Configuration loading failed: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Configuration document unreadable: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML document parsing failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON document parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration validation failed: {}", .0.join("; "))]
    ValidationError(Vec<String>),
}

impl From<ConfigError> for ClaimGuardError {
    fn from(err: ConfigError) -> Self {
        let code = match &err {
            ConfigError::ValidationError(_) => codes::config::INVALID_VALUE,
            ConfigError::Io(_) | ConfigError::Yaml(_) | ConfigError::Json(_) => {
                codes::config::ARTIFACT_UNREADABLE
            }
            _ => codes::config::LOAD_FAILED,
        };
        ClaimGuardError::config(code, err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
