use crate::codes;
use crate::context::ErrorContext;
use thiserror::Error;

/// Workspace-wide error enum
///
/// Crate-local errors convert into this at crate seams so binaries can
/// report a stable error code for every failure.
#[derive(Error, Debug)]
pub enum ClaimGuardError {
    /// Malformed or out-of-range claim input, rejected before the engine runs
    #[error("Validation error [{code}]: {message}")]
    Validation { code: &'static str, message: String },

    /// Configuration could not be loaded or failed its invariants
    #[error("Configuration error [{code}]: {message}")]
    Config { code: &'static str, message: String },

    /// A scorer failed; the engine degrades these to a fallback score
    #[error("Scoring error [{code}]: {message}")]
    Scoring { code: &'static str, message: String },

    /// Audit trail append or verification failure
    #[error("Audit error [{code}]: {message}")]
    Audit { code: &'static str, message: String },

    /// Internal system errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// Wrapped external errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ClaimGuardError {
    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        Self::Validation { code, message: message.into() }
    }

    pub fn config(code: &'static str, message: impl Into<String>) -> Self {
        Self::Config { code, message: message.into() }
    }

    pub fn scoring(code: &'static str, message: impl Into<String>) -> Self {
        Self::Scoring { code, message: message.into() }
    }

    pub fn audit(code: &'static str, message: impl Into<String>) -> Self {
        Self::Audit { code, message: message.into() }
    }

    /// Stable error code for API responses and logs
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { code, .. }
            | Self::Config { code, .. }
            | Self::Scoring { code, .. }
            | Self::Audit { code, .. } => code,
            Self::Internal(_) | Self::Other(_) => codes::internal::TASK_FAILED,
        }
    }

    /// Coarse category name used as a log field
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Config { .. } => "config",
            Self::Scoring { .. } => "scoring",
            Self::Audit { .. } => "audit",
            Self::Internal(_) | Self::Other(_) => "internal",
        }
    }
}

/// Result type alias for ClaimGuard operations
pub type Result<T> = std::result::Result<T, ClaimGuardError>;

/// Emit a structured error event with its correlation context
pub fn log_error(context: &ErrorContext, error: &ClaimGuardError) {
    tracing::error!(
        error_code = error.code(),
        error_type = error.error_type(),
        request_id = context.request_id.as_deref().unwrap_or("-"),
        claim_id = context.claim_id.as_deref().unwrap_or("-"),
        operation = context.operation.as_deref().unwrap_or("-"),
        additional = %serde_json::to_string(&context.additional).unwrap_or_default(),
        error = %error,
        "ClaimGuard error occurred"
    );
}
