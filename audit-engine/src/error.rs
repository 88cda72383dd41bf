use error_common::{codes, ClaimGuardError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Audit payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Audit chain broken at sequence {sequence}: {reason}")]
    ChainBroken { sequence: u64, reason: String },
}

impl From<AuditError> for ClaimGuardError {
    fn from(err: AuditError) -> Self {
        let code = match err {
            AuditError::Serialization(_) => codes::audit::APPEND_FAILED,
            AuditError::ChainBroken { .. } => codes::audit::CHAIN_BROKEN,
        };
        ClaimGuardError::audit(code, err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;
