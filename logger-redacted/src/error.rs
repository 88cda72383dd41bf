use error_common::{codes, ClaimGuardError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Invalid redaction pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Tracing subscriber initialization failed: {0}")]
    SubscriberInit(String),
}

impl From<LoggerError> for ClaimGuardError {
    fn from(err: LoggerError) -> Self {
        ClaimGuardError::config(codes::config::INVALID_VALUE, err.to_string())
    }
}
