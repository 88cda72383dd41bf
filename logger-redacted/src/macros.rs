// Logging macros that pass the formatted message through a redactor

#[macro_export]
macro_rules! redacted_info {
    ($redactor:expr, $($arg:tt)*) => {
        tracing::info!("{}", $redactor.redact(&format!($($arg)*)))
    };
}

#[macro_export]
macro_rules! redacted_warn {
    ($redactor:expr, $($arg:tt)*) => {
        tracing::warn!("{}", $redactor.redact(&format!($($arg)*)))
    };
}

#[macro_export]
macro_rules! redacted_error {
    ($redactor:expr, $($arg:tt)*) => {
        tracing::error!("{}", $redactor.redact(&format!($($arg)*)))
    };
}
