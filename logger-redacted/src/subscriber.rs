use crate::config::LoggerConfig;
use crate::error::LoggerError;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over `config.log_level` when set. Calling this twice
/// returns `LoggerError::SubscriberInit` rather than panicking.
pub fn init_tracing(config: &LoggerConfig) -> Result<(), LoggerError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    let writer = || {
        if config.stderr {
            BoxMakeWriter::new(std::io::stderr)
        } else {
            BoxMakeWriter::new(std::io::stdout)
        }
    };

    let result = if config.json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(config.with_target)
                    .with_current_span(false)
                    .with_writer(writer()),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(config.with_target)
                    .with_ansi(true)
                    .with_writer(writer()),
            )
            .try_init()
    };

    result.map_err(|e| LoggerError::SubscriberInit(e.to_string()))
}
