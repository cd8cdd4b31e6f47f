use std::io;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::CliConfig;
use crate::error::{CliError, Result};

/// JSON lines on stderr; stdout is reserved for parse results. Records from
/// the `log` facade used by the core crate are bridged in by `try_init`.
pub fn init_logging(config: &CliConfig) -> Result<()> {
    let env_filter = build_env_filter(config)?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_span_list(false)
                .with_file(true)
                .with_line_number(true)
                .with_target(true)
                .with_level(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_writer(io::stderr),
        )
        .try_init()
        .map_err(|err| CliError::Logger(err.to_string()))?;

    Ok(())
}

fn build_env_filter(config: &CliConfig) -> Result<EnvFilter> {
    let directive = config.log_level.as_deref().unwrap_or("info");
    EnvFilter::try_new(directive)
        .map_err(|err| CliError::Logger(format!("invalid log level '{directive}': {err}")))
}
