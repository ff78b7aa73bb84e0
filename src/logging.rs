//! Logging initialization from validated configuration.

use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::{RelayError, Result};

/// Install the global tracing subscriber per the configured level and
/// format. Called once at startup, after [crate::config::Config::validate].
pub fn init_logging(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| RelayError::config(format!("cannot build log filter: {}", e)))?;

    let result = match config.log_format.as_str() {
        "json" => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
    };

    result.map_err(|e| RelayError::config(format!("cannot install logger: {}", e)))
}
