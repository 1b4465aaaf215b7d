//! Log output setup for binaries and servers embedding the wizard.

use crate::config::LoggingConfig;
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Installs a global `tracing` subscriber writing to stderr.
///
/// `RUST_LOG` wins over the configured level. Calling this more than once, or after
/// another subscriber was installed, leaves the existing subscriber in place.
pub fn init_logging(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.level));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr);

        let result = if config.json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };

        if result.is_err() {
            tracing::debug!("Global tracing subscriber already initialized, keeping it");
        }
    });
}
