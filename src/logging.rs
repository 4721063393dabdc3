//! Logging setup for the plugin process.

use tracing_subscriber::EnvFilter;

use crate::config::{LogSettings, LOG_ENV};

const DEFAULT_FILTER: &str = "info";

/// Filter directive: `DAW_BRIDGE_LOG`, then the configured filter, then `info`.
pub fn filter_directive(settings: &LogSettings, env_value: Option<String>) -> String {
    env_value
        .filter(|v| !v.is_empty())
        .or_else(|| settings.filter.clone())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Installs a stderr subscriber unless the host process already has one.
///
/// Returns `true` if this call installed the subscriber.
pub fn init(settings: &LogSettings) -> bool {
    let directive = filter_directive(settings, std::env::var(LOG_ENV).ok());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(true)
        .try_init()
        .is_ok()
}
