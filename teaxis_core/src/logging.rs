//! Logging infrastructure for Teaxis.
//!
//! Provides centralized tracing setup for the client binaries.

use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

static FILTER: OnceCell<reload::Handle<EnvFilter, Registry>> = OnceCell::new();

/// Initialize logging with sensible defaults
///
/// Default level is INFO, but can be overridden with RUST_LOG env var.
pub fn init() {
    init_with_level("info")
}

/// Initialize logging with a specific default level
///
/// # Arguments
/// * `default_level` - Default log level (debug, info, warn, error)
///
/// This can still be overridden by RUST_LOG environment variable. Logs go to
/// stderr so command output on stdout stays clean.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (filter, handle) = reload::Layer::new(filter);

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init();
    if installed.is_ok() {
        let _ = FILTER.set(handle);
    }
}

/// Switch the running subscriber to `level`, e.g. once the config file has
/// been read. RUST_LOG still wins, and nothing happens before `init`.
pub fn set_level(level: &str) {
    if std::env::var_os("RUST_LOG").is_some() {
        return;
    }
    if let Some(handle) = FILTER.get() {
        if let Err(e) = handle.reload(EnvFilter::new(level)) {
            tracing::warn!("Could not change log level to {}: {}", level, e);
        }
    }
}

/// Initialize logging for testing (captures logs for test output)
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
