//! Structured logging.
//!
//! The subscriber is installed before configuration is resolved, so the
//! filter sits behind a reload handle: startup logs use `RUST_LOG` (or
//! `info`), then the resolved `log.level` takes over. An explicit `RUST_LOG`
//! always wins.

use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

use crate::config::LogLevel;

/// Filter used until configuration is resolved.
pub const BOOTSTRAP_FILTER: &str = "info";

/// Handle for adjusting the log filter after startup.
pub struct LogHandle {
    handle: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

/// Install the global subscriber.
pub fn init() -> LogHandle {
    let from_env = std::env::var_os(EnvFilter::DEFAULT_ENV).is_some();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| BOOTSTRAP_FILTER.into());
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    LogHandle { handle, from_env }
}

impl LogHandle {
    /// Switch to the configured level.
    pub fn apply(&self, level: LogLevel) {
        if self.from_env {
            tracing::debug!(log_level = %level, "RUST_LOG set, ignoring configured log level");
            return;
        }
        if let Err(e) = self.handle.reload(filter_for(level)) {
            tracing::warn!(error = %e, "Failed to apply configured log level");
        }
    }
}

/// Filter enabling `level` and above.
pub fn filter_for(level: LogLevel) -> EnvFilter {
    EnvFilter::new(level.as_str())
}
