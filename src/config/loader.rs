//! Configuration loading: the single startup entry point.
//!
//! ```text
//! Start → LocalLoaded → RemoteSkipped ─┬→ Validated
//!                     → RemoteLoaded  ─┘  ValidationFailed
//!                     → RemoteFailed
//! ```

use crate::config::error::ConfigResult;
use crate::config::local::LocalResolver;
use crate::config::remote::{resolve_remote, resolve_remote_with, RemoteProvider};
use crate::config::schema::Params;
use crate::config::validation::validate;
use crate::observability::metrics;

/// Composes local resolution, the optional remote overlay and validation.
pub struct ConfigLoader {
    local: LocalResolver,
    provider: Option<Box<dyn RemoteProvider>>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader over the default local sources and the HTTP provider.
    pub fn new() -> Self {
        Self {
            local: LocalResolver::new(),
            provider: None,
        }
    }

    /// Use `local` for the local stage.
    pub fn with_local(mut self, local: LocalResolver) -> Self {
        self.local = local;
        self
    }

    /// Use `provider` instead of the HTTP key/value provider.
    pub fn with_provider(mut self, provider: impl RemoteProvider + 'static) -> Self {
        self.provider = Some(Box::new(provider));
        self
    }

    /// Resolve and validate the configuration.
    ///
    /// A remote failure is returned immediately; there is no fallback to the
    /// local values.
    pub async fn load(&self) -> ConfigResult<Params> {
        let (local, remote) = self.local.resolve();

        let params = if remote.is_enabled() {
            let result = match &self.provider {
                Some(provider) => resolve_remote_with(provider.as_ref(), local, &remote).await,
                None => resolve_remote(local, &remote).await,
            };
            match result {
                Ok(params) => params,
                Err(e) => {
                    metrics::record_load("remote_failed");
                    return Err(e);
                }
            }
        } else {
            tracing::debug!("No remote config provider set, using local config");
            local
        };

        if let Err(e) = validate(&params) {
            tracing::error!(error = %e, "Configuration rejected");
            metrics::record_load("validation_failed");
            return Err(e);
        }

        metrics::record_load("success");
        tracing::info!(
            server_address = %params.server_address,
            stats_network = %params.stats.network,
            stats_address = %params.stats.address,
            log_level = %params.log.level,
            "Configuration loaded"
        );
        Ok(params)
    }
}

/// Load configuration from the default sources.
pub async fn load() -> ConfigResult<Params> {
    ConfigLoader::new().load().await
}
