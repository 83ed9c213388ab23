//! Local configuration sources.
//!
//! # Precedence (lowest to highest)
//! 1. Built-in defaults (`Params::default()`)
//! 2. The first readable `config.toml` on the search path
//! 3. `SRV_*` environment variables
//!
//! Only one config file is ever used; later directories are not consulted
//! once a file has been read. Remote provider settings come from the
//! environment alone.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::schema::{Params, RemoteParams, PARAM_KEYS};

/// Process-wide environment variable prefix.
pub const ENV_PREFIX: &str = "SRV";

/// File name looked up in each search directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Directories scanned for a config file, in order.
pub fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("."), PathBuf::from("config")];
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".srv"));
    }
    paths.push(PathBuf::from("/etc/srv"));
    paths
}

/// Where environment lookups are answered from.
#[derive(Debug, Clone, Default)]
pub enum EnvSource {
    /// The real process environment.
    #[default]
    Process,
    /// A fixed set of variables.
    Map(HashMap<String, String>),
}

impl EnvSource {
    /// Value of `name`, treating an empty value as unset.
    pub fn get(&self, name: &str) -> Option<String> {
        let value = match self {
            EnvSource::Process => std::env::var(name).ok(),
            EnvSource::Map(vars) => vars.get(name).cloned(),
        };
        value.filter(|v| !v.is_empty())
    }
}

/// Resolves defaults, config file and environment into parameter sets.
#[derive(Debug, Clone)]
pub struct LocalResolver {
    search_paths: Vec<PathBuf>,
    env: EnvSource,
    env_prefix: String,
}

impl Default for LocalResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalResolver {
    /// Resolver over the default search path and the process environment.
    pub fn new() -> Self {
        Self {
            search_paths: default_search_paths(),
            env: EnvSource::Process,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// Replace the search path.
    pub fn with_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.search_paths = paths;
        self
    }

    /// Scan `dir` before any other directory.
    pub fn prepend_search_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_paths.insert(0, dir.into());
        self
    }

    /// Answer environment lookups from `env`.
    pub fn with_env(mut self, env: EnvSource) -> Self {
        self.env = env;
        self
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    pub fn env(&self) -> &EnvSource {
        &self.env
    }

    /// Produce the local parameter sets. Never fails.
    pub fn resolve(&self) -> (Params, RemoteParams) {
        let mut params = match self.first_config_file() {
            Some((path, params)) => {
                tracing::info!(path = %path.display(), "Config file loaded");
                params
            }
            None => {
                tracing::info!(
                    search_paths = ?self.search_paths,
                    "No config file found, using defaults"
                );
                Params::default()
            }
        };

        self.apply_env_overrides(&mut params);
        let remote = self.remote_params();

        (params, remote)
    }

    /// First readable config file on the search path.
    fn first_config_file(&self) -> Option<(PathBuf, Params)> {
        for dir in &self.search_paths {
            let path = dir.join(CONFIG_FILE_NAME);
            if !path.is_file() {
                continue;
            }
            match read_config_file(&path) {
                Ok(params) => return Some((path, params)),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping config file");
                }
            }
        }
        None
    }

    fn env_var(&self, suffix: &str) -> Option<String> {
        let name = format!("{}_{}", self.env_prefix, suffix);
        self.env.get(&name)
    }

    fn apply_env_overrides(&self, params: &mut Params) {
        for (key, suffix) in PARAM_KEYS {
            let Some(value) = self.env_var(suffix) else {
                continue;
            };
            match params.set(key, &value) {
                Ok(_) => tracing::debug!(key = *key, "Environment override applied"),
                Err(e) => tracing::warn!(
                    key = *key,
                    error = %e,
                    "Ignoring invalid environment override"
                ),
            }
        }
    }

    fn remote_params(&self) -> RemoteParams {
        let [provider, endpoint, path, keyring] =
            RemoteParams::ENV_KEYS.map(|suffix| self.env_var(suffix).unwrap_or_default());
        RemoteParams {
            provider,
            endpoint,
            path,
            secret_keyring: keyring,
        }
    }
}

/// Read and parse one config file.
pub fn read_config_file(path: &Path) -> ConfigResult<Params> {
    let unreadable = |reason: String| ConfigError::LocalSourceUnreadable {
        path: path.to_path_buf(),
        reason,
    };
    let content = fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;
    toml::from_str(&content).map_err(|e| unreadable(e.to_string()))
}

/// Resolve local configuration from the default search path and the process
/// environment.
pub fn resolve_local() -> (Params, RemoteParams) {
    LocalResolver::new().resolve()
}
