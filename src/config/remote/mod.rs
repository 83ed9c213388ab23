//! Remote configuration overlay.
//!
//! # Data Flow
//! ```text
//! RemoteParams (from env)
//!     → ProviderKind parse (unsupported kinds rejected here)
//!     → RemoteProvider::fetch (HTTP to consul/etcd, timeouts enforced)
//!     → crypt.rs (only when a keyring is configured)
//!     → flat dotted-key map
//!     → overlay onto a copy of the local Params
//! ```
//!
//! Remote config is strictly opt-in: an empty provider is a no-op. Any failure
//! is returned as-is; nothing is retried and no partial overlay escapes.

pub mod crypt;
pub mod kv;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Instant;

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::schema::{Params, ProviderKind, RemoteParams};
use crate::observability::metrics;

pub use kv::KvProvider;

/// Flat key/value map returned by a provider, keyed by dotted field names.
pub type RemoteValues = BTreeMap<String, String>;

/// Capability to read a configuration document from a key/value backend.
#[async_trait]
pub trait RemoteProvider: Send + Sync {
    /// Fetch the values stored under `remote.path`.
    async fn fetch(&self, kind: ProviderKind, remote: &RemoteParams) -> ConfigResult<RemoteValues>;
}

/// Overlay remote values onto `local` using the HTTP key/value provider.
pub async fn resolve_remote(local: Params, remote: &RemoteParams) -> ConfigResult<Params> {
    if !remote.is_enabled() {
        tracing::debug!("Remote config disabled");
        return Ok(local);
    }
    let provider = KvProvider::new()?;
    resolve_remote_with(&provider, local, remote).await
}

/// Overlay remote values onto `local` using `provider`.
pub async fn resolve_remote_with(
    provider: &dyn RemoteProvider,
    local: Params,
    remote: &RemoteParams,
) -> ConfigResult<Params> {
    if !remote.is_enabled() {
        tracing::debug!("Remote config disabled");
        return Ok(local);
    }

    let kind: ProviderKind = remote.provider.parse()?;
    if remote.endpoint.is_empty() {
        return Err(ConfigError::MissingRequiredField { field: "remote.endpoint" });
    }
    if remote.path.is_empty() {
        return Err(ConfigError::MissingRequiredField { field: "remote.path" });
    }

    tracing::info!(
        provider = %kind,
        endpoint = %remote.endpoint,
        path = %remote.path,
        encrypted = remote.keyring().is_some(),
        "Fetching remote config"
    );

    let started = Instant::now();
    let result = provider.fetch(kind, remote).await;
    let outcome = if result.is_ok() { "success" } else { "failure" };
    metrics::record_remote_fetch(kind.as_str(), outcome, started.elapsed());

    let values = result.inspect_err(|e| {
        tracing::error!(
            provider = %kind,
            endpoint = %remote.endpoint,
            error = %e,
            "Remote config fetch failed"
        );
    })?;

    let mut params = local;
    let applied = overlay(&mut params, &values)?;
    tracing::info!(provider = %kind, fields = applied, "Remote config applied");

    Ok(params)
}

/// Apply `values` to `params`, returning how many fields were set.
///
/// Unknown keys are ignored; a value of the wrong shape fails the overlay.
pub fn overlay(params: &mut Params, values: &RemoteValues) -> ConfigResult<usize> {
    let mut applied = 0;
    for (key, value) in values {
        match params.set(key, value) {
            Ok(true) => applied += 1,
            Ok(false) => tracing::debug!(key = %key, "Ignoring unknown remote config key"),
            Err(e) => return Err(ConfigError::RemoteInvalidDocument(e.to_string())),
        }
    }
    Ok(applied)
}

/// Flatten a JSON object document into dotted keys.
pub fn flatten_document(document: &[u8]) -> ConfigResult<RemoteValues> {
    let value: Value = serde_json::from_slice(document)
        .map_err(|e| ConfigError::RemoteInvalidDocument(e.to_string()))?;
    let Value::Object(_) = value else {
        return Err(ConfigError::RemoteInvalidDocument(
            "top-level value is not an object".to_string(),
        ));
    };

    let mut values = RemoteValues::new();
    flatten_into(&mut values, String::new(), value)?;
    Ok(values)
}

fn flatten_into(values: &mut RemoteValues, key: String, value: Value) -> ConfigResult<()> {
    match value {
        Value::Object(map) => {
            for (name, child) in map {
                let child_key = if key.is_empty() {
                    name
                } else {
                    format!("{}.{}", key, name)
                };
                flatten_into(values, child_key, child)?;
            }
        }
        Value::String(s) => {
            values.insert(key, s);
        }
        Value::Number(n) => {
            values.insert(key, n.to_string());
        }
        Value::Bool(b) => {
            values.insert(key, b.to_string());
        }
        Value::Null => {}
        Value::Array(_) => {
            return Err(ConfigError::RemoteInvalidDocument(format!(
                "unexpected array at '{}'",
                key
            )));
        }
    }
    Ok(())
}
