//! HTTP key/value provider for Consul and etcd.
//!
//! # Responsibilities
//! - Read a single key holding the whole config document
//! - Map transport failures and HTTP status to distinct error kinds
//! - Decrypt the document when a keyring is configured
//!
//! Every request carries a connect timeout and a total timeout; a dead
//! endpoint fails in bounded time.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::remote::{crypt, flatten_document, RemoteProvider, RemoteValues};
use crate::config::schema::{ProviderKind, RemoteParams};

/// Time allowed to establish the TCP connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Time allowed for the whole request, including the body.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Remote provider speaking the Consul KV and etcd v2 keys HTTP APIs.
#[derive(Debug, Clone)]
pub struct KvProvider {
    client: reqwest::Client,
}

impl KvProvider {
    /// Create a provider with the default timeouts.
    pub fn new() -> ConfigResult<Self> {
        Self::with_timeouts(CONNECT_TIMEOUT, REQUEST_TIMEOUT)
    }

    /// Create a provider with explicit timeouts.
    pub fn with_timeouts(connect: Duration, request: Duration) -> ConfigResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect)
            .timeout(request)
            .no_proxy()
            .build()
            .map_err(|e| ConfigError::RemoteUnreachable {
                endpoint: String::new(),
                reason: format!("HTTP client setup failed: {}", e),
            })?;
        Ok(Self { client })
    }

    /// URL of the key for `kind`.
    ///
    /// Each `/`-separated part of `path` becomes one percent-encoded path
    /// segment, so `?` and `#` stay part of the key. Dot segments are
    /// rejected since the URL would no longer name the configured key.
    pub fn key_url(kind: ProviderKind, endpoint: &str, path: &str) -> ConfigResult<Url> {
        let base = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", endpoint)
        };
        let invalid = |reason: String| ConfigError::RemoteUnreachable {
            endpoint: endpoint.to_string(),
            reason: format!("invalid endpoint: {}", reason),
        };

        let key = path.trim_start_matches('/');
        if key.split('/').any(|segment| segment == "." || segment == "..") {
            return Err(ConfigError::InvalidValue {
                field: "remote.path",
                value: path.to_string(),
                reason: "dot segments are not allowed".to_string(),
            });
        }

        let prefix: [&str; 2] = match kind {
            ProviderKind::Consul => ["v1", "kv"],
            ProviderKind::Etcd => ["v2", "keys"],
        };

        let mut url = Url::parse(&base).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("not a base URL".to_string()))?
            .pop_if_empty()
            .extend(prefix)
            .extend(key.split('/'));
        if kind == ProviderKind::Consul {
            url.set_query(Some("raw"));
        }
        Ok(url)
    }

    async fn get(&self, url: Url, remote: &RemoteParams) -> ConfigResult<Vec<u8>> {
        let unreachable = |e: reqwest::Error| ConfigError::RemoteUnreachable {
            endpoint: remote.endpoint.clone(),
            reason: if e.is_timeout() {
                "request timed out".to_string()
            } else {
                e.to_string()
            },
        };

        tracing::debug!(url = %url, "Requesting remote config key");
        let response = self.client.get(url).send().await.map_err(unreachable)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ConfigError::RemotePathNotFound {
                path: remote.path.clone(),
            });
        }
        if !status.is_success() {
            return Err(ConfigError::RemoteUnreachable {
                endpoint: remote.endpoint.clone(),
                reason: format!("unexpected status {}", status),
            });
        }

        let body = response.bytes().await.map_err(unreachable)?;
        Ok(body.to_vec())
    }

    /// Raw value stored under the key, before decryption.
    async fn read_value(&self, kind: ProviderKind, remote: &RemoteParams) -> ConfigResult<Vec<u8>> {
        let url = Self::key_url(kind, &remote.endpoint, &remote.path)?;
        let body = self.get(url, remote).await?;

        match kind {
            ProviderKind::Consul => Ok(body),
            ProviderKind::Etcd => {
                let response: EtcdResponse = serde_json::from_slice(&body)
                    .map_err(|e| ConfigError::RemoteInvalidDocument(e.to_string()))?;
                response.node.value.map(String::into_bytes).ok_or_else(|| {
                    ConfigError::RemoteInvalidDocument(format!(
                        "etcd key '{}' has no value",
                        remote.path
                    ))
                })
            }
        }
    }
}

#[async_trait]
impl RemoteProvider for KvProvider {
    async fn fetch(&self, kind: ProviderKind, remote: &RemoteParams) -> ConfigResult<RemoteValues> {
        let raw = self.read_value(kind, remote).await?;

        let document = match remote.keyring() {
            Some(keyring) => {
                let key = crypt::load_keyring(keyring)?;
                crypt::open(&key, &raw)?
            }
            None => raw,
        };

        flatten_document(&document)
    }
}

/// Response body of an etcd v2 key read.
#[derive(Debug, Deserialize)]
struct EtcdResponse {
    node: EtcdNode,
}

#[derive(Debug, Deserialize)]
struct EtcdNode {
    value: Option<String>,
}
