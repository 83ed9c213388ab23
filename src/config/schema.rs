//! Configuration schema definitions.
//!
//! `Params` is what the service consumes; `RemoteParams` says whether and how
//! to reach a remote provider. String fields that name a closed set of values
//! stay raw while sources are merged and are parsed into `LogLevel`,
//! `Network` and `ProviderKind` at the validation boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::config::error::{ConfigError, ConfigResult};

/// Default listen address.
pub const DEFAULT_SERVER_ADDRESS: &str = ":8080";
/// Default StatsD bucket prefix.
pub const DEFAULT_STATS_PREFIX: &str = "srv";
/// Default StatsD transport.
pub const DEFAULT_STATS_NETWORK: &str = "udp";
/// Default StatsD daemon address.
pub const DEFAULT_STATS_ADDRESS: &str = ":8125";
/// Default StatsD buffer flush period in milliseconds.
pub const DEFAULT_STATS_FLUSH_PERIOD_MS: u64 = 100;
/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Dotted field keys paired with the environment variable suffix for each.
///
/// Config files, environment variables and remote documents all address the
/// parameter set through these keys.
pub const PARAM_KEYS: &[(&str, &str)] = &[
    ("server_address", "SERVERADDRESS"),
    ("stats.prefix", "STATS_PREFIX"),
    ("stats.network", "STATS_NETWORK"),
    ("stats.address", "STATS_ADDRESS"),
    ("stats.flush_period", "STATS_FLUSH_PERIOD"),
    ("log.level", "LOG_LEVEL"),
];

/// Runtime parameters consumed by the rest of the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Params {
    /// Listen address (e.g. ":8080" or "127.0.0.1:8080").
    pub server_address: String,

    /// StatsD sink settings.
    pub stats: StatsParams,

    /// Logging settings.
    pub log: LogParams,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            server_address: DEFAULT_SERVER_ADDRESS.to_string(),
            stats: StatsParams::default(),
            log: LogParams::default(),
        }
    }
}

impl Params {
    /// Set a field by its dotted key.
    ///
    /// Returns `Ok(false)` when the key names no field.
    pub fn set(&mut self, key: &str, value: &str) -> ConfigResult<bool> {
        match key {
            "server_address" => self.server_address = value.to_string(),
            "stats.prefix" => self.stats.prefix = value.to_string(),
            "stats.network" => self.stats.network = value.to_string(),
            "stats.address" => self.stats.address = value.to_string(),
            "stats.flush_period" => {
                self.stats.flush_period =
                    value
                        .trim()
                        .parse::<u64>()
                        .map_err(|e| ConfigError::InvalidValue {
                            field: "stats.flush_period",
                            value: value.to_string(),
                            reason: e.to_string(),
                        })?;
            }
            "log.level" => self.log.level = value.to_string(),
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Parsed log level.
    pub fn log_level(&self) -> ConfigResult<LogLevel> {
        self.log.level.parse()
    }
}

/// StatsD client settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StatsParams {
    /// Prefix prepended to every bucket name.
    pub prefix: String,

    /// Transport used to reach the daemon ("udp" or "tcp").
    pub network: String,

    /// Daemon address (ip:port or :port).
    pub address: String,

    /// Buffer flush period in milliseconds.
    pub flush_period: u64,
}

impl Default for StatsParams {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_STATS_PREFIX.to_string(),
            network: DEFAULT_STATS_NETWORK.to_string(),
            address: DEFAULT_STATS_ADDRESS.to_string(),
            flush_period: DEFAULT_STATS_FLUSH_PERIOD_MS,
        }
    }
}

impl StatsParams {
    /// Parsed transport.
    pub fn network(&self) -> ConfigResult<Network> {
        self.network.parse()
    }

    /// Flush period as a duration.
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_period)
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LogParams {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
}

impl Default for LogParams {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// How to reach an optional remote configuration provider.
///
/// Only ever populated from the environment so provider secrets stay out of
/// versioned config files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemoteParams {
    /// Provider kind ("consul", "etcd"); empty disables remote config.
    pub provider: String,

    /// Provider address (host:port).
    pub endpoint: String,

    /// Key under which the config document is stored.
    pub path: String,

    /// Path to the keyring used to decrypt values; empty when unencrypted.
    pub secret_keyring: String,
}

impl RemoteParams {
    /// Environment variable suffixes, in field order.
    pub const ENV_KEYS: [&'static str; 4] = [
        "REMOTECONFIGPROVIDER",
        "REMOTECONFIGENDPOINT",
        "REMOTECONFIGPATH",
        "REMOTECONFIGSECRETKEYRING",
    ];

    /// Whether a remote provider was requested.
    pub fn is_enabled(&self) -> bool {
        !self.provider.is_empty()
    }

    /// Keyring path, if values are encrypted.
    pub fn keyring(&self) -> Option<&Path> {
        if self.secret_keyring.is_empty() {
            None
        } else {
            Some(Path::new(&self.secret_keyring))
        }
    }
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub const EXPECTED: &'static str = "trace, debug, info, warn, error";

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidEnumValue {
                field: "log.level",
                value: s.to_string(),
                expected: Self::EXPECTED,
            }),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LogLevel> for tracing::level_filters::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// StatsD transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Udp,
    Tcp,
}

impl Network {
    pub const EXPECTED: &'static str = "udp, tcp";
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "udp" => Ok(Network::Udp),
            "tcp" => Ok(Network::Tcp),
            _ => Err(ConfigError::InvalidEnumValue {
                field: "stats.network",
                value: s.to_string(),
                expected: Self::EXPECTED,
            }),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Network::Udp => "udp",
            Network::Tcp => "tcp",
        })
    }
}

/// Remote key/value backends this crate can read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Consul,
    Etcd,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Consul => "consul",
            ProviderKind::Etcd => "etcd",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "consul" => Ok(ProviderKind::Consul),
            "etcd" => Ok(ProviderKind::Etcd),
            _ => Err(ConfigError::RemoteProviderUnsupported(s.to_string())),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
