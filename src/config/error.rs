//! Error types for configuration resolution.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A mandatory field is empty.
    #[error("Missing required field: {field}")]
    MissingRequiredField { field: &'static str },

    /// A closed-set field holds a value outside its set.
    #[error("Invalid {field} '{value}': must be one of {expected}")]
    InvalidEnumValue {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    /// A field holds a value of the right type but out of range or unparsable.
    #[error("Invalid {field} '{value}': {reason}")]
    InvalidValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// A local config file exists but could not be read or parsed.
    ///
    /// Never returned by the local resolver; logged and skipped instead.
    #[error("Config file {} unreadable: {reason}", path.display())]
    LocalSourceUnreadable { path: PathBuf, reason: String },

    /// The remote provider could not be contacted.
    #[error("Remote provider at {endpoint} unreachable: {reason}")]
    RemoteUnreachable { endpoint: String, reason: String },

    /// The provider answered but holds nothing under the requested path.
    #[error("Remote config path not found: {path}")]
    RemotePathNotFound { path: String },

    /// The keyring is missing or invalid, or the payload does not decrypt.
    #[error("Remote config decryption failed: {0}")]
    RemoteDecryptionFailed(String),

    /// The provider kind is not one this crate can talk to.
    #[error("Unsupported remote config provider: '{0}'")]
    RemoteProviderUnsupported(String),

    /// The provider returned a document that is not a usable config object.
    #[error("Invalid remote config document: {0}")]
    RemoteInvalidDocument(String),
}

impl ConfigError {
    /// Whether this error was raised by the remote stage.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            ConfigError::RemoteUnreachable { .. }
                | ConfigError::RemotePathNotFound { .. }
                | ConfigError::RemoteDecryptionFailed(_)
                | ConfigError::RemoteProviderUnsupported(_)
                | ConfigError::RemoteInvalidDocument(_)
        )
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
