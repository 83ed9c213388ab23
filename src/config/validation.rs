//! Configuration validation.
//!
//! # Responsibilities
//! - Gate the fully resolved `Params` before the service sees them
//! - Parse closed-set strings (log level, stats network) into their enums
//! - Check the stats flush period is positive
//!
//! Rules run in a fixed order and the first violation is returned. Input is
//! never modified.

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::schema::{LogLevel, Params};

/// Validate a resolved parameter set.
pub fn validate(params: &Params) -> ConfigResult<()> {
    if params.server_address.trim().is_empty() {
        return Err(ConfigError::MissingRequiredField { field: "server_address" });
    }

    if params.log.level.trim().is_empty() {
        return Err(ConfigError::MissingRequiredField { field: "log.level" });
    }
    params.log.level.parse::<LogLevel>()?;

    params.stats.network()?;

    if params.stats.flush_period == 0 {
        return Err(ConfigError::InvalidValue {
            field: "stats.flush_period",
            value: "0".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    Ok(())
}
