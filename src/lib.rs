//! Configuration resolution for the `srv` network service.

pub mod config;
pub mod observability;

pub use config::{load, ConfigError, Params};
