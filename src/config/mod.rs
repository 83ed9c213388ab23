//! Configuration resolution subsystem.
//!
//! # Data Flow
//! ```text
//! defaults → config.toml (first on search path) → SRV_* env vars
//!     → local.rs (Params + RemoteParams)
//!     → remote/ (only when SRV_REMOTECONFIGPROVIDER is set)
//!     → validation.rs
//!     → Params (validated, immutable, passed by value)
//! ```
//!
//! # Design Decisions
//! - Resolved once at startup; there is no reload
//! - Local resolution never fails, remote and validation failures are fatal
//! - Remote provider settings come only from the environment
//! - No global state: `load()` returns the value and `main` hands it on

pub mod error;
pub mod loader;
pub mod local;
pub mod remote;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load, ConfigLoader};
pub use local::{resolve_local, EnvSource, LocalResolver};
pub use remote::{resolve_remote, resolve_remote_with, RemoteProvider, RemoteValues};
pub use schema::{LogLevel, LogParams, Network, Params, ProviderKind, RemoteParams, StatsParams};
pub use validation::validate;
