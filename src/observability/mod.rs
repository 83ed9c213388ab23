//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! config resolution stages produce:
//!     → logging.rs (structured log events, level set from config)
//!     → metrics.rs (load and remote fetch counters)
//! ```
//!
//! # Design Decisions
//! - Structured fields over formatted messages
//! - Logging starts before config so resolution itself is visible
//! - Metrics go through the facade; exporting is the service's job

pub mod logging;
pub mod metrics;
