//! Telemetry module for logging and counter reports.
//!
//! Provides:
//! - Logging configuration and initialization
//! - Timestamped per-action counter reports

mod logging;
mod report;

pub(crate) use logging::{is_known_format, is_known_level};
pub use logging::{init_logging, LogConfig};
pub use report::StatsReport;
