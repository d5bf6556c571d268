//! Time-zone-aware cron expression parser and occurrence calculator.
#![deny(unsafe_code, warnings, missing_docs)]

/// Crate specific Errors implementation.
pub mod error;
mod field;
mod mask;
/// Cron schedule parser and next/previous occurrence search.
pub mod schedule;
mod utils;

/// Re-export of public entities.
pub use error::CronError;
pub use schedule::Schedule;

/// Convenient alias for `Result`.
pub type Result<T, E = CronError> = std::result::Result<T, E>;
