//! crates/logging/src/error.rs
//! Configuration errors.

use logging_sink::SinkError;

use crate::severity::ParseSeverityError;

/// Errors returned by configuration calls.
///
/// Logging calls themselves never fail; only changing the configuration can.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The maximum message length must be at least one character.
    #[error("maximum message length must be greater than zero")]
    InvalidMaxLen,

    /// A severity name was not recognised.
    #[error(transparent)]
    UnknownLevel(#[from] ParseSeverityError),

    /// A log file path was empty.
    #[error("log file path is empty")]
    EmptyPath,

    /// The process-wide logger was configured after it had been used.
    #[error("the default logger is already initialised")]
    AlreadyInitialized,

    /// Opening or reconfiguring an output destination failed.
    #[error(transparent)]
    Sink(#[from] SinkError),
}
