#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `hooklog` is the process-wide face of the workspace's logging crates. It
//! owns one lazily created default [`Logger`] and exposes free functions and
//! the [`infof!`], [`warningf!`], [`errorf!`] and [`fatalf!`] macros that log
//! through it, so any module can log without threading a handle around.
//!
//! # Design
//!
//! The default logger is created on first use and writes to stdout and to a
//! rotating `logs/<program>.log` file, where `<program>` is the executable's
//! file stem (or `misc` when it cannot be determined). [`init`] installs a
//! differently configured default instead, provided nothing has logged yet.
//!
//! Everything here is a thin wrapper: explicit [`Logger`] instances built with
//! [`Logger::builder`] offer the same behavior and are preferable in libraries
//! and tests. The macros accept a `logger = expr;` prefix to target one.
//!
//! # Examples
//!
//! ```no_run
//! use hooklog::{Arg, Severity};
//!
//! hooklog::set_min_level(Severity::Warning);
//! hooklog::register_hook(|message| {
//!     eprintln!("alert: {message}");
//!     Ok(())
//! }, Severity::Error);
//!
//! hooklog::infof("not shown", &[]);
//! hooklog::errorf("upload of %s failed after %d attempts", &[Arg::Str("report.csv"), Arg::Int(3)]);
//! hooklog::warningf!("queue depth {}", 1_204);
//! ```

mod macros;

use std::io::Write;
use std::path::Path;
use std::sync::OnceLock;

pub use logging::{
    Arg, ConfigError, ConsoleTarget, DEFAULT_MAX_LEN, Destination, DestinationId,
    DestinationKind, FATAL_EXIT_CODE, Formatter, HookError, HookFailure, HookRegistry,
    LevelGate, LineFormat, Logger, LoggerBuilder, LoggerConfig, Message, OutputSink,
    ParseSeverityError, ProcessExit, Record, RotationPolicy, Severity, SinkError, Terminate,
    TextFormat, WriteReport, sprintf, truncate,
};
#[cfg(feature = "tracing")]
pub use logging::{HookLogLayer, init_tracing};
pub use logging_sink::{
    ArchiveJob, DEFAULT_LOG_DIR, DEFAULT_LOG_NAME, DEFAULT_MAX_SIZE_BYTES, RotatingFile,
    RotationOutcome,
};

static DEFAULT: OnceLock<Logger> = OnceLock::new();

/// Returns the process-wide logger, creating it on first use.
pub fn logger() -> &'static Logger {
    DEFAULT.get_or_init(default_logger)
}

/// Installs a configured process-wide logger.
///
/// Fails with [`ConfigError::AlreadyInitialized`] once the default logger has
/// been created, whether by an earlier `init` or by any logging call.
pub fn init(config: LoggerConfig) -> Result<&'static Logger, ConfigError> {
    config.validate()?;
    let configured = Logger::from_config(config)?;
    DEFAULT
        .set(configured)
        .map_err(|_| ConfigError::AlreadyInitialized)?;
    Ok(logger())
}

fn default_logger() -> Logger {
    let config = LoggerConfig::for_program(&program_name());
    Logger::from_config(config).unwrap_or_else(|_| Logger::new())
}

/// File stem of the running executable, or [`DEFAULT_LOG_NAME`].
pub fn program_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_NAME.to_owned())
}

/// printf-style [`Severity::Info`] record on the default logger.
pub fn infof(template: &str, args: &[Arg<'_>]) {
    logger().infof(template, args);
}

/// printf-style [`Severity::Warning`] record on the default logger.
pub fn warningf(template: &str, args: &[Arg<'_>]) {
    logger().warningf(template, args);
}

/// printf-style [`Severity::Error`] record on the default logger.
pub fn errorf(template: &str, args: &[Arg<'_>]) {
    logger().errorf(template, args);
}

/// printf-style [`Severity::Fatal`] record on the default logger, then exits
/// with status 1.
pub fn fatalf(template: &str, args: &[Arg<'_>]) -> ! {
    logger().fatalf(template, args)
}

/// Registers a hook on the default logger.
pub fn register_hook<F>(callback: F, min_level: Severity) -> usize
where
    F: Fn(&str) -> Result<(), HookError> + Send + Sync + 'static,
{
    logger().register_hook(callback, min_level)
}

/// Registers a hook receiving the severity too on the default logger.
pub fn register_level_hook<F>(callback: F, min_level: Severity) -> usize
where
    F: Fn(&str, Severity) -> Result<(), HookError> + Send + Sync + 'static,
{
    logger().register_level_hook(callback, min_level)
}

/// Changes the default logger's minimum severity.
pub fn set_min_level(level: Severity) {
    logger().set_min_level(level);
}

/// Changes the default logger's maximum message length.
pub fn set_max_len(max_len: usize) -> Result<(), ConfigError> {
    logger().set_max_len(max_len)
}

/// Sends everything the default logger writes to `writer` only.
pub fn set_output<W>(writer: W)
where
    W: Write + Send + 'static,
{
    logger().set_output(writer);
}

/// Moves the default logger's file to `path`.
pub fn set_filename(path: impl AsRef<Path>) -> Result<(), ConfigError> {
    logger().set_filename(path)
}

/// Flushes the default logger and closes its file.
pub fn close() -> Result<(), ConfigError> {
    logger().close()
}
