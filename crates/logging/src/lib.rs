#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` is a leveled logger for services that want one line per event
//! on the console and in a rotating log file, plus in-process callbacks for
//! forwarding selected events elsewhere. Four severities are supported, from
//! [`Severity::Info`] to [`Severity::Fatal`]; a fatal record terminates the
//! process after it has been written.
//!
//! # Design
//!
//! A [`Logger`] owns four cooperating parts, each usable on its own:
//!
//! - [`LevelGate`] drops records below the configured minimum with a single
//!   atomic load, before any formatting work happens.
//! - [`Formatter`] renders a [`Message`] (literal text, `format_args!` output,
//!   or a printf-style template with [`Arg`] values) and truncates messages
//!   built from arguments to a maximum number of characters.
//! - [`HookRegistry`] calls registered callbacks in order. A failing or
//!   panicking hook is reported as a warning line and never stops the record.
//! - [`OutputSink`] (from `logging-sink`) writes the finished line to every
//!   destination under one lock, rotating the log file as it grows.
//!
//! # Invariants
//!
//! - Logging calls never return errors and never panic because a hook or a
//!   destination failed.
//! - Hooks run before the line is written, on the calling thread, with no
//!   logger lock held.
//! - Lines from concurrent callers are never interleaved.
//! - Only messages built from arguments are truncated; fixed text and
//!   templates without arguments are written whole.
//!
//! # Errors
//!
//! Configuration calls return [`ConfigError`]. Losing a destination at runtime
//! (an unwritable log file, a broken writer) is reported in-band: the logger
//! writes a fatal-severity record describing the failure to what remains,
//! passes it to the hooks, and continues. A lost file is replaced by the
//! console.
//!
//! # Examples
//!
//! ```
//! use logging::{Arg, Logger, RotationPolicy, Severity};
//!
//! let dir = tempfile::tempdir()?;
//! let logger = Logger::builder()
//!     .writer(Vec::new())
//!     .file(RotationPolicy::new(dir.path().join("worker.log")).with_max_size(1 << 20))
//!     .min_level(Severity::Info)
//!     .build()?;
//!
//! logger.register_hook(|message| {
//!     // forward to an alerting system
//!     let _ = message;
//!     Ok(())
//! }, Severity::Error);
//!
//! logger.infof("started %d workers", &[Arg::Int(4)]);
//! logger.error(format_args!("job {} failed", "nightly-export"));
//! logger.close()?;
//!
//! let written = std::fs::read_to_string(dir.path().join("worker.log"))?;
//! assert_eq!(written.lines().count(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod builder;
mod config;
mod error;
mod format;
mod gate;
mod hooks;
mod logger;
mod severity;

#[cfg(feature = "tracing")]
mod tracing_bridge;

pub use builder::LoggerBuilder;
pub use config::LoggerConfig;
pub use error::ConfigError;
pub use format::{
    Arg, DEFAULT_MAX_LEN, Formatter, LineFormat, Message, Record, TextFormat, sprintf, truncate,
};
pub use gate::LevelGate;
pub use hooks::{HookError, HookFailure, HookRegistry};
pub use logger::{FATAL_EXIT_CODE, Logger, ProcessExit, Terminate};
pub use severity::{ParseSeverityError, Severity};

#[cfg(feature = "tracing")]
pub use tracing_bridge::{HookLogLayer, init_tracing};

pub use logging_sink::{
    ConsoleTarget, Destination, DestinationId, DestinationKind, OutputSink, RotationPolicy,
    SinkError, WriteReport,
};
