#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! crates/logging-sink/src/lib.rs
//!
//! # Overview
//!
//! `logging-sink` owns everything that happens to a log line after it has been
//! rendered: fanning it out to the console, to caller-supplied writers, and to
//! a size-rotated log file whose archives are optionally gzip-compressed and
//! pruned by count and age.
//!
//! # Design
//!
//! [`OutputSink`] keeps an ordered list of [`Destination`]s behind a single
//! mutex. Each [`OutputSink::write_line`] call holds the lock for the complete
//! line, which is what keeps concurrent lines from interleaving in any
//! destination. [`RotatingFile`] is the file destination; it opens lazily,
//! appends to existing content, and rotates *before* a line that would push it
//! past [`RotationPolicy::max_size_bytes`].
//!
//! # Invariants
//!
//! - The destination list is never empty.
//! - A line is written whole to one file; it is never split across a rotation.
//! - At most [`RotationPolicy::max_backups`] archives remain after a rotation
//!   when the limit is non-zero.
//! - Write failures never propagate to the code that produced the log line.
//!
//! # Errors
//!
//! Configuration calls return [`SinkError`]. The write path drops a destination
//! whose write fails, describes it once on a fallback stream (stderr by
//! default) and surfaces it once through [`WriteReport::degraded`].
//!
//! # Examples
//!
//! ```
//! use logging_sink::{Destination, OutputSink, RotationPolicy};
//!
//! let dir = tempfile::tempdir()?;
//! let policy = RotationPolicy::new(dir.path().join("service.log"));
//! let sink = OutputSink::new(vec![Destination::file(policy)?]);
//!
//! sink.write_line(b"INFO[2024-01-01 00:00:00] started\n");
//! sink.flush();
//!
//! let written = std::fs::read_to_string(dir.path().join("service.log"))?;
//! assert!(written.ends_with("started\n"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod console;
mod error;
mod policy;
mod rotate;
mod sink;

pub use console::{Console, ConsoleTarget};
pub use error::SinkError;
pub use policy::{
    DEFAULT_LOG_DIR, DEFAULT_LOG_NAME, DEFAULT_MAX_SIZE_BYTES, RotationPolicy, default_path_for,
};
pub use rotate::{ArchiveJob, RotatingFile, RotationOutcome};
pub use sink::{Destination, DestinationId, DestinationKind, OutputSink, WriteReport};
