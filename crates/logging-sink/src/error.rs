//! crates/logging-sink/src/error.rs
//! Error type shared by the output sink and the rotating file destination.

use std::io;
use std::path::PathBuf;

use crate::sink::DestinationId;

/// Errors raised while configuring or writing to output destinations.
///
/// The hot write path never returns these to callers of
/// [`OutputSink::write_line`](crate::OutputSink::write_line). A failing
/// destination is removed, described once on the sink's fallback stream and
/// surfaced once through [`WriteReport::degraded`](crate::WriteReport::degraded);
/// compression and retention problems are only described on the fallback.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The active log file could not be opened.
    #[error("failed to open log file '{}': {source}", .path.display())]
    Open {
        /// Path of the log file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Archiving the active file or reopening a fresh one failed.
    #[error("failed to rotate log file '{}': {source}", .path.display())]
    Rotate {
        /// Path of the active log file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Compressing an archived file failed. The uncompressed archive is kept.
    #[error("failed to compress archive '{}': {source}", .path.display())]
    Compress {
        /// Path of the uncompressed archive.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Removing an archive during retention enforcement failed.
    #[error("failed to remove expired archive '{}': {source}", .path.display())]
    Prune {
        /// Path of the archive that could not be removed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Writing a line to a destination failed.
    #[error("failed to write to {destination}: {source}")]
    Write {
        /// Human readable description of the destination.
        destination: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Removing the destination would leave the sink without any output.
    #[error("refusing to remove the last output destination")]
    LastDestination,

    /// No destination with the given identifier is registered.
    #[error("no output destination with id {0}")]
    UnknownDestination(DestinationId),

    /// The rotation policy is unusable.
    #[error("invalid rotation policy: {0}")]
    InvalidPolicy(&'static str),
}
