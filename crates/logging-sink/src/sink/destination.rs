//! crates/logging-sink/src/sink/destination.rs
//! Output targets and their identifiers.

use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::console::{Console, ConsoleTarget};
use crate::error::SinkError;
use crate::policy::RotationPolicy;
use crate::rotate::RotatingFile;

/// Stable identifier assigned to a destination when it joins an
/// [`OutputSink`](crate::OutputSink).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct DestinationId(pub(crate) u64);

impl DestinationId {
    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A concrete output target owned by an [`OutputSink`](crate::OutputSink).
pub enum Destination {
    /// Standard output or standard error.
    Console(Console),
    /// Size-rotated log file.
    File(RotatingFile),
    /// Any caller-supplied writer.
    Writer(Box<dyn Write + Send>),
}

/// Description of a destination without access to its handle.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DestinationKind {
    /// Console destination and its stream.
    Console(ConsoleTarget),
    /// Rotating file destination and its active path.
    File(PathBuf),
    /// Caller-supplied writer.
    Writer,
}

impl Destination {
    /// Console destination for `target`.
    #[must_use]
    pub const fn console(target: ConsoleTarget) -> Self {
        Self::Console(Console::new(target))
    }

    /// Rotating file destination; the file is opened on first write.
    pub fn file(policy: RotationPolicy) -> Result<Self, SinkError> {
        RotatingFile::new(policy).map(Self::File)
    }

    /// Destination wrapping an arbitrary writer.
    pub fn writer<W>(writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self::Writer(Box::new(writer))
    }

    /// Returns the kind of this destination.
    #[must_use]
    pub fn kind(&self) -> DestinationKind {
        match self {
            Self::Console(console) => DestinationKind::Console(console.target()),
            Self::File(file) => DestinationKind::File(file.path().to_path_buf()),
            Self::Writer(_) => DestinationKind::Writer,
        }
    }

    pub(crate) const fn is_console(&self) -> bool {
        matches!(self, Self::Console(_))
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Console(console) => console.target().to_string(),
            Self::File(file) => format!("log file '{}'", file.path().display()),
            Self::Writer(_) => "custom writer".to_owned(),
        }
    }

    pub(crate) fn flush(&mut self) -> Result<(), SinkError> {
        let result = match self {
            Self::Console(console) => console.flush(),
            Self::File(file) => return file.flush(),
            Self::Writer(writer) => writer.flush(),
        };
        result.map_err(|source| self.write_error(source))
    }

    pub(crate) fn write_error(&self, source: io::Error) -> SinkError {
        SinkError::Write {
            destination: self.describe(),
            source,
        }
    }
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Console(console) => f.debug_tuple("Console").field(console).finish(),
            Self::File(file) => f.debug_tuple("File").field(file).finish(),
            Self::Writer(_) => f.debug_tuple("Writer").finish_non_exhaustive(),
        }
    }
}

impl From<Console> for Destination {
    fn from(console: Console) -> Self {
        Self::Console(console)
    }
}

impl From<RotatingFile> for Destination {
    fn from(file: RotatingFile) -> Self {
        Self::File(file)
    }
}
