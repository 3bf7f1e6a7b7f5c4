//! crates/logging-sink/src/console.rs
//! Standard stream destinations.

use std::fmt;
use std::io::{self, Write};

/// Which standard stream a [`Console`] destination writes to.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ConsoleTarget {
    /// Standard output.
    #[default]
    Stdout,
    /// Standard error.
    Stderr,
}

impl ConsoleTarget {
    /// Returns the stream name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

impl fmt::Display for ConsoleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Console destination writing whole lines to stdout or stderr.
///
/// Each line is written while holding the standard stream's lock and flushed
/// immediately, so output from other code in the process cannot split it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Console {
    target: ConsoleTarget,
}

impl Console {
    /// Creates a console destination for `target`.
    #[must_use]
    pub const fn new(target: ConsoleTarget) -> Self {
        Self { target }
    }

    /// Console writing to standard output.
    #[must_use]
    pub const fn stdout() -> Self {
        Self::new(ConsoleTarget::Stdout)
    }

    /// Console writing to standard error.
    #[must_use]
    pub const fn stderr() -> Self {
        Self::new(ConsoleTarget::Stderr)
    }

    /// Returns the stream this console writes to.
    #[must_use]
    pub const fn target(&self) -> ConsoleTarget {
        self.target
    }

    /// Writes `line` and flushes the stream.
    pub fn write_line(&self, line: &[u8]) -> io::Result<()> {
        match self.target {
            ConsoleTarget::Stdout => write_locked(&mut io::stdout().lock(), line),
            ConsoleTarget::Stderr => write_locked(&mut io::stderr().lock(), line),
        }
    }

    /// Flushes the stream.
    pub fn flush(&self) -> io::Result<()> {
        match self.target {
            ConsoleTarget::Stdout => io::stdout().flush(),
            ConsoleTarget::Stderr => io::stderr().flush(),
        }
    }
}

fn write_locked(stream: &mut impl Write, line: &[u8]) -> io::Result<()> {
    stream.write_all(line)?;
    stream.flush()
}
