#![deny(unsafe_code)]
#![deny(missing_docs)]

//! crates/test-support/src/lib.rs
//!
//! Writers and fixtures shared by the workspace's unit and integration tests.
//!
//! Nothing here depends on the logging crates, so every crate can list this one
//! as a dev-dependency without creating a cycle.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tempfile::TempDir;

/// Cloneable in-memory writer; all clones append to the same buffer.
#[derive(Clone, Debug, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything written so far, lossily decoded as UTF-8.
    #[must_use]
    pub fn contents(&self) -> String {
        let bytes = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Returns the written output split into lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }

    /// Returns the message text of every line, with the level label and
    /// timestamp prefix removed.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.lines().iter().map(|line| message_of(line).to_owned()).collect()
    }

    /// Discards everything written so far.
    pub fn clear(&self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Returns the text following the `LABEL[timestamp] ` prefix of a log line.
///
/// Lines without the prefix are returned unchanged.
#[must_use]
pub fn message_of(line: &str) -> &str {
    line.split_once("] ").map_or(line, |(_, message)| message)
}

/// Writer whose every operation fails with the configured error kind.
#[derive(Clone, Copy, Debug)]
pub struct FailingWriter {
    kind: io::ErrorKind,
}

impl FailingWriter {
    /// Writer failing with [`io::ErrorKind::BrokenPipe`].
    #[must_use]
    pub const fn new() -> Self {
        Self::with_kind(io::ErrorKind::BrokenPipe)
    }

    /// Writer failing with `kind`.
    #[must_use]
    pub const fn with_kind(kind: io::ErrorKind) -> Self {
        Self { kind }
    }
}

impl Default for FailingWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(self.kind, "injected write failure"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(self.kind, "injected flush failure"))
    }
}

/// Temporary directory holding log files for one test.
///
/// The directory and everything in it is removed on drop.
#[derive(Debug)]
pub struct LogDir {
    dir: TempDir,
}

impl LogDir {
    /// Creates a fresh temporary directory.
    ///
    /// # Panics
    ///
    /// Panics when the directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temporary log directory"),
        }
    }

    /// Returns the directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns the path of `name` inside the directory.
    #[must_use]
    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Returns the sorted file names currently in the directory.
    #[must_use]
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.dir.path())
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|entry| entry.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Reads a file in the directory, returning an empty string when missing.
    #[must_use]
    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.join(name)).unwrap_or_default()
    }
}

impl Default for LogDir {
    fn default() -> Self {
        Self::new()
    }
}
