//! crates/logging-sink/src/rotate/mod.rs
//! Size-triggered rotating log file.

mod archive;

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use time::OffsetDateTime;

use crate::error::SinkError;
use crate::policy::RotationPolicy;

/// Result of a successful [`RotatingFile::write_line`] or [`RotatingFile::rotate`].
///
/// Failures that do not prevent the line from being written (compression or
/// retention problems) are collected in `warnings` so the caller can report
/// them without treating the write as failed.
#[derive(Debug, Default)]
pub struct RotationOutcome {
    /// Path of the archive produced when the write triggered a rotation.
    pub archived: Option<PathBuf>,
    /// Archives removed by retention enforcement.
    pub pruned: Vec<PathBuf>,
    /// Non-fatal problems encountered while archiving.
    pub warnings: Vec<SinkError>,
}

/// A log file that rotates once it would grow beyond a size threshold.
///
/// The file is opened lazily on the first write, creating missing parent
/// directories and appending to any existing content. When the next line would
/// push the file past [`RotationPolicy::max_size_bytes`], the current file is
/// archived and the line is written to a fresh file. A line is never split
/// across files, so a single line larger than the threshold lands alone in a
/// new file.
///
/// # Examples
///
/// ```
/// use logging_sink::{RotatingFile, RotationPolicy};
///
/// let dir = tempfile::tempdir()?;
/// let policy = RotationPolicy::new(dir.path().join("app.log"))
///     .with_max_size(16)
///     .with_compress(false);
/// let mut file = RotatingFile::new(policy)?;
///
/// file.write_line(b"0123456789\n")?;
/// let outcome = file.write_line(b"abcdefghij\n")?;
/// assert!(outcome.archived.is_some());
/// assert_eq!(std::fs::read(dir.path().join("app.log"))?, b"abcdefghij\n");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct RotatingFile {
    policy: RotationPolicy,
    file: Option<File>,
    size: u64,
    open: OpenFn,
}

type OpenFn = fn(&Path) -> io::Result<(File, u64)>;

impl fmt::Debug for RotatingFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotatingFile")
            .field("policy", &self.policy)
            .field("is_open", &self.file.is_some())
            .field("size", &self.size)
            .finish()
    }
}

impl RotatingFile {
    /// Creates a rotating file without touching the filesystem.
    pub fn new(policy: RotationPolicy) -> Result<Self, SinkError> {
        policy.validate()?;
        Ok(Self {
            policy,
            file: None,
            size: 0,
            open: open_append,
        })
    }

    /// Replaces how the active file is opened.
    #[cfg(test)]
    pub(crate) fn with_opener(mut self, open: OpenFn) -> Self {
        self.open = open;
        self
    }

    /// Creates a rotating file and opens it immediately.
    pub fn open(policy: RotationPolicy) -> Result<Self, SinkError> {
        let mut file = Self::new(policy)?;
        file.ensure_open()?;
        Ok(file)
    }

    /// Returns the active policy.
    pub const fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    /// Returns the path of the active file.
    pub fn path(&self) -> &Path {
        &self.policy.path
    }

    /// Returns the number of bytes in the active file.
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Reports whether a file handle is currently open.
    pub const fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn ensure_open(&mut self) -> Result<(), SinkError> {
        if self.file.is_none() {
            let (file, size) =
                (self.open)(&self.policy.path).map_err(|source| SinkError::Open {
                    path: self.policy.path.clone(),
                    source,
                })?;
            self.file = Some(file);
            self.size = size;
        }
        Ok(())
    }

    /// Writes one complete line, rotating first when the line would overflow.
    ///
    /// Any rotation is finished (compression and retention included) before
    /// this returns.
    pub fn write_line(&mut self, line: &[u8]) -> Result<RotationOutcome, SinkError> {
        let job = self.write_line_deferred(line)?;
        Ok(job.map(ArchiveJob::run).unwrap_or_default())
    }

    /// Writes one complete line like [`write_line`](Self::write_line) but
    /// leaves compression and retention of a triggered rotation to the caller.
    ///
    /// The rename and the reopen of the active file happen here; the returned
    /// [`ArchiveJob`] only touches archives and can run without access to this
    /// file.
    pub fn write_line_deferred(&mut self, line: &[u8]) -> Result<Option<ArchiveJob>, SinkError> {
        self.ensure_open()?;

        let incoming = line.len() as u64;
        let mut job = None;
        if self.size > 0 && self.size.saturating_add(incoming) > self.policy.max_size_bytes {
            job = Some(self.rotate_deferred()?);
        }

        let Some(file) = self.file.as_mut() else {
            return Err(SinkError::Open {
                path: self.policy.path.clone(),
                source: io::Error::other("log file is not open"),
            });
        };
        file.write_all(line).map_err(|source| SinkError::Write {
            destination: format!("log file '{}'", self.policy.path.display()),
            source,
        })?;
        self.size = self.size.saturating_add(incoming);
        Ok(job)
    }

    /// Archives the active file and opens a fresh one.
    ///
    /// Renaming or reopening failures leave the file closed and are returned as
    /// [`SinkError::Rotate`]. Compression and retention run afterwards; their
    /// failures are reported through [`RotationOutcome::warnings`].
    pub fn rotate(&mut self) -> Result<RotationOutcome, SinkError> {
        self.rotate_deferred().map(ArchiveJob::run)
    }

    fn rotate_deferred(&mut self) -> Result<ArchiveJob, SinkError> {
        let path = self.policy.path.clone();
        let rotate_error = |source| SinkError::Rotate {
            path: path.clone(),
            source,
        };

        if let Some(mut file) = self.file.take() {
            let _ = file.flush();
        }
        self.size = 0;

        let now = OffsetDateTime::now_utc();
        let archived = if path.exists() {
            let target = archive::archive_path(&path, now);
            fs::rename(&path, &target).map_err(rotate_error)?;
            Some(target)
        } else {
            None
        };

        let (file, size) = (self.open)(&path).map_err(rotate_error)?;
        self.file = Some(file);
        self.size = size;

        Ok(ArchiveJob {
            policy: self.policy.clone(),
            archived,
            rotated_at: now,
        })
    }

    /// Switches to a new policy, closing the current file and opening the new one.
    ///
    /// The new file is opened before the old handle is released, so a failure
    /// leaves the previous configuration in effect.
    pub fn reconfigure(&mut self, policy: RotationPolicy) -> Result<(), SinkError> {
        policy.validate()?;
        let (file, size) = (self.open)(&policy.path).map_err(|source| SinkError::Open {
            path: policy.path.clone(),
            source,
        })?;
        if let Some(mut previous) = self.file.replace(file) {
            let _ = previous.flush();
        }
        self.size = size;
        self.policy = policy;
        Ok(())
    }

    /// Flushes buffered data of the active file.
    pub fn flush(&mut self) -> Result<(), SinkError> {
        match self.file.as_mut() {
            Some(file) => file.flush().map_err(|source| SinkError::Write {
                destination: format!("log file '{}'", self.policy.path.display()),
                source,
            }),
            None => Ok(()),
        }
    }

    /// Flushes and closes the active file. The next write reopens it.
    pub fn close(&mut self) -> Result<(), SinkError> {
        let result = self.flush();
        self.file = None;
        self.size = 0;
        result
    }
}

/// Compression and retention left over from a rotation.
///
/// Produced by [`RotatingFile::write_line_deferred`] once the active file has
/// been renamed and reopened. Running it needs no access to the
/// [`RotatingFile`], so callers that guard the file with a lock can run it
/// after releasing that lock.
#[derive(Debug)]
#[must_use = "an archive job does nothing until it is run"]
pub struct ArchiveJob {
    policy: RotationPolicy,
    archived: Option<PathBuf>,
    rotated_at: OffsetDateTime,
}

impl ArchiveJob {
    /// Returns the uncompressed archive produced by the rotation, if any.
    pub fn archive(&self) -> Option<&Path> {
        self.archived.as_deref()
    }

    /// Compresses the archive when the policy asks for it, then enforces
    /// retention next to the active file.
    pub fn run(self) -> RotationOutcome {
        let mut outcome = RotationOutcome {
            archived: self.archived,
            ..RotationOutcome::default()
        };

        if self.policy.compress {
            if let Some(target) = outcome.archived.take() {
                outcome.archived = Some(match archive::compress(&target) {
                    Ok(compressed) => compressed,
                    Err(error) => {
                        outcome.warnings.push(error);
                        target
                    }
                });
            }
        }

        let pruned = archive::prune(&self.policy.path, &self.policy, self.rotated_at);
        outcome.pruned = pruned.removed;
        outcome.warnings.extend(pruned.failures);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "hooklog::rotate",
            path = %self.policy.path.display(),
            archived = ?outcome.archived,
            pruned = outcome.pruned.len(),
            "rotated log file"
        );

        outcome
    }
}

fn open_append(path: &Path) -> io::Result<(File, u64)> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let size = file.metadata()?.len();
    Ok((file, size))
}

/// Opens like the real file but refuses once an archive sits next to it, the
/// way a directory that turned read-only after rotation started would.
#[cfg(test)]
pub(crate) fn refuse_after_archive(path: &Path) -> io::Result<(File, u64)> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let archived = fs::read_dir(parent)?
        .filter_map(Result::ok)
        .any(|entry| entry.path() != path);
    if archived {
        return Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "log directory is read-only",
        ));
    }
    open_append(path)
}
