//! crates/logging-sink/src/policy.rs
//! Rotation and retention settings for the rotating file destination.

use std::path::{Path, PathBuf};

use crate::error::SinkError;

/// Default size threshold before the active file is rotated (5 MiB).
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 5 * 1024 * 1024;

/// Directory that holds log files when no explicit path is configured.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Base name used when the program name cannot be determined.
pub const DEFAULT_LOG_NAME: &str = "misc";

/// Rotation and retention policy for a [`RotatingFile`](crate::RotatingFile).
///
/// `max_backups` and `max_age_days` use `0` to mean "unlimited", matching the
/// conventions of common rotation libraries. Retention is enforced each time
/// the file rotates rather than on a timer.
///
/// # Examples
///
/// ```
/// use logging_sink::RotationPolicy;
///
/// let policy = RotationPolicy::new("logs/api.log")
///     .with_max_size(1024 * 1024)
///     .with_max_backups(3)
///     .with_compress(false);
/// assert_eq!(policy.max_backups, 3);
/// assert!(policy.validate().is_ok());
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RotationPolicy {
    /// Path of the active log file.
    pub path: PathBuf,
    /// Size in bytes that triggers rotation when exceeded.
    pub max_size_bytes: u64,
    /// Number of archives to keep; `0` keeps all of them.
    pub max_backups: usize,
    /// Maximum archive age in days; `0` disables age-based removal.
    pub max_age_days: u32,
    /// Whether archives are gzip-compressed after rotation.
    pub compress: bool,
}

impl RotationPolicy {
    /// Creates a policy for `path` with the default thresholds.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
            max_backups: 0,
            max_age_days: 0,
            compress: true,
        }
    }

    /// Creates a policy using the `logs/<name>.log` path pattern.
    pub fn for_name(name: &str) -> Self {
        Self::new(default_path_for(name))
    }

    /// Sets the rotation threshold in bytes.
    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_size_bytes = bytes;
        self
    }

    /// Sets how many archives are retained.
    pub fn with_max_backups(mut self, backups: usize) -> Self {
        self.max_backups = backups;
        self
    }

    /// Sets the maximum archive age in days.
    pub fn with_max_age_days(mut self, days: u32) -> Self {
        self.max_age_days = days;
        self
    }

    /// Enables or disables gzip compression of archives.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Returns a copy of the policy pointing at a different file.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Checks that the policy can drive a rotating file.
    pub fn validate(&self) -> Result<(), SinkError> {
        if self.path.as_os_str().is_empty() {
            return Err(SinkError::InvalidPolicy("log file path is empty"));
        }
        if self.path.file_name().is_none() {
            return Err(SinkError::InvalidPolicy("log file path has no file name"));
        }
        if self.max_size_bytes == 0 {
            return Err(SinkError::InvalidPolicy("maximum size must be non-zero"));
        }
        Ok(())
    }
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self::for_name(DEFAULT_LOG_NAME)
    }
}

/// Returns `logs/<name>.log`.
pub fn default_path_for(name: &str) -> PathBuf {
    Path::new(DEFAULT_LOG_DIR).join(format!("{name}.log"))
}
