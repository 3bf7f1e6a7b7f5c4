//! crates/logging/src/builder.rs
//! Step-by-step construction of a [`Logger`].

use std::fmt;
use std::io::Write;

use logging_sink::{ConsoleTarget, Destination, OutputSink, RotationPolicy};

use crate::config::LoggerConfig;
use crate::error::ConfigError;
use crate::format::{DEFAULT_MAX_LEN, Formatter, LineFormat, TextFormat};
use crate::gate::LevelGate;
use crate::logger::{Logger, ProcessExit, Terminate};
use crate::severity::Severity;

enum Pending {
    Ready(Destination),
    File(RotationPolicy),
}

/// Builder for [`Logger`].
///
/// Destinations are written in the order they are added. A builder with no
/// destination produces a logger writing to stdout.
///
/// # Examples
///
/// ```
/// use logging::{ConsoleTarget, Logger, RotationPolicy, Severity};
///
/// let dir = tempfile::tempdir()?;
/// let logger = Logger::builder()
///     .min_level(Severity::Warning)
///     .console(ConsoleTarget::Stderr)
///     .file(RotationPolicy::new(dir.path().join("api.log")).with_max_backups(5))
///     .build()?;
/// assert_eq!(logger.destinations().len(), 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct LoggerBuilder {
    min_level: Severity,
    max_len: usize,
    destinations: Vec<Pending>,
    line_format: Option<Box<dyn LineFormat>>,
    colors: bool,
    fallback: Option<Box<dyn Write + Send>>,
    terminator: Option<Box<dyn Terminate>>,
}

impl LoggerBuilder {
    /// A builder with default settings and no destinations.
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_level: Severity::Info,
            max_len: DEFAULT_MAX_LEN,
            destinations: Vec::new(),
            line_format: None,
            colors: false,
            fallback: None,
            terminator: None,
        }
    }

    /// A builder preloaded from `config`.
    #[must_use]
    pub fn from_config(config: LoggerConfig) -> Self {
        let mut builder = Self::new()
            .min_level(config.min_level)
            .max_len(config.max_len)
            .colors(config.colors);
        if let Some(target) = config.console {
            builder = builder.console(target);
        }
        if let Some(policy) = config.file {
            builder = builder.file(policy);
        }
        builder
    }

    /// Sets the minimum severity.
    #[must_use]
    pub const fn min_level(mut self, level: Severity) -> Self {
        self.min_level = level;
        self
    }

    /// Sets the maximum message length.
    #[must_use]
    pub const fn max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    /// Adds a console destination.
    #[must_use]
    pub fn console(mut self, target: ConsoleTarget) -> Self {
        self.destinations
            .push(Pending::Ready(Destination::console(target)));
        self
    }

    /// Adds a rotating file destination.
    #[must_use]
    pub fn file(mut self, policy: RotationPolicy) -> Self {
        self.destinations.push(Pending::File(policy));
        self
    }

    /// Adds a caller-supplied writer.
    #[must_use]
    pub fn writer<W>(mut self, writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        self.destinations
            .push(Pending::Ready(Destination::writer(writer)));
        self
    }

    /// Adds a prepared destination.
    #[must_use]
    pub fn destination(mut self, destination: Destination) -> Self {
        self.destinations.push(Pending::Ready(destination));
        self
    }

    /// Replaces the default line layout.
    #[must_use]
    pub fn line_format<F>(mut self, format: F) -> Self
    where
        F: LineFormat + 'static,
    {
        self.line_format = Some(Box::new(format));
        self
    }

    /// Enables ANSI colors in the default line layout.
    #[must_use]
    pub const fn colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    /// Replaces the stream receiving reports about failing destinations.
    #[must_use]
    pub fn fallback<W>(mut self, fallback: W) -> Self
    where
        W: Write + Send + 'static,
    {
        self.fallback = Some(Box::new(fallback));
        self
    }

    /// Replaces how the process is ended after a fatal record.
    #[must_use]
    pub fn terminator<T>(mut self, terminator: T) -> Self
    where
        T: Terminate + 'static,
    {
        self.terminator = Some(Box::new(terminator));
        self
    }

    /// Validates the settings and builds the logger.
    ///
    /// Log files are not opened here; each is created on its first write.
    pub fn build(self) -> Result<Logger, ConfigError> {
        let formatter = Formatter::new(self.max_len)?;

        let mut destinations = Vec::with_capacity(self.destinations.len());
        for pending in self.destinations {
            destinations.push(match pending {
                Pending::Ready(destination) => destination,
                Pending::File(policy) => {
                    if policy.path.as_os_str().is_empty() {
                        return Err(ConfigError::EmptyPath);
                    }
                    Destination::file(policy)?
                }
            });
        }

        let mut sink = OutputSink::new(destinations);
        if let Some(fallback) = self.fallback {
            sink = sink.with_fallback(fallback);
        }

        let colors = self.colors;
        let line_format = self
            .line_format
            .unwrap_or_else(|| Box::new(TextFormat::new().with_colors(colors)));
        let terminator = self.terminator.unwrap_or_else(|| Box::new(ProcessExit));

        Ok(Logger::from_parts(
            LevelGate::new(self.min_level),
            formatter,
            sink,
            line_format,
            terminator,
        ))
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LoggerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerBuilder")
            .field("min_level", &self.min_level)
            .field("max_len", &self.max_len)
            .field("destinations", &self.destinations.len())
            .field("colors", &self.colors)
            .finish_non_exhaustive()
    }
}
