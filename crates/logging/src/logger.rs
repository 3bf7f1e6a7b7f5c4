//! crates/logging/src/logger.rs
//! The logger facade tying gate, formatter, hooks and sink together.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use logging_sink::{Destination, DestinationId, DestinationKind, OutputSink, RotationPolicy, WriteReport};

use crate::builder::LoggerBuilder;
use crate::config::LoggerConfig;
use crate::error::ConfigError;
use crate::format::{Arg, Formatter, LineFormat, Message, Record};
use crate::gate::LevelGate;
use crate::hooks::{HookError, HookRegistry};
use crate::severity::Severity;

/// Exit status used after a fatal record.
pub const FATAL_EXIT_CODE: i32 = 1;

/// Ends the process after a fatal record has been written.
pub trait Terminate: Send + Sync {
    /// Terminates with `code`. Must not return.
    fn terminate(&self, code: i32) -> !;
}

/// Terminates through [`std::process::exit`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessExit;

impl Terminate for ProcessExit {
    fn terminate(&self, code: i32) -> ! {
        std::process::exit(code)
    }
}

/// A leveled logger.
///
/// Each call runs on the calling thread: the severity gate, rendering and
/// truncation, the hooks in registration order, then one line to every output
/// destination. Nothing on that path returns an error.
///
/// # Examples
///
/// ```
/// use logging::{Arg, Logger, Severity};
///
/// let logger = Logger::builder().writer(Vec::new()).build()?;
/// logger.set_min_level(Severity::Warning);
/// logger.register_hook(|message| {
///     assert_eq!(message, "disk 91% full");
///     Ok(())
/// }, Severity::Warning);
///
/// logger.infof("dropped", &[]);
/// logger.warningf("disk %d%% full", &[Arg::Int(91)]);
/// # Ok::<(), logging::ConfigError>(())
/// ```
pub struct Logger {
    gate: LevelGate,
    formatter: Formatter,
    hooks: HookRegistry,
    sink: OutputSink,
    line_format: Box<dyn LineFormat>,
    terminator: Box<dyn Terminate>,
}

impl Logger {
    /// A logger writing to stdout with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(
            LevelGate::default(),
            Formatter::default(),
            OutputSink::default(),
            Box::new(crate::format::TextFormat::new()),
            Box::new(ProcessExit),
        )
    }

    /// Builds a logger from a validated configuration.
    pub fn from_config(config: LoggerConfig) -> Result<Self, ConfigError> {
        LoggerBuilder::from_config(config).build()
    }

    /// Starts a [`LoggerBuilder`].
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub(crate) fn from_parts(
        gate: LevelGate,
        formatter: Formatter,
        sink: OutputSink,
        line_format: Box<dyn LineFormat>,
        terminator: Box<dyn Terminate>,
    ) -> Self {
        Self {
            gate,
            formatter,
            hooks: HookRegistry::new(),
            sink,
            line_format,
            terminator,
        }
    }

    /// Reports whether a record at `level` would be logged.
    #[must_use]
    pub fn is_enabled(&self, level: Severity) -> bool {
        self.gate.should_log(level)
    }

    /// Logs `message` at `level`.
    ///
    /// A [`Severity::Fatal`] record terminates the process once written.
    pub fn log<'a>(&self, level: Severity, message: impl Into<Message<'a>>) {
        if level == Severity::Fatal {
            self.log_fatal(message.into());
        }
        if self.gate.should_log(level) {
            self.dispatch(level, &message.into());
        }
    }

    /// Logs pre-built `format_args!` output at [`Severity::Info`].
    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Severity::Info, Message::Args(args));
    }

    /// Logs pre-built `format_args!` output at [`Severity::Warning`].
    pub fn warning(&self, args: fmt::Arguments<'_>) {
        self.log(Severity::Warning, Message::Args(args));
    }

    /// Logs pre-built `format_args!` output at [`Severity::Error`].
    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Severity::Error, Message::Args(args));
    }

    /// Logs at [`Severity::Fatal`] and terminates the process.
    pub fn fatal(&self, args: fmt::Arguments<'_>) -> ! {
        self.log_fatal(Message::Args(args))
    }

    /// printf-style [`Severity::Info`] record.
    pub fn infof(&self, template: &str, args: &[Arg<'_>]) {
        self.log(Severity::Info, Message::Printf { template, args });
    }

    /// printf-style [`Severity::Warning`] record.
    pub fn warningf(&self, template: &str, args: &[Arg<'_>]) {
        self.log(Severity::Warning, Message::Printf { template, args });
    }

    /// printf-style [`Severity::Error`] record.
    pub fn errorf(&self, template: &str, args: &[Arg<'_>]) {
        self.log(Severity::Error, Message::Printf { template, args });
    }

    /// printf-style [`Severity::Fatal`] record; terminates the process.
    pub fn fatalf(&self, template: &str, args: &[Arg<'_>]) -> ! {
        self.log_fatal(Message::Printf { template, args })
    }

    /// Writes a fatal record, flushes every destination and terminates.
    ///
    /// Hook failures are reported like on any other record but cannot prevent
    /// termination.
    pub fn log_fatal(&self, message: Message<'_>) -> ! {
        self.dispatch(Severity::Fatal, &message);
        self.sink.flush();
        self.terminator.terminate(FATAL_EXIT_CODE)
    }

    fn dispatch(&self, level: Severity, message: &Message<'_>) {
        let text = self.formatter.render(message);
        let failures = self.hooks.invoke(level, &text);
        let report = self.emit(level, &text);
        self.escalate(report);
        for failure in failures {
            let report = self.emit(Severity::Warning, &failure.to_string());
            self.escalate(report);
        }
    }

    fn emit(&self, level: Severity, text: &str) -> WriteReport {
        let line = self.line_format.format(&Record::now(level, text));
        self.sink.write_line(line.as_bytes())
    }

    /// Surfaces the loss of a destination as a fatal-severity record.
    ///
    /// The process keeps running: the record goes to the remaining
    /// destinations and to the hooks.
    fn escalate(&self, mut report: WriteReport) {
        while let Some(error) = report.degraded.take() {
            let text = format!("log destination dropped after failure: {error}");
            let failures = self.hooks.invoke(Severity::Fatal, &text);
            report = self.emit(Severity::Fatal, &text);
            for failure in failures {
                let extra = self.emit(Severity::Warning, &failure.to_string());
                if report.degraded.is_none() {
                    report.degraded = extra.degraded;
                }
            }
        }
    }

    /// Current minimum severity.
    #[must_use]
    pub fn min_level(&self) -> Severity {
        self.gate.min_level()
    }

    /// Drops every record below `level`.
    pub fn set_min_level(&self, level: Severity) {
        self.gate.set_min_level(level);
    }

    /// Current maximum length of messages built from arguments.
    #[must_use]
    pub fn max_len(&self) -> usize {
        self.formatter.max_len()
    }

    /// Changes the maximum length of messages built from arguments.
    pub fn set_max_len(&self, max_len: usize) -> Result<(), ConfigError> {
        self.formatter.set_max_len(max_len)
    }

    /// Registers a hook receiving the rendered message. Returns its index.
    pub fn register_hook<F>(&self, callback: F, min_level: Severity) -> usize
    where
        F: Fn(&str) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.hooks.register(callback, min_level)
    }

    /// Registers a hook receiving the rendered message and its severity.
    pub fn register_level_hook<F>(&self, callback: F, min_level: Severity) -> usize
    where
        F: Fn(&str, Severity) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.hooks.register_leveled(callback, min_level)
    }

    /// The hook registry.
    #[must_use]
    pub const fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// The output sink.
    #[must_use]
    pub const fn sink(&self) -> &OutputSink {
        &self.sink
    }

    /// Replaces every destination with `writer`.
    pub fn set_output<W>(&self, writer: W)
    where
        W: Write + Send + 'static,
    {
        self.sink.set_output(writer);
    }

    /// Moves the log file to `path`, adding a file destination if none exists.
    pub fn set_filename(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        Ok(self.sink.set_filename(path)?)
    }

    /// Active log file path, if any.
    #[must_use]
    pub fn filename(&self) -> Option<PathBuf> {
        self.sink.filename()
    }

    /// Replaces the rotation policy of the file destination.
    pub fn set_rotation_policy(&self, policy: RotationPolicy) -> Result<(), ConfigError> {
        if policy.path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        Ok(self.sink.set_rotation_policy(policy)?)
    }

    /// Adds an output destination.
    pub fn add_destination(&self, destination: Destination) -> DestinationId {
        self.sink.add_destination(destination)
    }

    /// Removes an output destination. The last one cannot be removed.
    pub fn remove_destination(&self, id: DestinationId) -> Result<Destination, ConfigError> {
        Ok(self.sink.remove_destination(id)?)
    }

    /// Lists output destinations in write order.
    #[must_use]
    pub fn destinations(&self) -> Vec<(DestinationId, DestinationKind)> {
        self.sink.destinations()
    }

    /// Flushes every destination.
    pub fn flush(&self) {
        self.sink.flush();
    }

    /// Flushes everything and closes the log file.
    ///
    /// Logging keeps working afterwards on the remaining destinations, or on
    /// stdout if only the file was configured.
    pub fn close(&self) -> Result<(), ConfigError> {
        Ok(self.sink.close()?)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("min_level", &self.gate.min_level())
            .field("max_len", &self.formatter.max_len())
            .field("hooks", &self.hooks.len())
            .field("sink", &self.sink)
            .finish_non_exhaustive()
    }
}
