//! crates/logging/src/format/line.rs
//! Turning a record into one output line.

use std::fmt::Write as _;

use time::OffsetDateTime;
use time::format_description::FormatItem;
use time::macros::format_description;

use crate::severity::Severity;

const TIMESTAMP: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// One log event on its way to the sink. Lives only for the duration of a call.
#[derive(Clone, Copy, Debug)]
pub struct Record<'a> {
    /// When the event was logged.
    pub timestamp: OffsetDateTime,
    /// Severity of the event.
    pub severity: Severity,
    /// Rendered and truncated message text.
    pub text: &'a str,
}

impl<'a> Record<'a> {
    /// Creates a record stamped with the current local time.
    ///
    /// Falls back to UTC when the local offset cannot be determined, which is
    /// the case on some platforms once the process has spawned threads.
    #[must_use]
    pub fn now(severity: Severity, text: &'a str) -> Self {
        Self {
            timestamp: OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc()),
            severity,
            text,
        }
    }
}

/// Renders records into newline-terminated lines.
pub trait LineFormat: Send + Sync {
    /// Formats `record`; the result must end with exactly one `\n`.
    fn format(&self, record: &Record<'_>) -> String;
}

impl<F> LineFormat for F
where
    F: Fn(&Record<'_>) -> String + Send + Sync,
{
    fn format(&self, record: &Record<'_>) -> String {
        self(record)
    }
}

/// The default `LEVL[YYYY-MM-DD HH:MM:SS] message` line layout.
///
/// # Examples
///
/// ```
/// use logging::{LineFormat, Record, Severity, TextFormat};
/// use time::macros::datetime;
///
/// let record = Record {
///     timestamp: datetime!(2024-03-01 09:15:00 UTC),
///     severity: Severity::Warning,
///     text: "disk almost full",
/// };
/// assert_eq!(
///     TextFormat::new().format(&record),
///     "WARN[2024-03-01 09:15:00] disk almost full\n"
/// );
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TextFormat {
    colors: bool,
}

impl TextFormat {
    /// Plain text without terminal colors.
    #[must_use]
    pub const fn new() -> Self {
        Self { colors: false }
    }

    /// Enables or disables ANSI colors on the level label.
    #[must_use]
    pub const fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    /// Reports whether colors are enabled.
    #[must_use]
    pub const fn colors(&self) -> bool {
        self.colors
    }
}

const fn color_code(severity: Severity) -> u8 {
    match severity {
        Severity::Info => 36,
        Severity::Warning => 33,
        Severity::Error | Severity::Fatal => 31,
    }
}

impl LineFormat for TextFormat {
    fn format(&self, record: &Record<'_>) -> String {
        let text = record.text.strip_suffix('\n').unwrap_or(record.text);
        let mut line = String::with_capacity(text.len() + 40);
        let label = record.severity.label();
        if self.colors {
            let _ = write!(line, "\x1b[{}m{label}\x1b[0m", color_code(record.severity));
        } else {
            line.push_str(label);
        }
        line.push('[');
        match record.timestamp.format(TIMESTAMP) {
            Ok(stamp) => line.push_str(&stamp),
            Err(_) => {
                let _ = write!(line, "{}", record.timestamp.unix_timestamp());
            }
        }
        line.push_str("] ");
        line.push_str(text);
        line.push('\n');
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn record(severity: Severity, text: &str) -> Record<'_> {
        Record {
            timestamp: datetime!(2024-01-02 03:04:05 UTC),
            severity,
            text,
        }
    }

    #[test]
    fn plain_layout() {
        let line = TextFormat::new().format(&record(Severity::Error, "boom"));
        assert_eq!(line, "ERRO[2024-01-02 03:04:05] boom\n");
    }

    #[test]
    fn colored_label() {
        let line = TextFormat::new()
            .with_colors(true)
            .format(&record(Severity::Info, "hi"));
        assert_eq!(line, "\x1b[36mINFO\x1b[0m[2024-01-02 03:04:05] hi\n");
    }

    #[test]
    fn trailing_newline_is_not_doubled() {
        let line = TextFormat::new().format(&record(Severity::Info, "done\n"));
        assert_eq!(line, "INFO[2024-01-02 03:04:05] done\n");
    }

    #[test]
    fn functions_are_line_formats() {
        fn compact(record: &Record<'_>) -> String {
            format!("{}:{}\n", record.severity, record.text)
        }
        assert_eq!(compact.format(&record(Severity::Fatal, "x")), "fatal:x\n");
    }

    #[test]
    fn now_uses_current_time() {
        let before = OffsetDateTime::now_utc();
        let record = Record::now(Severity::Info, "t");
        assert!(record.timestamp >= before - time::Duration::seconds(1));
    }
}
