//! crates/logging/src/tracing_bridge.rs
//! Forwards `tracing` events into a [`Logger`].
//!
//! [`HookLogLayer`] is a `tracing-subscriber` layer: every event reaching it is
//! rendered as `message key=value ...` and logged at the matching severity, so
//! the logger's gate, hooks and destinations apply to code instrumented with
//! the standard tracing macros.
//!
//! | tracing level     | severity  |
//! |-------------------|-----------|
//! | `ERROR`           | `Error`   |
//! | `WARN`            | `Warning` |
//! | `INFO` and below  | `Info`    |
//!
//! Events never map to [`Severity::Fatal`]; a tracing event cannot end the
//! process.

use std::borrow::Borrow;
use std::fmt::{self, Write as _};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::TryInitError;

use crate::format::Message;
use crate::logger::Logger;
use crate::severity::Severity;

/// A tracing layer writing events through a [`Logger`].
///
/// `L` is anything that borrows a logger: `&'static Logger`, `Arc<Logger>`, or
/// an owned `Logger`.
#[derive(Debug)]
pub struct HookLogLayer<L> {
    logger: L,
}

impl<L> HookLogLayer<L>
where
    L: Borrow<Logger>,
{
    /// Wraps `logger`.
    pub const fn new(logger: L) -> Self {
        Self { logger }
    }

    /// The wrapped logger.
    pub fn logger(&self) -> &Logger {
        self.logger.borrow()
    }

    const fn severity_for(level: &Level) -> Severity {
        match *level {
            Level::ERROR => Severity::Error,
            Level::WARN => Severity::Warning,
            _ => Severity::Info,
        }
    }
}

impl<S, L> Layer<S> for HookLogLayer<L>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    L: Borrow<Logger> + Send + Sync + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let severity = Self::severity_for(event.metadata().level());
        let logger = self.logger.borrow();
        if !logger.is_enabled(severity) {
            return;
        }
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let text = visitor.finish();
        logger.log(severity, Message::Args(format_args!("{text}")));
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.message.is_empty() {
            self.fields.trim_start().to_owned()
        } else {
            self.message + &self.fields
        }
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }
}

/// Installs a global subscriber forwarding every tracing event to `logger`.
///
/// Fails when a global subscriber is already set.
pub fn init_tracing<L>(logger: L) -> Result<(), TryInitError>
where
    L: Borrow<Logger> + Send + Sync + 'static,
{
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(HookLogLayer::new(logger))
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use test_support::SharedBuffer;
    use tracing_subscriber::layer::SubscriberExt;

    fn bridged() -> (Arc<Logger>, SharedBuffer) {
        let buffer = SharedBuffer::new();
        let logger = Logger::builder()
            .writer(buffer.clone())
            .build()
            .expect("build logger");
        (Arc::new(logger), buffer)
    }

    #[test]
    fn levels_map_to_severities() {
        assert_eq!(HookLogLayer::<Logger>::severity_for(&Level::ERROR), Severity::Error);
        assert_eq!(HookLogLayer::<Logger>::severity_for(&Level::WARN), Severity::Warning);
        assert_eq!(HookLogLayer::<Logger>::severity_for(&Level::INFO), Severity::Info);
        assert_eq!(HookLogLayer::<Logger>::severity_for(&Level::TRACE), Severity::Info);
    }

    #[test]
    fn events_reach_logger_destinations() {
        let (logger, buffer) = bridged();
        let subscriber =
            tracing_subscriber::registry().with(HookLogLayer::new(Arc::clone(&logger)));
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(attempt = 3, "retrying upload");
            tracing::error!("gave up");
        });

        let lines = buffer.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("WARN["));
        assert_eq!(buffer.messages(), vec!["retrying upload attempt=3", "gave up"]);
    }

    #[test]
    fn gate_applies_to_events() {
        let (logger, buffer) = bridged();
        logger.set_min_level(Severity::Error);
        let subscriber =
            tracing_subscriber::registry().with(HookLogLayer::new(Arc::clone(&logger)));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("quiet");
            tracing::warn!("still quiet");
        });
        assert!(buffer.contents().is_empty());
    }

    #[test]
    fn events_reach_hooks() {
        let (logger, _buffer) = bridged();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let captured = Arc::clone(&seen);
        logger.register_level_hook(
            move |message, level| {
                captured.lock().unwrap().push((message.to_owned(), level));
                Ok(())
            },
            Severity::Info,
        );
        let subscriber =
            tracing_subscriber::registry().with(HookLogLayer::new(Arc::clone(&logger)));
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(path = "a.txt", "synced");
        });
        assert_eq!(
            *seen.lock().unwrap(),
            vec![("synced path=a.txt".to_owned(), Severity::Info)]
        );
    }
}
