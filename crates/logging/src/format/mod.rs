//! crates/logging/src/format/mod.rs
//! Message rendering and truncation.

mod line;
mod printf;

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

pub use line::{LineFormat, Record, TextFormat};
pub use printf::{Arg, sprintf};

use crate::error::ConfigError;

/// Default maximum length, in characters, of a message built from arguments.
pub const DEFAULT_MAX_LEN: usize = 5000;

const ELLIPSIS: &str = "...";

/// The text of a logging call before rendering.
///
/// Only messages built from arguments are subject to truncation. Fixed text
/// and templates without arguments are written whole however long they are.
/// A printf template is always substituted, so `%%` becomes `%` even when no
/// arguments follow.
#[derive(Clone, Copy, Debug)]
pub enum Message<'a> {
    /// Literal text without arguments.
    Fixed(&'a str),
    /// A `format_args!` template with no arguments or captures; rendered but
    /// not truncated.
    Template(fmt::Arguments<'a>),
    /// A `format_args!` template with arguments.
    Args(fmt::Arguments<'a>),
    /// A printf-style template with its arguments.
    Printf {
        /// Template with `%` directives.
        template: &'a str,
        /// Values substituted into the template.
        args: &'a [Arg<'a>],
    },
}

impl<'a> Message<'a> {
    /// Reports whether rendering may truncate this message.
    #[must_use]
    pub const fn is_truncatable(&self) -> bool {
        match self {
            Self::Fixed(_) | Self::Template(_) => false,
            Self::Args(_) => true,
            Self::Printf { args, .. } => !args.is_empty(),
        }
    }

    /// Classifies the output of `format_args!` on a literal alone.
    ///
    /// A literal with inline captures such as `"{user}"` carries arguments and
    /// becomes [`Message::Args`]; anything else is a [`Message::Template`].
    #[must_use]
    pub fn literal(args: fmt::Arguments<'a>) -> Self {
        if args.as_str().is_some() {
            Self::Template(args)
        } else {
            Self::Args(args)
        }
    }

    fn expand(&self) -> Cow<'_, str> {
        match self {
            Self::Fixed(text) => Cow::Borrowed(*text),
            Self::Template(args) | Self::Args(args) => match args.as_str() {
                Some(text) => Cow::Borrowed(text),
                None => Cow::Owned(args.to_string()),
            },
            Self::Printf { template, args } => Cow::Owned(sprintf(template, args)),
        }
    }
}

impl<'a> From<&'a str> for Message<'a> {
    fn from(text: &'a str) -> Self {
        Self::Fixed(text)
    }
}

impl<'a> From<fmt::Arguments<'a>> for Message<'a> {
    fn from(args: fmt::Arguments<'a>) -> Self {
        Self::Args(args)
    }
}

/// Cuts `text` to at most `max_len` characters.
///
/// When the maximum exceeds three characters, the last three characters of the
/// budget are spent on a `...` marker. Smaller maximums cut without a marker.
/// A `max_len` of zero is treated as one.
///
/// # Examples
///
/// ```
/// use logging::truncate;
///
/// assert_eq!(truncate("abcdefgh", 6), "abc...");
/// assert_eq!(truncate("abcdefgh", 2), "ab");
/// assert_eq!(truncate("short", 10), "short");
/// ```
#[must_use]
pub fn truncate(text: &str, max_len: usize) -> Cow<'_, str> {
    let max_len = max_len.max(1);
    if text.char_indices().nth(max_len).is_none() {
        return Cow::Borrowed(text);
    }
    if max_len > ELLIPSIS.len() {
        let keep = byte_offset(text, max_len - ELLIPSIS.len());
        let mut out = String::with_capacity(keep + ELLIPSIS.len());
        out.push_str(&text[..keep]);
        out.push_str(ELLIPSIS);
        Cow::Owned(out)
    } else {
        Cow::Borrowed(&text[..byte_offset(text, max_len)])
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices().nth(chars).map_or(text.len(), |(offset, _)| offset)
}

/// Renders messages and applies the length limit.
#[derive(Debug)]
pub struct Formatter {
    max_len: AtomicUsize,
}

impl Formatter {
    /// Creates a formatter with the given maximum length.
    pub fn new(max_len: usize) -> Result<Self, ConfigError> {
        if max_len == 0 {
            return Err(ConfigError::InvalidMaxLen);
        }
        Ok(Self {
            max_len: AtomicUsize::new(max_len),
        })
    }

    /// Renders `message`, truncating it when it was built from arguments.
    #[must_use]
    pub fn render(&self, message: &Message<'_>) -> String {
        let text = message.expand();
        if message.is_truncatable() {
            truncate(&text, self.max_len()).into_owned()
        } else {
            text.into_owned()
        }
    }

    /// Returns the current maximum length.
    #[must_use]
    pub fn max_len(&self) -> usize {
        self.max_len.load(Ordering::Relaxed)
    }

    /// Changes the maximum length. Zero is rejected.
    pub fn set_max_len(&self, max_len: usize) -> Result<(), ConfigError> {
        if max_len == 0 {
            return Err(ConfigError::InvalidMaxLen);
        }
        self.max_len.store(max_len, Ordering::Relaxed);
        Ok(())
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self {
            max_len: AtomicUsize::new(DEFAULT_MAX_LEN),
        }
    }
}
