//! src/macros.rs
//! `format!`-style logging macros.
//!
//! Each macro accepts either a format string with optional arguments, logged on
//! the default logger, or a `logger = expr;` prefix naming the logger to use.
//! A plain format string is written whole. Explicit arguments or inline
//! captures such as `{user}` make the result subject to the logger's maximum
//! length.

/// Logs at [`Severity::Info`](crate::Severity::Info).
///
/// ```
/// let logger = hooklog::Logger::builder().writer(Vec::new()).build()?;
/// let user = "alice";
/// hooklog::infof!(logger = logger; "{user} signed in from {}", "10.0.0.7");
/// # Ok::<(), hooklog::ConfigError>(())
/// ```
#[macro_export]
macro_rules! infof {
    (logger = $logger:expr; $($rest:tt)+) => {
        $logger.log($crate::Severity::Info, $crate::__message!($($rest)+))
    };
    ($($rest:tt)+) => {
        $crate::logger().log($crate::Severity::Info, $crate::__message!($($rest)+))
    };
}

/// Logs at [`Severity::Warning`](crate::Severity::Warning).
#[macro_export]
macro_rules! warningf {
    (logger = $logger:expr; $($rest:tt)+) => {
        $logger.log($crate::Severity::Warning, $crate::__message!($($rest)+))
    };
    ($($rest:tt)+) => {
        $crate::logger().log($crate::Severity::Warning, $crate::__message!($($rest)+))
    };
}

/// Logs at [`Severity::Error`](crate::Severity::Error).
#[macro_export]
macro_rules! errorf {
    (logger = $logger:expr; $($rest:tt)+) => {
        $logger.log($crate::Severity::Error, $crate::__message!($($rest)+))
    };
    ($($rest:tt)+) => {
        $crate::logger().log($crate::Severity::Error, $crate::__message!($($rest)+))
    };
}

/// Logs at [`Severity::Fatal`](crate::Severity::Fatal) and terminates the
/// process. Evaluates to `!`.
#[macro_export]
macro_rules! fatalf {
    (logger = $logger:expr; $($rest:tt)+) => {
        $logger.log_fatal($crate::__message!($($rest)+))
    };
    ($($rest:tt)+) => {
        $crate::logger().log_fatal($crate::__message!($($rest)+))
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __message {
    ($fmt:literal $(,)?) => {
        $crate::Message::literal(::core::format_args!($fmt))
    };
    ($fmt:literal, $($arg:tt)+) => {
        $crate::Message::Args(::core::format_args!($fmt, $($arg)+))
    };
}
