//! crates/logging/src/config.rs
//! Plain-data logger configuration.

use logging_sink::{ConsoleTarget, RotationPolicy};

use crate::error::ConfigError;
use crate::format::DEFAULT_MAX_LEN;
use crate::severity::Severity;

/// Settings for [`Logger::from_config`](crate::Logger::from_config).
///
/// The default logs everything to stdout, truncates argument-built messages
/// at 5000 characters, and writes no file.
///
/// # Examples
///
/// ```
/// use logging::{LoggerConfig, Severity};
///
/// let config = LoggerConfig {
///     min_level: Severity::Warning,
///     ..LoggerConfig::for_program("billing")
/// };
/// assert_eq!(
///     config.file.as_ref().map(|policy| policy.path.clone()),
///     Some("logs/billing.log".into())
/// );
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LoggerConfig {
    /// Records below this severity are dropped.
    pub min_level: Severity,
    /// Maximum length, in characters, of messages built from arguments.
    pub max_len: usize,
    /// Console stream to write to, if any.
    pub console: Option<ConsoleTarget>,
    /// Rotating log file, if any.
    pub file: Option<RotationPolicy>,
    /// Whether console lines use ANSI colors.
    pub colors: bool,
}

impl LoggerConfig {
    /// Stdout plus a rotating `logs/<name>.log` file.
    #[must_use]
    pub fn for_program(name: &str) -> Self {
        Self {
            file: Some(RotationPolicy::for_name(name)),
            ..Self::default()
        }
    }

    /// Checks every field without touching the filesystem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_len == 0 {
            return Err(ConfigError::InvalidMaxLen);
        }
        if let Some(policy) = &self.file {
            if policy.path.as_os_str().is_empty() {
                return Err(ConfigError::EmptyPath);
            }
            policy.validate()?;
        }
        Ok(())
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: Severity::Info,
            max_len: DEFAULT_MAX_LEN,
            console: Some(ConsoleTarget::Stdout),
            file: None,
            colors: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = LoggerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.console, Some(ConsoleTarget::Stdout));
        assert!(config.file.is_none());
    }

    #[test]
    fn zero_max_len_is_rejected() {
        let config = LoggerConfig {
            max_len: 0,
            ..LoggerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidMaxLen)));
    }

    #[test]
    fn empty_file_path_is_rejected() {
        let config = LoggerConfig {
            file: Some(RotationPolicy::new("")),
            ..LoggerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyPath)));
    }

    #[test]
    fn zero_rotation_size_is_rejected() {
        let config = LoggerConfig {
            file: Some(RotationPolicy::new("logs/x.log").with_max_size(0)),
            ..LoggerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Sink(_))));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserializes_partial_json() {
        let config: LoggerConfig =
            serde_json::from_str(r#"{"min_level":"error","console":"stderr"}"#).expect("parse");
        assert_eq!(config.min_level, Severity::Error);
        assert_eq!(config.console, Some(ConsoleTarget::Stderr));
        assert_eq!(config.max_len, DEFAULT_MAX_LEN);
    }
}
