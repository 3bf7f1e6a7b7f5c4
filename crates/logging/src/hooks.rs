//! crates/logging/src/hooks.rs
//! Callbacks invoked for every record at or above their minimum severity.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use crate::severity::Severity;

/// Error type returned by hooks.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

type HookFn = dyn Fn(&str, Severity) -> Result<(), HookError> + Send + Sync;

struct HookEntry {
    min_level: Severity,
    callback: Arc<HookFn>,
}

/// A hook that returned an error or panicked.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HookFailure {
    index: usize,
    description: String,
    panicked: bool,
}

impl HookFailure {
    /// Registration index of the failing hook.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The error message or panic payload.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Reports whether the hook panicked rather than returning an error.
    #[must_use]
    pub const fn panicked(&self) -> bool {
        self.panicked
    }
}

impl fmt::Display for HookFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.panicked {
            write!(f, "hook #{} failed: panicked: {}", self.index, self.description)
        } else {
            write!(f, "hook #{} failed: {}", self.index, self.description)
        }
    }
}

/// Ordered list of hooks.
///
/// Registration takes a short write lock. Invocation clones the matching
/// callbacks under a read lock and calls them with no lock held, so a hook may
/// itself log or register further hooks without deadlocking.
///
/// # Examples
///
/// ```
/// use logging::{HookRegistry, Severity};
///
/// let hooks = HookRegistry::new();
/// hooks.register(|message| {
///     if message.contains("secret") {
///         return Err("refusing to forward".into());
///     }
///     Ok(())
/// }, Severity::Warning);
///
/// assert!(hooks.invoke(Severity::Info, "secret").is_empty());
/// let failures = hooks.invoke(Severity::Error, "secret");
/// assert_eq!(failures[0].to_string(), "hook #0 failed: refusing to forward");
/// ```
#[derive(Default)]
pub struct HookRegistry {
    entries: RwLock<Vec<HookEntry>>,
}

impl HookRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hook receiving the rendered message. Returns its index.
    pub fn register<F>(&self, callback: F, min_level: Severity) -> usize
    where
        F: Fn(&str) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.push(
            Arc::new(move |message: &str, _: Severity| callback(message)),
            min_level,
        )
    }

    /// Registers a hook receiving the rendered message and its severity.
    pub fn register_leveled<F>(&self, callback: F, min_level: Severity) -> usize
    where
        F: Fn(&str, Severity) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.push(Arc::new(callback), min_level)
    }

    fn push(&self, callback: Arc<HookFn>, min_level: Severity) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.push(HookEntry {
            min_level,
            callback,
        });
        entries.len() - 1
    }

    /// Calls every hook registered at or below `level`, in registration order.
    ///
    /// Returns one [`HookFailure`] per hook that returned an error or panicked.
    /// A failing hook never prevents later hooks from running.
    pub fn invoke(&self, level: Severity, message: &str) -> Vec<HookFailure> {
        let selected: Vec<(usize, Arc<HookFn>)> = {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            entries
                .iter()
                .enumerate()
                .filter(|(_, entry)| entry.min_level <= level)
                .map(|(index, entry)| (index, Arc::clone(&entry.callback)))
                .collect()
        };

        let mut failures = Vec::new();
        for (index, callback) in selected {
            match panic::catch_unwind(AssertUnwindSafe(|| callback(message, level))) {
                Ok(Ok(())) => {}
                Ok(Err(error)) => failures.push(HookFailure {
                    index,
                    description: error.to_string(),
                    panicked: false,
                }),
                Err(payload) => failures.push(HookFailure {
                    index,
                    description: panic_message(payload.as_ref()),
                    panicked: true,
                }),
            }
        }
        failures
    }

    /// Number of registered hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Reports whether no hook is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("len", &self.len())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
