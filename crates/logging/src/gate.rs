//! crates/logging/src/gate.rs
//! Minimum-severity filter shared by every logging call.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::severity::Severity;

/// Atomic minimum-severity threshold.
///
/// The threshold is a single byte, so reads on the logging hot path never take
/// a lock. A change made with [`set_min_level`](Self::set_min_level) is seen by
/// every call that starts after it returns.
#[derive(Debug)]
pub struct LevelGate {
    threshold: AtomicU8,
}

impl LevelGate {
    /// Creates a gate passing `min_level` and everything above it.
    #[must_use]
    pub const fn new(min_level: Severity) -> Self {
        Self {
            threshold: AtomicU8::new(min_level.to_u8()),
        }
    }

    /// Reports whether a record at `level` passes the gate.
    #[must_use]
    pub fn should_log(&self, level: Severity) -> bool {
        level.to_u8() >= self.threshold.load(Ordering::Relaxed)
    }

    /// Changes the threshold.
    pub fn set_min_level(&self, level: Severity) {
        self.threshold.store(level.to_u8(), Ordering::Relaxed);
    }

    /// Returns the current threshold.
    #[must_use]
    pub fn min_level(&self) -> Severity {
        Severity::from_u8(self.threshold.load(Ordering::Relaxed))
    }
}

impl Default for LevelGate {
    fn default() -> Self {
        Self::new(Severity::Info)
    }
}
