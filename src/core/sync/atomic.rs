// src/core/sync/atomic.rs

//! A boolean flag shared between tasks without a lock.

use std::sync::atomic::{AtomicBool, Ordering};

/// A boolean readable and writable from any number of tasks concurrently.
///
/// Reads use `Acquire` and writes use `Release`; only the flag's own value is
/// synchronized.
#[derive(Debug, Default)]
pub struct AtomicFlag(AtomicBool);

impl AtomicFlag {
    pub const fn new(value: bool) -> Self {
        Self(AtomicBool::new(value))
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn set(&self, value: bool) {
        self.0.store(value, Ordering::Release);
    }

    /// Flips the flag from `false` to `true`. Returns `true` only for the single
    /// caller that performed the transition.
    pub fn set_once(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
