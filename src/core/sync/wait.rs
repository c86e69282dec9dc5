// src/core/sync/wait.rs

//! A counter of in-flight operations that can be awaited with an upper bound.
//!
//! Connection handles use it so that a forced close gives well-behaved requests
//! a bounded grace period to finish, without letting a stuck request block
//! shutdown forever.

use std::time::Duration;
use tokio::sync::watch;
use tracing::warn;

/// The result of [`Wait::wait_with_timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The counter reached zero before the deadline.
    Drained,
    /// The deadline elapsed while operations were still pending.
    TimedOut,
}

impl WaitOutcome {
    pub fn is_timed_out(self) -> bool {
        self == WaitOutcome::TimedOut
    }
}

/// Tracks the number of pending operations. Cloning is not supported; share it
/// through the structure that owns it.
#[derive(Debug)]
pub struct Wait {
    count: watch::Sender<usize>,
}

impl Default for Wait {
    fn default() -> Self {
        Self::new()
    }
}

impl Wait {
    pub fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self { count }
    }

    /// Increments the pending-operation count by `n`.
    pub fn add(&self, n: usize) {
        if n == 0 {
            return;
        }
        self.count.send_modify(|count| *count = count.saturating_add(n));
    }

    /// Decrements the pending-operation count by one.
    ///
    /// Calling this more often than `add` is a bug in the caller; the extra
    /// call is logged and ignored so the counter never underflows.
    pub fn done(&self) {
        let decremented = self.count.send_if_modified(|count| match count.checked_sub(1) {
            Some(next) => {
                *count = next;
                true
            }
            None => false,
        });
        if !decremented {
            warn!("Wait::done called with no pending operations");
        }
    }

    /// Returns the current number of pending operations.
    pub fn count(&self) -> usize {
        *self.count.borrow()
    }

    /// Registers one pending operation and returns a guard that completes it on drop.
    pub fn guard(&self) -> WaitGuard<'_> {
        self.add(1);
        WaitGuard { wait: self }
    }

    /// Blocks until the count reaches zero.
    pub async fn wait(&self) {
        let mut rx = self.count.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here.
        let _ = rx.wait_for(|count| *count == 0).await;
    }

    /// Blocks until the count reaches zero or `timeout` elapses, whichever is first.
    pub async fn wait_with_timeout(&self, timeout: Duration) -> WaitOutcome {
        if self.count() == 0 {
            return WaitOutcome::Drained;
        }
        match tokio::time::timeout(timeout, self.wait()).await {
            Ok(()) => WaitOutcome::Drained,
            Err(_) => WaitOutcome::TimedOut,
        }
    }
}

/// An RAII guard for one pending operation on a [`Wait`].
#[must_use = "the operation is completed as soon as the guard is dropped"]
pub struct WaitGuard<'a> {
    wait: &'a Wait,
}

impl Drop for WaitGuard<'_> {
    fn drop(&mut self) {
        self.wait.done();
    }
}
