//! Cooperative cancellation for the tick loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// A cancellation token for cooperative shutdown of a tick loop.
///
/// The ticker checks the token between ticks and the scheduler checks it before
/// each element update, so a cancelled tick stops delivering promptly. Sleeping
/// through [`wait_timeout`](Self::wait_timeout) wakes immediately on cancel.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<CancellationState>,
}

#[derive(Debug, Default)]
struct CancellationState {
    cancelled: AtomicBool,
    mutex: Mutex<()>,
    condvar: Condvar,
}

impl CancellationToken {
    /// Create a new, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Request cancellation and wake any waiter.
    pub fn cancel(&self) {
        // Hold the lock while flipping the flag to avoid a lost wakeup.
        let _guard = self.inner.mutex.lock();
        if !self.inner.cancelled.swap(true, Ordering::Release) {
            self.inner.condvar.notify_all();
        }
    }

    /// Sleep for up to `timeout`, returning early if cancelled.
    ///
    /// Returns `true` if the token is cancelled when the wait ends.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        // A deadline past what `Instant` can represent means wait for cancel only.
        let deadline = Instant::now().checked_add(timeout);
        let mut guard = self.inner.mutex.lock();
        while !self.is_cancelled() {
            match deadline {
                Some(deadline) => {
                    if self
                        .inner
                        .condvar
                        .wait_until(&mut guard, deadline)
                        .timed_out()
                    {
                        break;
                    }
                }
                None => self.inner.condvar.wait(&mut guard),
            }
        }
        self.is_cancelled()
    }
}
