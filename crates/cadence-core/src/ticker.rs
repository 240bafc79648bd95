//! Tick drivers: the timer sources that call into the scheduler.
//!
//! The scheduler never sleeps or spawns threads itself. It hands a tick
//! callback to a [`TickDriver`] when its registry becomes non-empty and stops
//! the returned [`RunningTicker`] when the registry empties again.
//!
//! Two drivers ship with the crate:
//!
//! - [`ThreadDriver`]: a dedicated background thread that ticks at the
//!   configured interval.
//! - [`ManualDriver`]: ticks only when [`ManualDriver::fire`] is called. Use it
//!   in tests, or to drive cadence from a host event loop's own timer.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, bounded};
use parking_lot::Mutex;

use crate::cancel::CancellationToken;
use crate::config::CadenceConfig;
use crate::error::{CadenceError, Result};
use crate::scheduler::TickReport;

/// The callback a driver invokes once per tick.
///
/// The token is the running ticker's cancellation token; the callback checks it
/// between element updates.
pub type TickFn = Arc<dyn Fn(&CancellationToken) -> TickReport + Send + Sync>;

/// A source of periodic ticks.
pub trait TickDriver: Send + Sync {
    /// Begin calling `tick` periodically according to `config`.
    ///
    /// Ticks must never overlap: the next tick starts only after the previous
    /// call to `tick` has returned.
    fn start(&self, config: &CadenceConfig, tick: TickFn) -> Result<Box<dyn RunningTicker>>;
}

/// A started ticker, owned by the scheduler until it is stopped.
pub trait RunningTicker: Send {
    /// Cancel the ticker and wait up to `timeout` for it to finish.
    ///
    /// Resources are released even when the wait times out, in which case
    /// [`CadenceError::StopTimeout`] is returned.
    fn stop(self: Box<Self>, timeout: Duration) -> Result<()>;
}

/// Ticks on a dedicated background thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadDriver;

impl TickDriver for ThreadDriver {
    fn start(&self, config: &CadenceConfig, tick: TickFn) -> Result<Box<dyn RunningTicker>> {
        // `thread::Builder::spawn` panics on a name with an interior NUL.
        config.validate()?;
        let token = CancellationToken::new();
        let thread_token = token.clone();
        let interval = config.tick_interval;
        // The sender is dropped when the thread exits, however it exits.
        let (done_sender, done_receiver) = bounded::<()>(1);

        let handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || {
                let _done = done_sender;
                while !thread_token.wait_timeout(interval) {
                    tick(&thread_token);
                }
                tracing::debug!(target: "cadence_core::ticker", "ticker thread exiting");
            })
            .map_err(|source| CadenceError::TickerStart {
                name: config.thread_name.clone(),
                source,
            })?;

        tracing::debug!(
            target: "cadence_core::ticker",
            name = %config.thread_name,
            ?interval,
            "ticker thread started"
        );

        Ok(Box::new(ThreadTicker {
            token,
            done: done_receiver,
            handle: Some(handle),
        }))
    }
}

struct ThreadTicker {
    token: CancellationToken,
    done: Receiver<()>,
    handle: Option<JoinHandle<()>>,
}

impl RunningTicker for ThreadTicker {
    fn stop(mut self: Box<Self>, timeout: Duration) -> Result<()> {
        self.token.cancel();
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        // Stopped from inside a tick (an element removed the last registration):
        // the loop exits once the current tick returns. Joining would deadlock.
        if handle.thread().id() == thread::current().id() {
            return Ok(());
        }

        match self.done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                handle.join().map_err(|_| CadenceError::TickerPanicked)
            }
            Err(RecvTimeoutError::Timeout) => {
                // Detach; the thread sees the cancelled token and exits on its own.
                drop(handle);
                Err(CadenceError::StopTimeout(timeout))
            }
        }
    }
}

impl Drop for ThreadTicker {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// A driver whose ticks are fired by hand.
///
/// Clones share state, so a test can keep one clone and give the other to the
/// scheduler.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use cadence_core::{CadenceConfig, CadencePattern, CadenceScheduler, CadencedElement, ElementError, ManualDriver};
///
/// struct Counter(AtomicUsize);
///
/// impl CadencedElement for Counter {
///     fn cadence(&self) -> CadencePattern {
///         CadencePattern::STEADY_ON
///     }
///     fn cadence_update(&self, _active: bool) -> Result<(), ElementError> {
///         self.0.fetch_add(1, Ordering::SeqCst);
///         Ok(())
///     }
/// }
///
/// let driver = ManualDriver::new();
/// let scheduler = CadenceScheduler::with_driver(CadenceConfig::default(), driver.clone()).unwrap();
///
/// let counter = Arc::new(Counter(AtomicUsize::new(0)));
/// scheduler.add(&counter);
/// driver.fire();
/// driver.fire();
/// assert_eq!(counter.0.load(Ordering::SeqCst), 2);
/// ```
#[derive(Clone, Default)]
pub struct ManualDriver {
    inner: Arc<ManualState>,
}

#[derive(Default)]
struct ManualState {
    current: Mutex<Option<ManualSlot>>,
    refuse_next_start: Mutex<Option<String>>,
    generation: AtomicU64,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

struct ManualSlot {
    generation: u64,
    tick: TickFn,
    token: CancellationToken,
}

impl ManualDriver {
    /// Create a driver with no running ticker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one tick synchronously, if a ticker is running.
    pub fn fire(&self) -> Option<TickReport> {
        let (tick, token) = {
            let current = self.inner.current.lock();
            let slot = current.as_ref()?;
            (slot.tick.clone(), slot.token.clone())
        };
        Some(tick(&token))
    }

    /// Run up to `count` ticks, stopping early if the ticker stops.
    ///
    /// Returns the reports of the ticks that ran.
    pub fn fire_n(&self, count: usize) -> Vec<TickReport> {
        (0..count).map_while(|_| self.fire()).collect()
    }

    /// Whether a ticker is currently running.
    pub fn is_running(&self) -> bool {
        self.inner.current.lock().is_some()
    }

    /// Make the next call to `start` fail with [`CadenceError::TickerRefused`].
    pub fn refuse_next_start(&self, reason: impl Into<String>) {
        *self.inner.refuse_next_start.lock() = Some(reason.into());
    }

    /// The cancellation token of the running ticker, if any.
    pub fn token(&self) -> Option<CancellationToken> {
        self.inner
            .current
            .lock()
            .as_ref()
            .map(|slot| slot.token.clone())
    }

    /// Number of successful starts so far.
    pub fn start_count(&self) -> usize {
        self.inner.starts.load(Ordering::SeqCst)
    }

    /// Number of stops so far.
    pub fn stop_count(&self) -> usize {
        self.inner.stops.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for ManualDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualDriver")
            .field("running", &self.is_running())
            .field("starts", &self.start_count())
            .field("stops", &self.stop_count())
            .finish()
    }
}

impl TickDriver for ManualDriver {
    fn start(&self, _config: &CadenceConfig, tick: TickFn) -> Result<Box<dyn RunningTicker>> {
        if let Some(reason) = self.inner.refuse_next_start.lock().take() {
            return Err(CadenceError::TickerRefused(reason));
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        let previous = self.inner.current.lock().replace(ManualSlot {
            generation,
            tick,
            token,
        });
        if let Some(previous) = previous {
            previous.token.cancel();
        }
        self.inner.starts.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(ManualTicker {
            state: self.inner.clone(),
            generation,
        }))
    }
}

struct ManualTicker {
    state: Arc<ManualState>,
    generation: u64,
}

impl RunningTicker for ManualTicker {
    fn stop(self: Box<Self>, _timeout: Duration) -> Result<()> {
        let mut current = self.state.current.lock();
        if current
            .as_ref()
            .is_some_and(|slot| slot.generation == self.generation)
        {
            if let Some(slot) = current.take() {
                slot.token.cancel();
            }
        }
        self.state.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
