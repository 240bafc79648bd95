//! The cadence scheduler.
//!
//! A [`CadenceScheduler`] keeps a registry of weakly-held
//! [`CadencedElement`]s and a shared [`CadencePhase`]. On every tick it tells
//! each live element whether its pattern is lit at the current phase, then
//! advances the phase. The ticker runs only while at least one element is
//! registered.
//!
//! Elements are never owned by the scheduler. An element that is dropped
//! without being removed is noticed on the next tick and evicted silently; an
//! element whose update fails (error or panic) is evicted and logged.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use cadence_core::{CadencePattern, CadenceScheduler, CadencedElement, ElementError};
//!
//! struct Lamp(AtomicBool);
//!
//! impl CadencedElement for Lamp {
//!     fn cadence(&self) -> CadencePattern {
//!         CadencePattern::BLINK_ALARM
//!     }
//!     fn cadence_update(&self, active: bool) -> Result<(), ElementError> {
//!         self.0.store(active, Ordering::Relaxed);
//!         Ok(())
//!     }
//! }
//!
//! let scheduler = CadenceScheduler::new();
//! let lamp = Arc::new(Lamp(AtomicBool::new(false)));
//!
//! // Ticking starts with the first registration...
//! let guard = scheduler.register(&lamp);
//! std::thread::sleep(std::time::Duration::from_secs(1));
//!
//! // ...and stops when the last one goes away.
//! drop(guard);
//! assert!(!scheduler.is_running());
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::cancel::CancellationToken;
use crate::config::CadenceConfig;
use crate::element::{CadencedElement, ElementIdentity};
use crate::error::{ElementError, Result};
use crate::pattern::{CadencePattern, CadencePhase};
use crate::ticker::{RunningTicker, ThreadDriver, TickDriver, TickFn};

new_key_type! {
    /// Key of a registry entry.
    struct EntryKey;
}

/// Outcome of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// The phase whose bits were delivered.
    pub phase: CadencePhase,
    /// Elements that received an update.
    pub notified: usize,
    /// Entries dropped because their element no longer exists.
    pub evicted_dead: usize,
    /// Entries dropped because their update failed.
    pub evicted_failed: usize,
    /// Whether the tick was cut short by cancellation.
    pub cancelled: bool,
}

impl TickReport {
    pub(crate) fn new(phase: CadencePhase) -> Self {
        Self {
            phase,
            ..Default::default()
        }
    }
}

struct Entry {
    identity: ElementIdentity,
    element: Weak<dyn CadencedElement>,
}

/// Registry, phase and ticker. All mutation happens under one lock.
struct Registry {
    entries: SlotMap<EntryKey, Entry>,
    index: HashMap<ElementIdentity, EntryKey>,
    phase: CadencePhase,
    ticker: Option<Box<dyn RunningTicker>>,
}

impl Registry {
    fn new() -> Self {
        Self {
            entries: SlotMap::with_key(),
            index: HashMap::new(),
            phase: CadencePhase::ZERO,
            ticker: None,
        }
    }

    fn remove_key(&mut self, key: EntryKey) -> bool {
        let Some(entry) = self.entries.remove(key) else {
            return false;
        };
        if self.index.get(&entry.identity) == Some(&key) {
            self.index.remove(&entry.identity);
        }
        true
    }

    /// Take the ticker out if nothing is left to tick.
    fn take_idle_ticker(&mut self) -> Option<Box<dyn RunningTicker>> {
        if self.entries.is_empty() {
            self.ticker.take()
        } else {
            None
        }
    }
}

struct SchedulerShared {
    config: CadenceConfig,
    driver: Box<dyn TickDriver>,
    registry: Mutex<Registry>,
    /// Serializes ticks, whichever ticker delivers them.
    tick_lock: Mutex<()>,
}

impl SchedulerShared {
    fn insert(
        self: &Arc<Self>,
        identity: ElementIdentity,
        element: Weak<dyn CadencedElement>,
    ) -> Option<EntryKey> {
        let mut registry = self.registry.lock();

        // An indexed entry at this address is the caller's own live element:
        // the entry's `Weak` keeps the allocation from being reused.
        let key = if registry.index.contains_key(&identity) {
            tracing::warn!(
                target: "cadence_core::scheduler",
                ?identity,
                "ignoring duplicate cadence registration"
            );
            None
        } else {
            let key = registry.entries.insert(Entry { identity, element });
            registry.index.insert(identity, key);
            tracing::debug!(
                target: "cadence_core::scheduler",
                ?identity,
                registered = registry.entries.len(),
                "cadence element registered"
            );
            Some(key)
        };

        if registry.ticker.is_none() && !registry.entries.is_empty() {
            self.start_ticker(&mut registry);
        }

        key
    }

    fn start_ticker(self: &Arc<Self>, registry: &mut Registry) {
        let weak = Arc::downgrade(self);
        let phase = registry.phase;
        let tick: TickFn = Arc::new(move |token: &CancellationToken| match weak.upgrade() {
            Some(shared) => shared.tick(token),
            None => TickReport::new(phase),
        });

        match self.driver.start(&self.config, tick) {
            Ok(ticker) => {
                tracing::debug!(target: "cadence_core::scheduler", "cadence updates started");
                registry.ticker = Some(ticker);
            }
            Err(err) => {
                // Left without a ticker; the next add retries.
                tracing::error!(
                    target: "cadence_core::scheduler",
                    error = %err,
                    "failed to start cadence updates"
                );
            }
        }
    }

    fn stop_ticker(&self, ticker: Box<dyn RunningTicker>) {
        match ticker.stop(self.config.stop_timeout) {
            Ok(()) => {
                tracing::debug!(target: "cadence_core::scheduler", "cadence updates stopped");
            }
            Err(err) => {
                tracing::warn!(
                    target: "cadence_core::scheduler",
                    error = %err,
                    "cadence ticker did not stop cleanly; resources released"
                );
            }
        }
    }

    fn remove_identity(&self, identity: ElementIdentity, only_key: Option<EntryKey>) -> bool {
        let (removed, idle) = {
            let mut registry = self.registry.lock();
            let key = registry
                .index
                .get(&identity)
                .copied()
                .filter(|key| only_key.is_none_or(|only| only == *key));
            let removed = key.is_some_and(|key| registry.remove_key(key));
            if removed {
                tracing::debug!(
                    target: "cadence_core::scheduler",
                    ?identity,
                    registered = registry.entries.len(),
                    "cadence element removed"
                );
            }
            (removed, registry.take_idle_ticker())
        };

        // Stopped outside the lock: a tick in flight may need it to finish.
        if let Some(ticker) = idle {
            self.stop_ticker(ticker);
        }
        removed
    }

    #[tracing::instrument(skip(self, cancel), target = "cadence_core::scheduler", level = "trace")]
    fn tick(&self, cancel: &CancellationToken) -> TickReport {
        let _serial = self.tick_lock.lock();

        // Adds and removes made during this tick are seen by the next one.
        let (phase, snapshot) = {
            let registry = self.registry.lock();
            let snapshot: Vec<(EntryKey, Weak<dyn CadencedElement>)> = registry
                .entries
                .iter()
                .map(|(key, entry)| (key, entry.element.clone()))
                .collect();
            (registry.phase, snapshot)
        };

        let mut report = TickReport::new(phase);
        for (key, weak) in snapshot {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let Some(element) = weak.upgrade() else {
                tracing::trace!(target: "cadence_core::scheduler", "evicting dropped cadence element");
                self.registry.lock().remove_key(key);
                report.evicted_dead += 1;
                continue;
            };

            match deliver(element.as_ref(), phase) {
                Ok(()) => report.notified += 1,
                Err(err) => {
                    tracing::error!(
                        target: "cadence_core::scheduler",
                        error = %err,
                        "cadence update failed; element evicted"
                    );
                    self.registry.lock().remove_key(key);
                    report.evicted_failed += 1;
                }
            }
        }

        let idle = {
            let mut registry = self.registry.lock();
            if !report.cancelled {
                registry.phase = registry.phase.next();
            }
            registry.take_idle_ticker()
        };
        if let Some(ticker) = idle {
            self.stop_ticker(ticker);
        }

        tracing::trace!(
            target: "cadence_core::scheduler",
            phase = %report.phase,
            notified = report.notified,
            evicted = report.evicted_dead + report.evicted_failed,
            "cadence tick"
        );
        report
    }
}

impl Drop for SchedulerShared {
    fn drop(&mut self) {
        if let Some(ticker) = self.registry.get_mut().ticker.take() {
            self.stop_ticker(ticker);
        }
    }
}

/// Compute the element's bit for `phase` and hand it over, treating a panic
/// like any other failure.
fn deliver(element: &dyn CadencedElement, phase: CadencePhase) -> std::result::Result<(), ElementError> {
    panic::catch_unwind(AssertUnwindSafe(|| {
        let active = element.cadence().is_active_at(phase);
        element.cadence_update(active)
    }))
    .unwrap_or_else(|payload| Err(ElementError::Failed(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

/// Drives the blink state of every registered [`CadencedElement`].
///
/// Cloning is cheap and yields a handle to the same scheduler. Create one per
/// application and hand it to the components that need it, or use
/// [`CadenceScheduler::global`].
#[derive(Clone)]
pub struct CadenceScheduler {
    shared: Arc<SchedulerShared>,
}

impl CadenceScheduler {
    /// Create a scheduler with the default configuration, ticking on a
    /// background thread.
    pub fn new() -> Self {
        Self::from_parts(CadenceConfig::default(), Box::new(ThreadDriver))
    }

    /// Create a scheduler ticking on a background thread with `config`.
    pub fn with_config(config: CadenceConfig) -> Result<Self> {
        Self::with_driver(config, ThreadDriver)
    }

    /// Create a scheduler with a custom tick driver.
    pub fn with_driver<D>(config: CadenceConfig, driver: D) -> Result<Self>
    where
        D: TickDriver + 'static,
    {
        config.validate()?;
        Ok(Self::from_parts(config, Box::new(driver)))
    }

    fn from_parts(config: CadenceConfig, driver: Box<dyn TickDriver>) -> Self {
        Self {
            shared: Arc::new(SchedulerShared {
                config,
                driver,
                registry: Mutex::new(Registry::new()),
                tick_lock: Mutex::new(()),
            }),
        }
    }

    /// The process-wide scheduler, created on first use.
    pub fn global() -> &'static CadenceScheduler {
        static GLOBAL: OnceLock<CadenceScheduler> = OnceLock::new();
        GLOBAL.get_or_init(CadenceScheduler::new)
    }

    /// The configuration this scheduler was created with.
    pub fn config(&self) -> &CadenceConfig {
        &self.shared.config
    }

    /// Register `element` for cadence updates.
    ///
    /// Returns `true` if a new registration was made. Registering an element
    /// that is already registered logs a warning and returns `false`. The
    /// first registration starts the ticker; if that fails the failure is
    /// logged and the next call retries.
    pub fn add<E>(&self, element: &Arc<E>) -> bool
    where
        E: CadencedElement + 'static,
    {
        let weak: Weak<dyn CadencedElement> = Arc::downgrade(element) as Weak<dyn CadencedElement>;
        self.shared
            .insert(ElementIdentity::of(element), weak)
            .is_some()
    }

    /// Register an element that is already behind a trait object.
    pub fn add_dyn(&self, element: &Arc<dyn CadencedElement>) -> bool {
        self.shared
            .insert(ElementIdentity::of(element), Arc::downgrade(element))
            .is_some()
    }

    /// Register `element` and return a guard that removes it when dropped.
    ///
    /// If the element was already registered the guard still removes that
    /// existing registration on drop.
    pub fn register<E>(&self, element: &Arc<E>) -> CadenceGuard
    where
        E: CadencedElement + 'static,
    {
        let identity = ElementIdentity::of(element);
        let weak: Weak<dyn CadencedElement> = Arc::downgrade(element) as Weak<dyn CadencedElement>;
        let key = match self.shared.insert(identity, weak) {
            Some(key) => Some(key),
            None => self.shared.registry.lock().index.get(&identity).copied(),
        };
        CadenceGuard {
            scheduler: self.clone(),
            identity,
            key,
        }
    }

    /// Unregister `element`.
    ///
    /// Returns `true` if it was registered. Removing the last element stops the
    /// ticker. Never fails: problems stopping the ticker are logged.
    pub fn remove<E>(&self, element: &Arc<E>) -> bool
    where
        E: CadencedElement + ?Sized,
    {
        self.shared
            .remove_identity(ElementIdentity::of(element), None)
    }

    /// Whether `element` is currently registered.
    pub fn contains<E>(&self, element: &Arc<E>) -> bool
    where
        E: CadencedElement + ?Sized,
    {
        self.shared
            .registry
            .lock()
            .index
            .contains_key(&ElementIdentity::of(element))
    }

    /// Number of registered entries, including dead ones not yet evicted.
    pub fn len(&self) -> usize {
        self.shared.registry.lock().entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.shared.registry.lock().entries.is_empty()
    }

    /// Whether the ticker is running.
    pub fn is_running(&self) -> bool {
        self.shared.registry.lock().ticker.is_some()
    }

    /// The phase the next tick will deliver.
    pub fn phase(&self) -> CadencePhase {
        self.shared.registry.lock().phase
    }

    /// Whether `pattern` is lit at the current phase.
    ///
    /// Elements use this to pick their initial appearance before their first
    /// tick arrives.
    pub fn state_of(&self, pattern: CadencePattern) -> bool {
        pattern.is_active_at(self.phase())
    }
}

impl Default for CadenceScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CadenceScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.shared.registry.lock();
        f.debug_struct("CadenceScheduler")
            .field("registered", &registry.entries.len())
            .field("phase", &registry.phase)
            .field("running", &registry.ticker.is_some())
            .finish()
    }
}

/// Removes an element's registration when dropped.
///
/// Returned by [`CadenceScheduler::register`]. Store it in the element's owner
/// so that tearing the owner down unregisters the element.
#[must_use = "dropping the guard unregisters the element immediately"]
pub struct CadenceGuard {
    scheduler: CadenceScheduler,
    identity: ElementIdentity,
    key: Option<EntryKey>,
}

impl CadenceGuard {
    /// The scheduler the element is registered with.
    pub fn scheduler(&self) -> &CadenceScheduler {
        &self.scheduler
    }

    /// Whether the registration this guard covers is still live.
    pub fn is_registered(&self) -> bool {
        let Some(key) = self.key else {
            return false;
        };
        self.scheduler
            .shared
            .registry
            .lock()
            .entries
            .contains_key(key)
    }
}

impl Drop for CadenceGuard {
    fn drop(&mut self) {
        if let Some(key) = self.key {
            self.scheduler
                .shared
                .remove_identity(self.identity, Some(key));
        }
    }
}

impl fmt::Debug for CadenceGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CadenceGuard")
            .field("identity", &self.identity)
            .field("registered", &self.is_registered())
            .finish()
    }
}
