//! Blink-pattern scheduling for status indicators.
//!
//! This crate drives "cadenced" elements (LEDs, annunciators, anything that
//! blinks) from one shared clock so that every indicator with the same pattern
//! blinks in step:
//!
//! - **Patterns**: [`CadencePattern`], a 32-bit on/off lookup table per cycle
//! - **Phase**: [`CadencePhase`], the shared position within the 32-phase cycle
//! - **Elements**: the [`CadencedElement`] trait that indicators implement
//! - **Scheduler**: [`CadenceScheduler`], which holds elements weakly and
//!   delivers one on/off update per element per tick
//! - **Tick drivers**: [`ThreadDriver`] for a background thread,
//!   [`ManualDriver`] for tests and host-driven event loops
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use cadence_core::{
//!     CadenceConfig, CadencePattern, CadenceScheduler, CadencedElement, ElementError, ManualDriver,
//! };
//!
//! struct Lamp {
//!     pattern: CadencePattern,
//!     lit: AtomicBool,
//! }
//!
//! impl CadencedElement for Lamp {
//!     fn cadence(&self) -> CadencePattern {
//!         self.pattern
//!     }
//!
//!     fn cadence_update(&self, active: bool) -> Result<(), ElementError> {
//!         self.lit.store(active, Ordering::Relaxed);
//!         Ok(())
//!     }
//! }
//!
//! let driver = ManualDriver::new();
//! let scheduler = CadenceScheduler::with_driver(CadenceConfig::default(), driver.clone())?;
//!
//! let lamp = Arc::new(Lamp { pattern: CadencePattern::STROBE, lit: AtomicBool::new(false) });
//! let _guard = scheduler.register(&lamp);
//!
//! driver.fire();
//! assert!(lamp.lit.load(Ordering::Relaxed));
//! driver.fire();
//! assert!(!lamp.lit.load(Ordering::Relaxed));
//! # Ok::<(), cadence_core::CadenceError>(())
//! ```

mod cancel;
pub mod config;
mod element;
mod error;
pub mod logging;
mod pattern;
mod scheduler;
pub mod ticker;

pub use cancel::CancellationToken;
pub use config::{CadenceConfig, CadenceConfigBuilder};
pub use element::CadencedElement;
pub use error::{CadenceError, ElementError, Result};
pub use pattern::{CadencePattern, CadencePhase, PHASE_COUNT};
pub use scheduler::{CadenceGuard, CadenceScheduler, TickReport};
pub use ticker::{ManualDriver, RunningTicker, ThreadDriver, TickDriver, TickFn};
