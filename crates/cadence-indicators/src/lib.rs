//! Headless status indicators driven by [`cadence_core`].
//!
//! These types hold the display decision of an indicator (which colour to
//! show right now) without drawing anything. A renderer reads
//! [`LedIndicator::appearance`] or [`Annunciator::fore_color`] when it paints.
//!
//! ```
//! use cadence_core::{CadenceConfig, CadencePattern, CadenceScheduler, ManualDriver};
//! use cadence_indicators::{LedAppearance, LedIndicator, TrafficLight};
//!
//! let driver = ManualDriver::new();
//! let scheduler = CadenceScheduler::with_driver(CadenceConfig::default(), driver.clone())?;
//!
//! let led = LedIndicator::new(&scheduler, "Dome rotating");
//! led.set_status(TrafficLight::Yellow);
//! led.set_cadence(CadencePattern::STROBE);
//!
//! driver.fire();
//! assert_eq!(led.appearance(), LedAppearance::On(TrafficLight::Yellow));
//! driver.fire();
//! assert_eq!(led.appearance(), LedAppearance::Off);
//! # Ok::<(), cadence_core::CadenceError>(())
//! ```

mod annunciator;
mod color;
mod led;

pub use annunciator::{
    Annunciator, AnnunciatorPanel, DEFAULT_ACTIVE_COLOR, DEFAULT_BACKGROUND,
    DEFAULT_INACTIVE_COLOR,
};
pub use color::{Color, TrafficLight};
pub use led::{LedAppearance, LedIndicator};
