//! LED indicator model.
//!
//! An LED shows its status colour when the cadence bit is on and it is powered;
//! otherwise it shows the unlit lens. Status, power and cadence changes take
//! effect on the next tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cadence_core::{CadencePattern, CadenceScheduler, CadencedElement, ElementError};
use parking_lot::Mutex;

use crate::color::{Color, TrafficLight};

/// What an LED currently displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedAppearance {
    /// Unlit.
    Off,
    /// Lit in the colour of the given status.
    On(TrafficLight),
}

impl LedAppearance {
    /// The colour to paint the LED lens.
    pub const fn color(self) -> Color {
        match self {
            Self::Off => Color::WHITE_SMOKE,
            Self::On(status) => status.color(),
        }
    }
}

#[derive(Debug)]
struct LedState {
    label: String,
    status: TrafficLight,
    cadence: CadencePattern,
    appearance: LedAppearance,
}

/// A labelled status LED that blinks with a cadence.
#[derive(Debug)]
pub struct LedIndicator {
    state: Mutex<LedState>,
    powered: AtomicBool,
    disposed: AtomicBool,
    scheduler: CadenceScheduler,
}

impl LedIndicator {
    /// Create a powered, green, steadily lit LED and register it with
    /// `scheduler`.
    pub fn new(scheduler: &CadenceScheduler, label: impl Into<String>) -> Arc<Self> {
        let led = Arc::new(Self {
            state: Mutex::new(LedState {
                label: label.into(),
                status: TrafficLight::Green,
                cadence: CadencePattern::STEADY_ON,
                appearance: LedAppearance::Off,
            }),
            powered: AtomicBool::new(true),
            disposed: AtomicBool::new(false),
            scheduler: scheduler.clone(),
        });
        scheduler.add(&led);
        led
    }

    /// The text shown next to the LED.
    pub fn label(&self) -> String {
        self.state.lock().label.clone()
    }

    /// Replace the label text.
    pub fn set_label(&self, label: impl Into<String>) {
        self.state.lock().label = label.into();
    }

    /// The current status.
    pub fn status(&self) -> TrafficLight {
        self.state.lock().status
    }

    /// Change the status colour.
    pub fn set_status(&self, status: TrafficLight) {
        self.state.lock().status = status;
    }

    /// Change the blink pattern.
    pub fn set_cadence(&self, cadence: CadencePattern) {
        self.state.lock().cadence = cadence;
    }

    /// Whether the LED is powered.
    pub fn is_enabled(&self) -> bool {
        self.powered.load(Ordering::Acquire)
    }

    /// Switch power. An unpowered LED is always unlit regardless of cadence.
    pub fn set_enabled(&self, enabled: bool) -> Result<(), ElementError> {
        if self.is_disposed() {
            return Err(ElementError::Disposed);
        }
        self.powered.store(enabled, Ordering::Release);
        Ok(())
    }

    /// What the LED currently displays.
    pub fn appearance(&self) -> LedAppearance {
        self.state.lock().appearance
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Tear the LED down: unregister it and go dark.
    ///
    /// Calling this more than once has no further effect.
    pub fn dispose(self: &Arc<Self>) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.scheduler.remove(self);
        self.state.lock().appearance = LedAppearance::Off;
        tracing::debug!(target: "cadence_indicators::led", label = %self.label(), "LED disposed");
    }
}

impl CadencedElement for LedIndicator {
    fn cadence(&self) -> CadencePattern {
        self.state.lock().cadence
    }

    fn cadence_update(&self, active: bool) -> Result<(), ElementError> {
        if self.is_disposed() {
            return Err(ElementError::Disposed);
        }
        let lit = active && self.is_enabled();
        let mut state = self.state.lock();
        state.appearance = if lit {
            LedAppearance::On(state.status)
        } else {
            LedAppearance::Off
        };
        Ok(())
    }
}
