//! The capability an indicator implements to take part in cadence updates.

use std::sync::Arc;

use crate::error::ElementError;
use crate::pattern::CadencePattern;

/// A visual element that blinks according to a [`CadencePattern`].
///
/// The scheduler reads [`cadence`](Self::cadence) once per tick and delivers
/// the bit for the current phase through [`cadence_update`](Self::cadence_update).
/// Updates arrive on the scheduler's ticker thread, so implementations must be
/// `Send + Sync` and should use interior mutability for their display state.
///
/// Returning an error (or panicking) marks the element as unusable: the
/// scheduler drops it and it receives no further updates.
///
/// # Example
///
/// ```
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use cadence_core::{CadencePattern, CadencedElement, ElementError};
///
/// struct Lamp {
///     lit: AtomicBool,
/// }
///
/// impl CadencedElement for Lamp {
///     fn cadence(&self) -> CadencePattern {
///         CadencePattern::BLINK_SLOW
///     }
///
///     fn cadence_update(&self, active: bool) -> Result<(), ElementError> {
///         self.lit.store(active, Ordering::Relaxed);
///         Ok(())
///     }
/// }
/// ```
pub trait CadencedElement: Send + Sync {
    /// The element's current blink pattern.
    fn cadence(&self) -> CadencePattern;

    /// Apply the on/off state for this tick.
    ///
    /// Called once per tick while registered. Must be cheap and idempotent.
    fn cadence_update(&self, active: bool) -> Result<(), ElementError>;
}

/// Identity of a registered element: the address of its shared allocation.
///
/// Two `Arc`s compare equal here exactly when they point at the same element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ElementIdentity(usize);

impl ElementIdentity {
    pub(crate) fn of<E: ?Sized>(element: &Arc<E>) -> Self {
        Self(Arc::as_ptr(element) as *const () as usize)
    }
}
