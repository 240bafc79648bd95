//! Annunciator and annunciator panel models.
//!
//! An annunciator is a text legend that lights in its active colour when its
//! cadence bit is on, and dims to its inactive colour otherwise. Muting forces
//! the inactive colour. Panels group annunciators on a shared background.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use cadence_core::{CadencePattern, CadenceScheduler, CadencedElement, ElementError};
use parking_lot::Mutex;

use crate::color::Color;

/// Default lit colour.
pub const DEFAULT_ACTIVE_COLOR: Color = Color::rgb(200, 4, 4);
/// Default dim colour, close to the background so the text is barely visible.
pub const DEFAULT_INACTIVE_COLOR: Color = Color::rgb(96, 4, 4);
/// Background used when an annunciator is not on a panel.
pub const DEFAULT_BACKGROUND: Color = Color::rgb(64, 0, 0);

#[derive(Debug)]
struct AnnunciatorState {
    text: String,
    cadence: CadencePattern,
    active_color: Color,
    inactive_color: Color,
    fore_color: Color,
    background: Color,
}

/// A cadenced text legend.
#[derive(Debug)]
pub struct Annunciator {
    state: Mutex<AnnunciatorState>,
    muted: AtomicBool,
    disposed: AtomicBool,
    repaints: AtomicUsize,
    scheduler: CadenceScheduler,
}

impl Annunciator {
    /// Create a steadily lit annunciator and register it with `scheduler`.
    ///
    /// Its initial colour matches the scheduler's current phase, so it shows the
    /// right state before its first tick.
    pub fn new(scheduler: &CadenceScheduler, text: impl Into<String>) -> Arc<Self> {
        let cadence = CadencePattern::STEADY_ON;
        let fore_color = if scheduler.state_of(cadence) {
            DEFAULT_ACTIVE_COLOR
        } else {
            DEFAULT_INACTIVE_COLOR
        };

        let annunciator = Arc::new(Self {
            state: Mutex::new(AnnunciatorState {
                text: text.into(),
                cadence,
                active_color: DEFAULT_ACTIVE_COLOR,
                inactive_color: DEFAULT_INACTIVE_COLOR,
                fore_color,
                background: DEFAULT_BACKGROUND,
            }),
            muted: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            repaints: AtomicUsize::new(0),
            scheduler: scheduler.clone(),
        });
        scheduler.add(&annunciator);
        annunciator
    }

    /// The legend text.
    pub fn text(&self) -> String {
        self.state.lock().text.clone()
    }

    /// Replace the legend text.
    pub fn set_text(&self, text: impl Into<String>) {
        self.state.lock().text = text.into();
    }

    /// Change the blink pattern.
    pub fn set_cadence(&self, cadence: CadencePattern) {
        self.state.lock().cadence = cadence;
    }

    /// The colour shown when lit.
    pub fn active_color(&self) -> Color {
        self.state.lock().active_color
    }

    /// Set the colour shown when lit.
    pub fn set_active_color(&self, color: Color) {
        self.state.lock().active_color = color;
    }

    /// The colour shown when dim.
    pub fn inactive_color(&self) -> Color {
        self.state.lock().inactive_color
    }

    /// Set the colour shown when dim.
    pub fn set_inactive_color(&self, color: Color) {
        self.state.lock().inactive_color = color;
    }

    /// Whether the annunciator is muted.
    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Acquire)
    }

    /// Mute or unmute. A muted annunciator always shows its inactive colour.
    pub fn set_mute(&self, mute: bool) {
        self.muted.store(mute, Ordering::Release);
    }

    /// The colour the text is currently drawn in.
    pub fn fore_color(&self) -> Color {
        self.state.lock().fore_color
    }

    /// The background colour.
    pub fn background(&self) -> Color {
        self.state.lock().background
    }

    /// Number of times the displayed colour actually changed.
    pub fn repaint_count(&self) -> usize {
        self.repaints.load(Ordering::Relaxed)
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Unregister from the scheduler. Further ticks are refused.
    pub fn dispose(self: &Arc<Self>) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.scheduler.remove(self);
        tracing::debug!(target: "cadence_indicators::annunciator", text = %self.text(), "annunciator disposed");
    }

    fn set_background(&self, color: Color) {
        self.state.lock().background = color;
    }
}

impl CadencedElement for Annunciator {
    fn cadence(&self) -> CadencePattern {
        self.state.lock().cadence
    }

    fn cadence_update(&self, active: bool) -> Result<(), ElementError> {
        if self.is_disposed() {
            return Err(ElementError::Disposed);
        }

        let lit = active && !self.is_muted();
        let mut state = self.state.lock();
        let target = if lit {
            state.active_color
        } else {
            state.inactive_color
        };
        if state.fore_color != target {
            state.fore_color = target;
            self.repaints.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }
}

/// A group of annunciators sharing a background colour.
#[derive(Debug)]
pub struct AnnunciatorPanel {
    background: Color,
    members: Vec<Arc<Annunciator>>,
}

impl AnnunciatorPanel {
    /// Create an empty panel with the default dark red background.
    pub fn new() -> Self {
        Self {
            background: DEFAULT_BACKGROUND,
            members: Vec::new(),
        }
    }

    /// The panel background.
    pub fn background(&self) -> Color {
        self.background
    }

    /// Change the background of the panel and every annunciator on it.
    pub fn set_background(&mut self, color: Color) {
        self.background = color;
        for member in &self.members {
            member.set_background(color);
        }
    }

    /// Place an annunciator on the panel. It takes on the panel background.
    pub fn add(&mut self, annunciator: Arc<Annunciator>) {
        annunciator.set_background(self.background);
        self.members.push(annunciator);
    }

    /// Take an annunciator off the panel, restoring the default background.
    ///
    /// Returns `true` if it was on the panel.
    pub fn remove(&mut self, annunciator: &Arc<Annunciator>) -> bool {
        let before = self.members.len();
        self.members.retain(|member| !Arc::ptr_eq(member, annunciator));
        let removed = self.members.len() != before;
        if removed {
            annunciator.set_background(DEFAULT_BACKGROUND);
        }
        removed
    }

    /// Mute or unmute every annunciator on the panel.
    pub fn set_mute_all(&self, mute: bool) {
        for member in &self.members {
            member.set_mute(mute);
        }
    }

    /// Number of annunciators on the panel.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the panel is empty.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterate over the annunciators on the panel.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Annunciator>> {
        self.members.iter()
    }

    /// Dispose every annunciator and empty the panel.
    pub fn dispose(&mut self) {
        for member in self.members.drain(..) {
            member.dispose();
        }
    }
}

impl Default for AnnunciatorPanel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{CadenceConfig, ManualDriver};

    fn manual() -> (CadenceScheduler, ManualDriver) {
        let driver = ManualDriver::new();
        let scheduler =
            CadenceScheduler::with_driver(CadenceConfig::default(), driver.clone()).unwrap();
        (scheduler, driver)
    }

    #[test]
    fn test_defaults() {
        let (scheduler, _driver) = manual();
        let annunciator = Annunciator::new(&scheduler, "RAIN");
        assert_eq!(annunciator.text(), "RAIN");
        assert_eq!(annunciator.active_color(), DEFAULT_ACTIVE_COLOR);
        assert_eq!(annunciator.inactive_color(), DEFAULT_INACTIVE_COLOR);
        assert_eq!(annunciator.background(), DEFAULT_BACKGROUND);
        assert_eq!(annunciator.fore_color(), DEFAULT_ACTIVE_COLOR);
        assert!(scheduler.contains(&annunciator));
    }

    #[test]
    fn test_mute_forces_inactive() {
        let (scheduler, driver) = manual();
        let annunciator = Annunciator::new(&scheduler, "DOME");
        annunciator.set_mute(true);

        driver.fire();
        assert_eq!(annunciator.fore_color(), DEFAULT_INACTIVE_COLOR);

        annunciator.set_mute(false);
        driver.fire();
        assert_eq!(annunciator.fore_color(), DEFAULT_ACTIVE_COLOR);
    }

    #[test]
    fn test_repaints_only_on_change() {
        let (scheduler, driver) = manual();
        let annunciator = Annunciator::new(&scheduler, "SLEW");

        driver.fire_n(5);
        assert_eq!(annunciator.repaint_count(), 0);

        annunciator.set_cadence(CadencePattern::BLINK_SLOW);
        // Phases 5..13 of 0xFF00FF00: off for 5..8, on for 8..13.
        driver.fire_n(8);
        assert_eq!(annunciator.repaint_count(), 2);
    }

    #[test]
    fn test_custom_colours() {
        let (scheduler, driver) = manual();
        let annunciator = Annunciator::new(&scheduler, "PARK");
        let green = Color::rgb(0, 200, 0);
        annunciator.set_active_color(green);

        driver.fire();
        assert_eq!(annunciator.fore_color(), green);
    }

    #[test]
    fn test_disposed_annunciator_refuses_updates() {
        let (scheduler, driver) = manual();
        let annunciator = Annunciator::new(&scheduler, "AUX");
        annunciator.dispose();

        assert!(!scheduler.contains(&annunciator));
        assert!(!driver.is_running());
        assert_eq!(
            annunciator.cadence_update(true),
            Err(ElementError::Disposed)
        );
    }

    #[test]
    fn test_panel_background_and_mute() {
        let (scheduler, driver) = manual();
        let mut panel = AnnunciatorPanel::new();
        let first = Annunciator::new(&scheduler, "ONE");
        let second = Annunciator::new(&scheduler, "TWO");
        panel.add(first.clone());
        panel.add(second.clone());
        assert_eq!(panel.len(), 2);

        let navy = Color::rgb(0, 0, 64);
        panel.set_background(navy);
        assert!(panel.iter().all(|a| a.background() == navy));

        panel.set_mute_all(true);
        driver.fire();
        assert_eq!(first.fore_color(), DEFAULT_INACTIVE_COLOR);
        assert_eq!(second.fore_color(), DEFAULT_INACTIVE_COLOR);

        assert!(panel.remove(&first));
        assert!(!panel.remove(&first));
        assert_eq!(first.background(), DEFAULT_BACKGROUND);
    }

    #[test]
    fn test_panel_dispose() {
        let (scheduler, driver) = manual();
        let mut panel = AnnunciatorPanel::new();
        panel.add(Annunciator::new(&scheduler, "A"));
        panel.add(Annunciator::new(&scheduler, "B"));
        assert_eq!(scheduler.len(), 2);

        panel.dispose();
        assert!(panel.is_empty());
        assert!(scheduler.is_empty());
        assert!(!driver.is_running());
    }
}
