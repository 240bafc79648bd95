//! Indicators driven by a real background ticker.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cadence_core::{CadenceConfig, CadencePattern, CadenceScheduler, CadencedElement};
use cadence_indicators::{
    Annunciator, DEFAULT_ACTIVE_COLOR, DEFAULT_INACTIVE_COLOR, LedAppearance, LedIndicator,
    TrafficLight,
};

fn scheduler() -> CadenceScheduler {
    let config = CadenceConfig::builder()
        .tick_interval(Duration::from_millis(5))
        .stop_timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    CadenceScheduler::with_config(config).unwrap()
}

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}

#[test]
fn test_blinking_led_shows_both_states() {
    let scheduler = scheduler();
    let led = LedIndicator::new(&scheduler, "Exposure");
    led.set_status(TrafficLight::Red);
    led.set_cadence(CadencePattern::BLINK_ALARM);

    assert!(wait_for(|| led.appearance() == LedAppearance::On(TrafficLight::Red)));
    assert!(wait_for(|| led.appearance() == LedAppearance::Off));
    led.dispose();
    assert!(!scheduler.is_running());
}

#[test]
fn test_annunciator_blinks_between_colours() {
    let scheduler = scheduler();
    let annunciator = Annunciator::new(&scheduler, "ALARM");
    annunciator.set_cadence(CadencePattern::BLINK_FAST);

    assert!(wait_for(|| annunciator.fore_color() == DEFAULT_INACTIVE_COLOR));
    assert!(wait_for(|| annunciator.fore_color() == DEFAULT_ACTIVE_COLOR));
    annunciator.dispose();
}

#[test]
fn test_dropped_indicators_are_forgotten() {
    let scheduler = scheduler();
    let keeper = LedIndicator::new(&scheduler, "Keeper");
    for index in 0..5 {
        let _ = Annunciator::new(&scheduler, format!("TEMP{index}"));
    }

    assert!(wait_for(|| scheduler.len() == 1));
    assert!(scheduler.contains(&keeper));
    keeper.dispose();
}

#[test]
fn test_indicators_share_one_scheduler() {
    let scheduler = scheduler();
    let led = LedIndicator::new(&scheduler, "Shared");
    let annunciator = Annunciator::new(&scheduler, "SHARED");
    let elements: Vec<Arc<dyn CadencedElement>> = vec![led.clone(), annunciator.clone()];

    assert_eq!(scheduler.len(), 2);
    for element in &elements {
        assert!(!scheduler.add_dyn(element));
    }
    assert_eq!(scheduler.len(), 2);

    led.dispose();
    assert!(scheduler.is_running());
    annunciator.dispose();
    assert!(!scheduler.is_running());
}
