//! Integration tests for the cadence scheduler.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use cadence_core::{
    CadenceConfig, CadencePattern, CadencePhase, CadenceScheduler, CadencedElement, ElementError,
    ManualDriver,
};
use parking_lot::Mutex;

struct Probe {
    pattern: CadencePattern,
    history: Mutex<Vec<bool>>,
    updates: AtomicUsize,
}

impl Probe {
    fn new(pattern: CadencePattern) -> Arc<Self> {
        Arc::new(Self {
            pattern,
            history: Mutex::new(Vec::new()),
            updates: AtomicUsize::new(0),
        })
    }

    fn history(&self) -> Vec<bool> {
        self.history.lock().clone()
    }

    fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

impl CadencedElement for Probe {
    fn cadence(&self) -> CadencePattern {
        self.pattern
    }

    fn cadence_update(&self, active: bool) -> Result<(), ElementError> {
        self.history.lock().push(active);
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn manual_scheduler() -> (CadenceScheduler, ManualDriver) {
    let driver = ManualDriver::new();
    let scheduler =
        CadenceScheduler::with_driver(CadenceConfig::default(), driver.clone()).unwrap();
    (scheduler, driver)
}

fn threaded_scheduler(interval_ms: u64) -> CadenceScheduler {
    let config = CadenceConfig::builder()
        .tick_interval(Duration::from_millis(interval_ms))
        .stop_timeout(Duration::from_secs(2))
        .thread_name("cadence-test")
        .build()
        .unwrap();
    CadenceScheduler::with_config(config).unwrap()
}

fn wait_for(mut condition: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[test]
fn test_strobe_and_blink_fast_end_to_end() {
    let (scheduler, driver) = manual_scheduler();
    let strobe = Probe::new(CadencePattern::STROBE);
    let blink = Probe::new(CadencePattern::BLINK_FAST);
    scheduler.add(&strobe);
    scheduler.add(&blink);
    assert_eq!(scheduler.phase(), CadencePhase::ZERO);

    driver.fire();
    assert_eq!(strobe.history(), vec![true]);
    assert_eq!(blink.history(), vec![false]);
    assert_eq!(scheduler.phase().value(), 1);

    driver.fire();
    assert_eq!(strobe.history(), vec![true, false]);
    assert_eq!(blink.history(), vec![false, false]);
}

#[test]
fn test_every_named_pattern_is_delivered_bit_for_bit() {
    let (scheduler, driver) = manual_scheduler();
    let probes: Vec<_> = CadencePattern::NAMED
        .iter()
        .map(|(_, pattern)| Probe::new(*pattern))
        .collect();
    for probe in &probes {
        scheduler.add(probe);
    }

    driver.fire_n(32);

    for probe in &probes {
        let expected: Vec<bool> = (0..32)
            .map(|bit| (probe.pattern.bits() >> bit) & 1 == 1)
            .collect();
        assert_eq!(probe.history(), expected, "pattern {}", probe.pattern);
    }
}

#[test]
fn test_strobe_lights_once_per_cycle() {
    let (scheduler, driver) = manual_scheduler();
    let strobe = Probe::new(CadencePattern::STROBE);
    scheduler.add(&strobe);

    driver.fire_n(96);
    let lit = strobe.history().iter().filter(|&&on| on).count();
    assert_eq!(lit, 3);
}

#[test]
fn test_threaded_ticker_starts_and_stops_with_registry() {
    let scheduler = threaded_scheduler(10);
    let probe = Probe::new(CadencePattern::STEADY_ON);

    scheduler.add(&probe);
    assert!(scheduler.is_running());
    assert!(
        wait_for(|| probe.updates() >= 3, Duration::from_secs(5)),
        "expected ticks from the background thread"
    );

    scheduler.remove(&probe);
    assert!(!scheduler.is_running());
    let after_stop = probe.updates();
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(probe.updates(), after_stop);
}

#[test]
fn test_threaded_ticker_restarts_after_stop() {
    let scheduler = threaded_scheduler(10);
    let probe = Probe::new(CadencePattern::STEADY_ON);

    for _ in 0..3 {
        let before = probe.updates();
        let guard = scheduler.register(&probe);
        assert!(wait_for(
            || probe.updates() > before,
            Duration::from_secs(5)
        ));
        drop(guard);
        assert!(!scheduler.is_running());
    }
}

#[test]
fn test_dropped_element_is_evicted_by_background_ticker() {
    let scheduler = threaded_scheduler(10);
    let keeper = Probe::new(CadencePattern::STEADY_ON);
    let doomed = Probe::new(CadencePattern::STEADY_ON);
    scheduler.add(&keeper);
    scheduler.add(&doomed);
    assert_eq!(scheduler.len(), 2);

    drop(doomed);
    assert!(wait_for(|| scheduler.len() == 1, Duration::from_secs(5)));
    assert!(scheduler.is_running());
    scheduler.remove(&keeper);
}

#[test]
fn test_concurrent_add_and_remove() {
    let (scheduler, driver) = manual_scheduler();
    let anchor = Probe::new(CadencePattern::STEADY_ON);
    scheduler.add(&anchor);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let scheduler = scheduler.clone();
            std::thread::spawn(move || {
                for _ in 0..50 {
                    let probe = Probe::new(CadencePattern::BLINK_ALARM);
                    scheduler.add(&probe);
                    scheduler.remove(&probe);
                }
            })
        })
        .collect();

    let ticker = {
        let driver = driver.clone();
        std::thread::spawn(move || driver.fire_n(100).len())
    };

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(ticker.join().unwrap(), 100);
    assert_eq!(scheduler.len(), 1);
    assert_eq!(anchor.updates(), 100);
}

#[test]
fn test_global_scheduler_is_shared() {
    let first = CadenceScheduler::global();
    let second = CadenceScheduler::global();
    assert!(std::ptr::eq(first, second));
    assert_eq!(first.config().tick_interval, Duration::from_millis(125));
}

#[test]
fn test_unbounded_interval_keeps_ticker_stoppable() {
    let config = CadenceConfig::builder()
        .tick_interval(Duration::MAX)
        .stop_timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let scheduler = CadenceScheduler::with_config(config).unwrap();
    let probe = Probe::new(CadencePattern::STEADY_ON);

    scheduler.add(&probe);
    std::thread::sleep(Duration::from_millis(50));
    assert!(scheduler.is_running());
    assert_eq!(probe.updates(), 0);

    scheduler.remove(&probe);
    assert!(!scheduler.is_running());
}

#[test]
fn test_nul_thread_name_never_reaches_the_ticker() {
    let config = CadenceConfig {
        thread_name: "leds\0x".into(),
        ..CadenceConfig::default()
    };
    assert!(CadenceScheduler::with_config(config).is_err());
}
