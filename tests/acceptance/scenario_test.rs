//! End-to-end trend scenarios through the simulated peripherals.
//!
//! Uses the manual clock so every cycle lands exactly on the grid and the
//! tests run instantly.

use super::common::{ramp_config, simulated_executor};
use std::time::Duration;
use tw_common::config::ProfileKind;
use tw_common::time::{ManualClock, MonotonicClock, Timestamp};
use tw_common::Trend;

#[test]
fn test_rising_ramp_is_classified_rising() {
    let config = ramp_config(25.0, 0.02, 5);
    let mut executor = simulated_executor(ManualClock::new(), &config);

    executor.run_cycles(5);
    let ctx = executor.context();
    // First block only sets the reference
    assert_eq!(ctx.trend, Trend::Stable);
    assert_eq!(ctx.last_block.and_then(|b| b.delta), None);

    executor.run_cycles(10);
    let ctx = executor.context();
    assert_eq!(ctx.classifier.blocks_completed(), 3);
    assert_eq!(ctx.trend, Trend::Rising);
    let delta = ctx.last_block.and_then(|b| b.delta).unwrap_or_default();
    assert!((delta - 0.1).abs() < 0.02, "delta {delta}");
}

#[test]
fn test_falling_ramp_is_classified_falling() {
    let config = ramp_config(30.0, -0.02, 5);
    let mut executor = simulated_executor(ManualClock::new(), &config);

    executor.run_cycles(10);
    assert_eq!(executor.context().trend, Trend::Falling);
}

#[test]
fn test_slow_drift_below_threshold_is_stable() {
    // 0.005 °C per read is 0.025 °C per block of five
    let config = ramp_config(25.0, 0.005, 5);
    let mut executor = simulated_executor(ManualClock::new(), &config);

    executor.run_cycles(30);
    let ctx = executor.context();
    assert_eq!(ctx.classifier.blocks_completed(), 6);
    assert_eq!(ctx.trend, Trend::Stable);
}

#[test]
fn test_trend_changes_only_at_block_boundaries() {
    let config = ramp_config(25.0, 0.02, 5);
    let mut executor = simulated_executor(ManualClock::new(), &config);

    executor.run_cycles(10);
    assert_eq!(executor.context().trend, Trend::Rising);

    let mut trends = Vec::new();
    for _ in 0..4 {
        trends.push(executor.run_cycle().trend);
    }
    assert!(trends.iter().all(|&t| t == Trend::Rising));
}

#[test]
fn test_sensor_fault_is_not_classified() {
    let mut config = ramp_config(0.5, 0.0, 5);
    config.sensor.profile.kind = ProfileKind::Constant;
    let mut executor = simulated_executor(ManualClock::new(), &config);

    executor.run_cycles(12);
    let ctx = executor.context();
    assert!(!ctx.sample_valid);
    assert_eq!(ctx.fault_streak, 12);
    assert_eq!(ctx.classifier.blocks_completed(), 0);
    assert_eq!(ctx.classifier.fill(), 0);
}

#[test]
fn test_default_workload_fits_default_budget() {
    let mut config = ramp_config(25.0, 0.002, 50);
    config.cycle_budget = Duration::from_secs(1);
    config.sensor.cost = Duration::from_millis(2);
    config.display.cost = Duration::from_millis(15);
    config.indicator.cost = Duration::from_millis(1);
    let clock = ManualClock::new();
    let mut executor = simulated_executor(clock.clone(), &config);

    let report = executor.run_cycle();
    assert_eq!(report.elapsed, Duration::from_millis(18));
    assert_eq!(report.waited, Duration::from_millis(982));
    assert_eq!(clock.now(), Timestamp::from_micros(1_000_000));

    executor.run_cycles(99);
    assert_eq!(executor.context().classifier.blocks_completed(), 2);
    assert_eq!(clock.now(), Timestamp::from_micros(100_000_000));
    assert_eq!(executor.metrics().max_abs_jitter(), Some(Duration::ZERO));
}
