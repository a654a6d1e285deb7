//! Common utilities for integration tests.

use std::time::Duration;
use tw_common::config::{ExecutorConfig, ProfileKind};
use tw_common::time::MonotonicClock;
use tw_runtime::{CycleReport, Executor, Peripherals};

/// Configuration with a short budget and explicit peripheral costs.
pub fn timed_config(budget: Duration, sensor: Duration, display: Duration) -> ExecutorConfig {
    let mut config = ExecutorConfig::default();
    config.cycle_budget = budget;
    config.sensor.cost = sensor;
    config.display.cost = display;
    config.indicator.cost = Duration::ZERO;
    config.metrics.report_every = 0;
    config
}

/// Configuration whose sensor follows a ramp of `slope` °C per read.
pub fn ramp_config(base: f32, slope: f32, block_size: usize) -> ExecutorConfig {
    let mut config = timed_config(Duration::from_millis(10), Duration::ZERO, Duration::ZERO);
    config.trend.block_size = block_size;
    config.sensor.profile.kind = ProfileKind::Ramp;
    config.sensor.profile.base_celsius = base;
    config.sensor.profile.slope_per_read = slope;
    config
}

/// Executor over simulated peripherals sharing `clock`.
pub fn simulated_executor<C>(clock: C, config: &ExecutorConfig) -> Executor<C>
where
    C: MonotonicClock + Clone + 'static,
{
    let peripherals = Peripherals::simulated(&clock, config);
    Executor::from_config(clock, peripherals, config)
}

/// Run `cycles` cycles and keep every report.
pub fn collect<C: MonotonicClock>(executor: &mut Executor<C>, cycles: usize) -> Vec<CycleReport> {
    (0..cycles).map(|_| executor.run_cycle()).collect()
}

/// Print a short timing summary for manual inspection (`--nocapture`).
pub fn print_stats<C: MonotonicClock>(label: &str, executor: &Executor<C>) {
    let m = executor.metrics();
    println!("{label}:");
    println!("  Cycles: {}", m.total_cycles());
    println!("  Mean: {:?}", m.mean());
    println!("  Max: {:?}", m.max());
    println!("  Max |jitter|: {:?}", m.max_abs_jitter());
    println!("  Overruns: {}", m.overrun_count());
    println!("  Skipped boundaries: {}", m.skipped_boundaries());
}
