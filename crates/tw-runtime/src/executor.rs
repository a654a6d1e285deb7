//! Deterministic cyclic executor.
//!
//! Each cycle:
//! 1. Record the cycle start
//! 2. Run the slot table in order, timing each slot
//! 3. Busy-wait until the cycle deadline (intended start + budget)
//! 4. Record metrics and report jitter
//!
//! Cycle boundaries form a fixed grid anchored at the first cycle's start.
//! A cycle that overruns skips the wait, and the next cycle keeps its
//! intended boundary on the grid instead of restarting the budget from the
//! completion time. If an overrun swallows one or more whole periods, those
//! boundaries are dropped from the grid so the executor never runs a burst
//! of back-to-back catch-up cycles. Lag behind the grid therefore stays
//! below one budget.

use crate::context::{CycleContext, Peripherals};
use crate::slots::{SlotTable, DEFAULT_SLOTS, SLOT_COUNT};
use std::time::Duration;
use tracing::{debug, info, trace, warn};
use tw_common::config::ExecutorConfig;
use tw_common::metrics::{CycleMetrics, CycleSample};
use tw_common::time::{duration_micros, MonotonicClock, Timestamp};
use tw_common::Trend;

/// Diagnostics for one completed cycle.
#[derive(Debug, Clone, Copy)]
pub struct CycleReport {
    /// Zero-based cycle index.
    pub cycle: u64,
    /// Grid boundary this cycle belongs to.
    pub intended_start: Timestamp,
    /// Time the cycle actually started.
    pub start: Timestamp,
    /// Time from start until the last slot returned.
    pub elapsed: Duration,
    /// Execution time of each slot, in table order.
    pub slot_times: [Duration; SLOT_COUNT],
    /// Time spent spinning until the deadline.
    pub waited: Duration,
    /// Start-to-start interval from the previous cycle.
    pub period: Option<Duration>,
    /// `period - budget` in microseconds.
    pub jitter_us: Option<i64>,
    /// The slots did not finish before the deadline.
    pub overrun: bool,
    /// Grid boundaries dropped after this cycle.
    pub skipped_boundaries: u64,
    /// Reading taken this cycle.
    pub sample: f32,
    /// Trend after this cycle.
    pub trend: Trend,
}

/// Fixed-period cooperative executor over a fixed slot table.
pub struct Executor<C: MonotonicClock> {
    clock: C,
    context: CycleContext,
    slots: SlotTable,
    budget: Duration,
    /// Intended start of the next cycle; `None` until the first cycle anchors the grid.
    next_start: Option<Timestamp>,
    last_start: Option<Timestamp>,
    cycle_count: u64,
    metrics: CycleMetrics,
    report_every: u64,
}

impl<C: MonotonicClock> std::fmt::Debug for Executor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("slots", &self.slots)
            .field("budget", &self.budget)
            .field("next_start", &self.next_start)
            .field("cycle_count", &self.cycle_count)
            .finish_non_exhaustive()
    }
}

impl<C: MonotonicClock> Executor<C> {
    /// Create an executor with the default slot table.
    pub fn new(clock: C, context: CycleContext, config: &ExecutorConfig) -> Self {
        Self {
            clock,
            context,
            slots: DEFAULT_SLOTS,
            budget: config.cycle_budget,
            next_start: None,
            last_start: None,
            cycle_count: 0,
            metrics: CycleMetrics::new(config.metrics.histogram_size, config.cycle_budget),
            report_every: config.metrics.report_every,
        }
    }

    /// Create an executor and its context from configuration.
    pub fn from_config(clock: C, peripherals: Peripherals, config: &ExecutorConfig) -> Self {
        let context = CycleContext::new(peripherals, config);
        Self::new(clock, context, config)
    }

    /// Replace the slot table. Only valid before the first cycle.
    #[must_use]
    pub fn with_slots(mut self, slots: SlotTable) -> Self {
        self.slots = slots;
        self
    }

    /// Cycle budget.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Cycles completed.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Cycle timing metrics.
    pub fn metrics(&self) -> &CycleMetrics {
        &self.metrics
    }

    /// Shared slot state.
    pub fn context(&self) -> &CycleContext {
        &self.context
    }

    /// Slot table in execution order.
    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }

    /// Clock driving the executor.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Intended start of the next cycle, once the grid is anchored.
    pub fn next_start(&self) -> Option<Timestamp> {
        self.next_start
    }

    /// Run one cycle: all slots in order, then spin to the deadline.
    pub fn run_cycle(&mut self) -> CycleReport {
        let start = self.clock.now();
        let intended_start = self.next_start.unwrap_or(start);
        let deadline = intended_start + self.budget;
        self.context.cycle = self.cycle_count;

        let mut slot_times = [Duration::ZERO; SLOT_COUNT];
        let mut mark = start;
        for (slot, time) in self.slots.iter().zip(slot_times.iter_mut()) {
            (slot.run)(&mut self.context);
            let now = self.clock.now();
            *time = now - mark;
            trace!(
                cycle = self.cycle_count,
                slot = slot.name,
                us = duration_micros(*time),
                "Slot complete"
            );
            mark = now;
        }

        let finished = mark;
        let elapsed = finished - start;
        let overrun = finished >= deadline;

        let (waited, next_start, skipped_boundaries) = if overrun {
            let (next, skipped) = self.rebase_after_overrun(deadline, finished);
            warn!(
                cycle = self.cycle_count,
                elapsed_us = duration_micros(elapsed),
                budget_us = duration_micros(self.budget),
                late_us = duration_micros(finished - deadline),
                skipped_boundaries = skipped,
                "Cycle overrun, no wait"
            );
            (Duration::ZERO, next, skipped)
        } else {
            self.clock.spin_until(deadline);
            (self.clock.now() - finished, deadline, 0)
        };

        let period = self.last_start.map(|prev| start - prev);
        let budget_us = i64::try_from(duration_micros(self.budget)).unwrap_or(i64::MAX);
        let jitter_us = self
            .last_start
            .map(|prev| start.signed_micros_since(prev).saturating_sub(budget_us));

        self.metrics.record(&CycleSample {
            execution: elapsed,
            jitter_us,
            overrun,
            skipped_boundaries,
            slot_times: &slot_times,
        });

        let report = CycleReport {
            cycle: self.cycle_count,
            intended_start,
            start,
            elapsed,
            slot_times,
            waited,
            period,
            jitter_us,
            overrun,
            skipped_boundaries,
            sample: self.context.sample,
            trend: self.context.trend,
        };

        debug!(
            cycle = report.cycle,
            elapsed_us = duration_micros(elapsed),
            waited_us = duration_micros(waited),
            jitter_us = report.jitter_us,
            sample = report.sample,
            trend = %report.trend,
            "Cycle complete"
        );

        self.next_start = Some(next_start);
        self.last_start = Some(start);
        self.cycle_count += 1;

        if self.report_every > 0 && self.cycle_count % self.report_every == 0 {
            self.log_status();
        }

        report
    }

    /// Next grid boundary after an overrun.
    ///
    /// The next cycle belongs to `deadline` (the boundary right after the
    /// overrunning cycle's intended start). Boundaries whose whole period has
    /// already elapsed at `finished` are dropped.
    fn rebase_after_overrun(&self, deadline: Timestamp, finished: Timestamp) -> (Timestamp, u64) {
        let budget_us = duration_micros(self.budget).max(1);
        let late_us = duration_micros(finished - deadline);
        let skipped = late_us / budget_us;
        let next = deadline + Duration::from_micros(skipped.saturating_mul(budget_us));
        (next, skipped)
    }

    /// Run exactly `cycles` cycles.
    pub fn run_cycles(&mut self, cycles: u64) {
        for _ in 0..cycles {
            self.run_cycle();
        }
    }

    /// Run forever. The executor has no terminal state.
    pub fn run(&mut self) -> ! {
        info!(
            budget_us = duration_micros(self.budget),
            slots = ?self.slots.iter().map(|s| s.name).collect::<Vec<_>>(),
            "Entering cyclic execution"
        );
        loop {
            self.run_cycle();
        }
    }

    /// Log a one-line timing summary.
    pub fn log_status(&self) {
        let m = &self.metrics;
        info!(
            cycles = self.cycle_count,
            mean_us = m.mean().map_or(0, duration_micros),
            max_us = m.max().map_or(0, duration_micros),
            max_jitter_us = m.max_abs_jitter().map_or(0, duration_micros),
            overruns = m.overrun_count(),
            skipped = m.skipped_boundaries(),
            trend = %self.context.trend,
            "Periodic status"
        );
    }
}

/// Builder for configuring the executor.
pub struct ExecutorBuilder<C: MonotonicClock> {
    clock: C,
    peripherals: Peripherals,
    config: ExecutorConfig,
    slots: SlotTable,
}

impl<C: MonotonicClock> ExecutorBuilder<C> {
    /// Start from the default configuration.
    pub fn new(clock: C, peripherals: Peripherals) -> Self {
        Self {
            clock,
            peripherals,
            config: ExecutorConfig::default(),
            slots: DEFAULT_SLOTS,
        }
    }

    /// Set the cycle budget.
    pub fn budget(mut self, budget: Duration) -> Self {
        self.config.cycle_budget = budget;
        self
    }

    /// Set the trend block size and threshold.
    pub fn trend(mut self, block_size: usize, threshold: f32) -> Self {
        self.config.trend.block_size = block_size;
        self.config.trend.threshold = threshold;
        self
    }

    /// Replace the slot table.
    pub fn slots(mut self, slots: SlotTable) -> Self {
        self.slots = slots;
        self
    }

    /// Set the full configuration.
    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the executor.
    pub fn build(self) -> Executor<C> {
        Executor::from_config(self.clock, self.peripherals, &self.config).with_slots(self.slots)
    }
}
