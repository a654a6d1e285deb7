//! Cycle timing metrics.
//!
//! Tracks task execution time per cycle (with a ring buffer for
//! percentiles), per-slot execution time, start-to-start jitter, overruns,
//! and grid boundaries skipped after long overruns. Recording never
//! allocates once the slot table size is known.

use serde::Serialize;
use std::time::Duration;

use crate::time::duration_micros;

/// Timing data for one completed cycle.
#[derive(Debug, Clone, Copy)]
pub struct CycleSample<'a> {
    /// Time from cycle start until the last slot returned.
    pub execution: Duration,
    /// Measured start-to-start period minus the budget, if a previous cycle exists.
    pub jitter_us: Option<i64>,
    /// Task execution reached or exceeded the budget.
    pub overrun: bool,
    /// Whole periods dropped from the grid after this cycle.
    pub skipped_boundaries: u64,
    /// Execution time of each slot, in table order.
    pub slot_times: &'a [Duration],
}

/// Running min/max/mean for a single slot.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SlotStats {
    /// Invocations recorded.
    pub count: u64,
    /// Shortest execution in microseconds.
    pub min_us: u64,
    /// Longest execution in microseconds.
    pub max_us: u64,
    sum_us: u64,
}

impl Default for SlotStats {
    fn default() -> Self {
        Self {
            count: 0,
            min_us: u64::MAX,
            max_us: 0,
            sum_us: 0,
        }
    }
}

impl SlotStats {
    fn record(&mut self, us: u64) {
        self.count += 1;
        self.min_us = self.min_us.min(us);
        self.max_us = self.max_us.max(us);
        self.sum_us = self.sum_us.saturating_add(us);
    }

    /// Mean execution in microseconds.
    #[must_use]
    pub fn mean_us(&self) -> Option<u64> {
        (self.count > 0).then(|| self.sum_us / self.count)
    }
}

/// Cycle metrics with a ring buffer of execution times.
#[derive(Debug)]
pub struct CycleMetrics {
    /// Ring buffer of execution times in microseconds.
    samples: Box<[u64]>,
    write_pos: usize,
    /// Number of samples held (saturates at buffer size).
    sample_count: usize,
    total_cycles: u64,
    min_us: u64,
    max_us: u64,
    sum_us: u64,
    overrun_count: u64,
    skipped_boundaries: u64,
    /// Number of cycles that had a measurable start-to-start period.
    jitter_count: u64,
    max_abs_jitter_us: u64,
    sum_abs_jitter_us: u64,
    slots: Vec<SlotStats>,
    budget_us: u64,
}

impl CycleMetrics {
    /// Create a collector retaining `histogram_size` execution samples.
    #[must_use]
    pub fn new(histogram_size: usize, budget: Duration) -> Self {
        let size = histogram_size.max(1);
        Self {
            samples: vec![0u64; size].into_boxed_slice(),
            write_pos: 0,
            sample_count: 0,
            total_cycles: 0,
            min_us: u64::MAX,
            max_us: 0,
            sum_us: 0,
            overrun_count: 0,
            skipped_boundaries: 0,
            jitter_count: 0,
            max_abs_jitter_us: 0,
            sum_abs_jitter_us: 0,
            slots: Vec::new(),
            budget_us: duration_micros(budget),
        }
    }

    /// Record one completed cycle.
    pub fn record(&mut self, sample: &CycleSample<'_>) {
        let us = duration_micros(sample.execution);

        self.samples[self.write_pos] = us;
        self.write_pos = (self.write_pos + 1) % self.samples.len();
        self.sample_count = self.sample_count.saturating_add(1).min(self.samples.len());

        self.total_cycles += 1;
        self.min_us = self.min_us.min(us);
        self.max_us = self.max_us.max(us);
        self.sum_us = self.sum_us.saturating_add(us);

        if sample.overrun {
            self.overrun_count += 1;
        }
        self.skipped_boundaries += sample.skipped_boundaries;

        if let Some(jitter) = sample.jitter_us {
            let abs = jitter.unsigned_abs();
            self.jitter_count += 1;
            self.max_abs_jitter_us = self.max_abs_jitter_us.max(abs);
            self.sum_abs_jitter_us = self.sum_abs_jitter_us.saturating_add(abs);
        }

        if self.slots.len() < sample.slot_times.len() {
            self.slots.resize(sample.slot_times.len(), SlotStats::default());
        }
        for (stats, time) in self.slots.iter_mut().zip(sample.slot_times) {
            stats.record(duration_micros(*time));
        }
    }

    /// Total cycles recorded.
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Shortest task execution time.
    #[must_use]
    pub fn min(&self) -> Option<Duration> {
        (self.total_cycles > 0).then(|| Duration::from_micros(self.min_us))
    }

    /// Longest task execution time.
    #[must_use]
    pub fn max(&self) -> Option<Duration> {
        (self.total_cycles > 0).then(|| Duration::from_micros(self.max_us))
    }

    /// Mean task execution time.
    #[must_use]
    pub fn mean(&self) -> Option<Duration> {
        (self.total_cycles > 0).then(|| Duration::from_micros(self.sum_us / self.total_cycles))
    }

    /// Cycles whose execution reached the budget.
    #[must_use]
    pub fn overrun_count(&self) -> u64 {
        self.overrun_count
    }

    /// Grid boundaries dropped after long overruns.
    #[must_use]
    pub fn skipped_boundaries(&self) -> u64 {
        self.skipped_boundaries
    }

    /// Largest absolute deviation of a start-to-start period from the budget.
    #[must_use]
    pub fn max_abs_jitter(&self) -> Option<Duration> {
        (self.jitter_count > 0).then(|| Duration::from_micros(self.max_abs_jitter_us))
    }

    /// Per-slot statistics in table order.
    #[must_use]
    pub fn slots(&self) -> &[SlotStats] {
        &self.slots
    }

    /// Configured cycle budget.
    #[must_use]
    pub fn budget(&self) -> Duration {
        Duration::from_micros(self.budget_us)
    }

    /// Execution-time percentile from the ring buffer.
    ///
    /// Returns `None` with no samples or a percentile outside 0..=100.
    #[must_use]
    pub fn percentile(&self, percentile: f64) -> Option<Duration> {
        self.percentiles(&[percentile]).first().map(|&(_, d)| d)
    }

    /// Several execution-time percentiles at once; invalid entries are skipped.
    #[must_use]
    pub fn percentiles(&self, percentiles: &[f64]) -> Vec<(f64, Duration)> {
        if self.sample_count == 0 {
            return vec![];
        }

        let mut sorted: Vec<u64> = self.samples[..self.sample_count].to_vec();
        sorted.sort_unstable();

        percentiles
            .iter()
            .filter(|&&p| (0.0..=100.0).contains(&p))
            .map(|&p| {
                #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let idx = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
                let idx = idx.min(sorted.len() - 1);
                (p, Duration::from_micros(sorted[idx]))
            })
            .collect()
    }

    /// Snapshot of current metrics for reporting.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let any = self.total_cycles > 0;
        MetricsSnapshot {
            total_cycles: self.total_cycles,
            budget_us: self.budget_us,
            min_us: any.then_some(self.min_us),
            max_us: any.then_some(self.max_us),
            mean_us: any.then(|| self.sum_us / self.total_cycles),
            overrun_count: self.overrun_count,
            skipped_boundaries: self.skipped_boundaries,
            max_abs_jitter_us: (self.jitter_count > 0).then_some(self.max_abs_jitter_us),
            mean_abs_jitter_us: (self.jitter_count > 0)
                .then(|| self.sum_abs_jitter_us / self.jitter_count),
            sample_count: self.sample_count,
            slots: self.slots.clone(),
        }
    }
}

/// Immutable snapshot of metrics for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Total cycles executed.
    pub total_cycles: u64,
    /// Configured cycle budget in microseconds.
    pub budget_us: u64,
    /// Shortest task execution in microseconds.
    pub min_us: Option<u64>,
    /// Longest task execution in microseconds.
    pub max_us: Option<u64>,
    /// Mean task execution in microseconds.
    pub mean_us: Option<u64>,
    /// Cycles that overran the budget.
    pub overrun_count: u64,
    /// Grid boundaries dropped after long overruns.
    pub skipped_boundaries: u64,
    /// Largest |period - budget| in microseconds.
    pub max_abs_jitter_us: Option<u64>,
    /// Mean |period - budget| in microseconds.
    pub mean_abs_jitter_us: Option<u64>,
    /// Number of samples in the ring buffer.
    pub sample_count: usize,
    /// Per-slot execution statistics in table order.
    pub slots: Vec<SlotStats>,
}

impl MetricsSnapshot {
    /// Fraction of the budget consumed by the slowest cycle's tasks.
    #[must_use]
    pub fn peak_utilization(&self) -> Option<f64> {
        #[allow(clippy::cast_precision_loss)]
        self.max_us
            .filter(|_| self.budget_us > 0)
            .map(|max| max as f64 / self.budget_us as f64)
    }
}
