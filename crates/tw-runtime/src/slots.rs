//! Fixed task-slot table.
//!
//! Every cycle runs the same four slots in the same order:
//! 1. `sample`: read the averaged temperature
//! 2. `analyze`: feed the trend classifier
//! 3. `render`: refresh the status display
//! 4. `actuate`: drive the indicator
//!
//! A slot is a plain function over the [`CycleContext`]. It must return in
//! bounded time: there is no preemption, so a slot that never returns stalls
//! the executor for good.

use crate::context::CycleContext;
use tracing::warn;
use tw_devices::IndicatorPattern;

/// Body of a task slot.
pub type SlotFn = fn(&mut CycleContext);

/// Named entry in the slot table.
#[derive(Clone, Copy)]
pub struct TaskSlot {
    /// Name used in diagnostics.
    pub name: &'static str,
    /// Function run once per cycle.
    pub run: SlotFn,
}

impl std::fmt::Debug for TaskSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TaskSlot").field(&self.name).finish()
    }
}

/// Number of slots per cycle.
pub const SLOT_COUNT: usize = 4;

/// Ordered slot table.
pub type SlotTable = [TaskSlot; SLOT_COUNT];

/// The standard sample → analyze → render → actuate table.
pub const DEFAULT_SLOTS: SlotTable = [
    TaskSlot {
        name: "sample",
        run: sample,
    },
    TaskSlot {
        name: "analyze",
        run: analyze,
    },
    TaskSlot {
        name: "render",
        run: render,
    },
    TaskSlot {
        name: "actuate",
        run: actuate,
    },
];

/// Read one averaged temperature and check its plausibility.
pub fn sample(ctx: &mut CycleContext) {
    let value = ctx.peripherals.sensor.read_mean();
    ctx.sample = value;
    ctx.sample_valid = value.is_finite() && value >= ctx.min_valid_celsius;

    if ctx.sample_valid {
        ctx.fault_streak = 0;
    } else {
        ctx.fault_streak += 1;
        warn!(
            cycle = ctx.cycle,
            value,
            floor = ctx.min_valid_celsius,
            streak = ctx.fault_streak,
            "Implausible sensor reading"
        );
    }
}

/// Feed a valid sample to the classifier and publish the current trend.
pub fn analyze(ctx: &mut CycleContext) {
    if !ctx.sample_valid {
        return;
    }
    if let Some(summary) = ctx.classifier.ingest(ctx.sample) {
        ctx.last_block = Some(summary);
    }
    ctx.trend = ctx.classifier.trend();
}

/// Show the reading and trend on the status display.
pub fn render(ctx: &mut CycleContext) {
    ctx.peripherals.display.render_status(ctx.sample, ctx.trend);
}

/// Drive the indicator from the trend, or blink the fault pattern while the
/// sensor reading is implausible.
pub fn actuate(ctx: &mut CycleContext) {
    if ctx.sample_valid {
        ctx.peripherals.indicator.actuate(ctx.trend);
    } else {
        let lit = ctx.fault_streak % 2 == 1;
        ctx.peripherals
            .indicator
            .show(IndicatorPattern::SensorFault { lit });
    }
}
