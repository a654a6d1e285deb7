//! Scheduler context shared by the task slots.
//!
//! All state the slots exchange lives in one [`CycleContext`] that the
//! executor lends to each slot in turn as `&mut`. Only one slot can hold it
//! at a time, so the analyze slot is the single writer of the trend buffer
//! by construction rather than by convention.

use tw_common::config::ExecutorConfig;
use tw_common::Trend;
use tw_devices::{StatusDisplay, TemperatureSensor, TrendIndicator};
use tw_trend::{BlockSummary, TrendClassifier};

/// Collaborators the slots call into.
pub struct Peripherals {
    /// Averaged temperature source.
    pub sensor: Box<dyn TemperatureSensor>,
    /// Status screen.
    pub display: Box<dyn StatusDisplay>,
    /// Trend indicator.
    pub indicator: Box<dyn TrendIndicator>,
}

impl std::fmt::Debug for Peripherals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peripherals").finish_non_exhaustive()
    }
}

impl Peripherals {
    /// Bundle three collaborators.
    pub fn new(
        sensor: impl TemperatureSensor + 'static,
        display: impl StatusDisplay + 'static,
        indicator: impl TrendIndicator + 'static,
    ) -> Self {
        Self {
            sensor: Box::new(sensor),
            display: Box::new(display),
            indicator: Box::new(indicator),
        }
    }

    /// Simulated collaborators built from configuration, all occupying their
    /// cost on `clock`.
    #[cfg(feature = "simulated")]
    pub fn simulated<C>(clock: &C, config: &ExecutorConfig) -> Self
    where
        C: tw_common::time::MonotonicClock + Clone + 'static,
    {
        use tw_common::config::IndicatorKind;
        use tw_devices::{NeoPixelMatrix, RgbLed, SimulatedAdcSensor, TextDisplay};

        let sensor = SimulatedAdcSensor::from_config(clock.clone(), &config.sensor);
        let display = TextDisplay::new(clock.clone(), config.display.cost);
        let indicator: Box<dyn TrendIndicator> = match config.indicator.kind {
            IndicatorKind::RgbLed => Box::new(RgbLed::new(clock.clone(), config.indicator.cost)),
            IndicatorKind::NeoPixel => Box::new(NeoPixelMatrix::new(
                clock.clone(),
                config.indicator.brightness,
                config.indicator.cost,
            )),
        };

        Self {
            sensor: Box::new(sensor),
            display: Box::new(display),
            indicator,
        }
    }
}

/// State handed from slot to slot within and across cycles.
#[derive(Debug)]
pub struct CycleContext {
    /// Collaborators.
    pub peripherals: Peripherals,
    /// Trend buffer and classifier; written only by the analyze slot.
    pub classifier: TrendClassifier,
    /// Reading produced by the sample slot this cycle.
    pub sample: f32,
    /// Whether `sample` passed the plausibility check.
    pub sample_valid: bool,
    /// Consecutive cycles with an implausible reading.
    pub fault_streak: u64,
    /// Trend consumed by the render and actuate slots.
    pub trend: Trend,
    /// Most recently completed block.
    pub last_block: Option<BlockSummary>,
    /// Readings below this are a sensor fault.
    pub min_valid_celsius: f32,
    pub(crate) cycle: u64,
}

impl CycleContext {
    /// Create a context with an empty trend buffer.
    #[must_use]
    pub fn new(peripherals: Peripherals, config: &ExecutorConfig) -> Self {
        Self {
            peripherals,
            classifier: TrendClassifier::from_config(&config.trend),
            sample: 0.0,
            sample_valid: false,
            fault_streak: 0,
            trend: Trend::Stable,
            last_block: None,
            min_valid_celsius: config.sensor.min_valid_celsius,
            cycle: 0,
        }
    }

    /// Index of the cycle currently running (zero-based).
    #[must_use]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }
}
