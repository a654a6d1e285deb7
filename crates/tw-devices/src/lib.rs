//! Collaborators driven by the cyclic executor.
//!
//! This crate provides:
//! - [`TemperatureSensor`], [`StatusDisplay`], and [`TrendIndicator`] traits,
//!   the three bounded-time calls the executor makes every cycle
//! - [`sensor`] with the on-die sensor conversion and a simulated ADC burst sensor
//! - [`display`] with a simulated text OLED
//! - [`indicator`] with indicator patterns, a simulated RGB LED and NeoPixel matrix
//!
//! Implementations must return within a bounded time and must never block
//! waiting for an external event: the executor has no way to interrupt them.

pub mod display;
pub mod indicator;
pub mod sensor;

pub use display::*;
pub use indicator::*;
pub use sensor::*;

use tw_common::Trend;

/// Source of one averaged temperature reading per cycle.
pub trait TemperatureSensor {
    /// Read the mean temperature in °C.
    ///
    /// Implementations may average a burst of raw conversions internally.
    fn read_mean(&mut self) -> f32;
}

/// Status output refreshed once per cycle.
pub trait StatusDisplay {
    /// Show the latest reading and the current trend.
    fn render_status(&mut self, value: f32, trend: Trend);
}

/// Visual indicator keyed on trend state.
pub trait TrendIndicator {
    /// Drive the indicator with `pattern`.
    fn show(&mut self, pattern: IndicatorPattern);

    /// Drive the indicator with the colour assigned to `trend`.
    fn actuate(&mut self, trend: Trend) {
        self.show(IndicatorPattern::Trend(trend));
    }
}
