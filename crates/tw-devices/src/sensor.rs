//! On-die temperature sensor.
//!
//! The sensor is read through a 12-bit ADC referenced to 3.3 V. A read
//! captures a burst of raw conversions into a buffer (the transfer a DMA
//! channel performs on hardware) and averages the converted temperatures.

use crate::TemperatureSensor;

/// ADC reference voltage.
pub const ADC_VREF: f32 = 3.3;

/// ADC full-scale code count (12 bits).
pub const ADC_RANGE: u16 = 1 << 12;

/// Sensor output voltage at 27 °C.
const VBE_AT_27C: f32 = 0.706;

/// Sensor slope in volts per °C (negative temperature coefficient).
const VBE_SLOPE: f32 = 0.001_721;

/// Convert a raw 12-bit ADC code to °C using the on-die sensor curve.
#[must_use]
pub fn adc_to_celsius(raw: u16) -> f32 {
    let voltage = f32::from(raw) * (ADC_VREF / f32::from(ADC_RANGE));
    27.0 - (voltage - VBE_AT_27C) / VBE_SLOPE
}

/// Fractional ADC code the sensor would produce at `celsius`.
#[must_use]
pub fn celsius_to_adc(celsius: f32) -> f32 {
    let voltage = VBE_AT_27C - (celsius - 27.0) * VBE_SLOPE;
    voltage * f32::from(ADC_RANGE) / ADC_VREF
}

#[cfg(feature = "simulated")]
pub use simulated::SimulatedAdcSensor;

#[cfg(feature = "simulated")]
mod simulated {
    use super::{adc_to_celsius, celsius_to_adc, ADC_RANGE};
    use crate::TemperatureSensor;
    use std::time::Duration;
    use tracing::trace;
    use tw_common::config::{ProfileConfig, ProfileKind, SensorConfig};
    use tw_common::time::MonotonicClock;

    /// Simulated burst-read temperature sensor.
    ///
    /// The die temperature follows the configured profile, one step per read.
    /// Each burst spreads a sub-LSB dither across its conversions so the
    /// averaged reading resolves changes far smaller than one ADC step.
    #[derive(Debug)]
    pub struct SimulatedAdcSensor<C: MonotonicClock> {
        clock: C,
        profile: ProfileConfig,
        cost: Duration,
        buffer: Vec<u16>,
        reads: u64,
    }

    impl<C: MonotonicClock> SimulatedAdcSensor<C> {
        /// Create a sensor capturing `samples_per_read` conversions per read.
        pub fn new(clock: C, profile: ProfileConfig, samples_per_read: usize, cost: Duration) -> Self {
            Self {
                clock,
                profile,
                cost,
                buffer: vec![0; samples_per_read.max(1)],
                reads: 0,
            }
        }

        /// Create a sensor from the `[sensor]` configuration table.
        pub fn from_config(clock: C, config: &SensorConfig) -> Self {
            Self::new(
                clock,
                config.profile.clone(),
                config.samples_per_read,
                config.cost,
            )
        }

        /// Die temperature for the `read`-th read.
        #[allow(clippy::cast_precision_loss)]
        pub fn die_temperature(&self, read: u64) -> f32 {
            let p = &self.profile;
            match p.kind {
                ProfileKind::Constant => p.base_celsius,
                ProfileKind::Ramp => p.base_celsius + p.slope_per_read * read as f32,
                ProfileKind::Sine => {
                    let period = f64::from(p.period_reads.max(1));
                    let phase = (read as f64 / period) * std::f64::consts::TAU;
                    #[allow(clippy::cast_possible_truncation)]
                    let swing = (phase.sin() as f32) * p.amplitude;
                    p.base_celsius + swing
                }
            }
        }

        /// Reads performed so far.
        pub fn reads(&self) -> u64 {
            self.reads
        }

        /// Raw codes captured by the last burst.
        pub fn last_burst(&self) -> &[u16] {
            &self.buffer
        }

        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        fn capture_burst(&mut self, celsius: f32) {
            let exact = f64::from(celsius_to_adc(celsius));
            let n = self.buffer.len() as f64;
            let max = f64::from(ADC_RANGE - 1);
            for (i, slot) in self.buffer.iter_mut().enumerate() {
                let dither = (i as f64 + 0.5) / n;
                *slot = (exact + dither).floor().clamp(0.0, max) as u16;
            }
        }
    }

    impl<C: MonotonicClock> TemperatureSensor for SimulatedAdcSensor<C> {
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
        fn read_mean(&mut self) -> f32 {
            let celsius = self.die_temperature(self.reads);
            self.capture_burst(celsius);
            self.reads += 1;

            let sum: f64 = self
                .buffer
                .iter()
                .map(|&raw| f64::from(adc_to_celsius(raw)))
                .sum();
            let mean = (sum / self.buffer.len() as f64) as f32;

            self.clock.spin_for(self.cost);
            trace!(read = self.reads, die = celsius, mean, "Sensor burst averaged");
            mean
        }
    }
}

/// Sensor that always returns the same reading.
///
/// Useful as a stand-in when the temperature itself does not matter.
#[derive(Debug, Clone, Copy)]
pub struct FixedSensor(pub f32);

impl TemperatureSensor for FixedSensor {
    fn read_mean(&mut self) -> f32 {
        self.0
    }
}
