//! Trend indicators.
//!
//! Colour code: rising is red, falling is blue, stable is green. A sensor
//! fault blinks white, one cycle lit and one cycle dark.

use serde::Serialize;
use tw_common::Trend;

/// 24-bit colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// All channels off.
    pub const OFF: Self = Self::new(0, 0, 0);
    /// Full red.
    pub const RED: Self = Self::new(255, 0, 0);
    /// Full green.
    pub const GREEN: Self = Self::new(0, 255, 0);
    /// Full blue.
    pub const BLUE: Self = Self::new(0, 0, 255);
    /// Full white.
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Build a colour from its channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale every channel by `brightness / 255`.
    #[must_use]
    pub fn scaled(self, brightness: u8) -> Self {
        let scale = |c: u8| -> u8 {
            let v = u16::from(c) * u16::from(brightness) / 255;
            u8::try_from(v).unwrap_or(u8::MAX)
        };
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }
}

/// What the indicator should show this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IndicatorPattern {
    /// Colour assigned to a trend.
    Trend(Trend),
    /// Blinking sensor-fault pattern; `lit` is the phase for this cycle.
    SensorFault {
        /// White when true, dark when false.
        lit: bool,
    },
}

impl IndicatorPattern {
    /// Colour for this pattern.
    #[must_use]
    pub fn color(self) -> Rgb {
        match self {
            Self::Trend(Trend::Rising) => Rgb::RED,
            Self::Trend(Trend::Falling) => Rgb::BLUE,
            Self::Trend(Trend::Stable) => Rgb::GREEN,
            Self::SensorFault { lit: true } => Rgb::WHITE,
            Self::SensorFault { lit: false } => Rgb::OFF,
        }
    }
}

impl From<Trend> for IndicatorPattern {
    fn from(trend: Trend) -> Self {
        Self::Trend(trend)
    }
}

/// GPIO levels of a discrete RGB LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LedLevels {
    /// Red line driven high.
    pub red: bool,
    /// Green line driven high.
    pub green: bool,
    /// Blue line driven high.
    pub blue: bool,
}

impl From<Rgb> for LedLevels {
    fn from(color: Rgb) -> Self {
        Self {
            red: color.r > 0,
            green: color.g > 0,
            blue: color.b > 0,
        }
    }
}

/// Pixels in the 5x5 matrix.
pub const MATRIX_PIXELS: usize = 25;

#[cfg(feature = "simulated")]
pub use simulated::{NeoPixelMatrix, RgbLed};

#[cfg(feature = "simulated")]
mod simulated {
    use super::{IndicatorPattern, LedLevels, Rgb, MATRIX_PIXELS};
    use crate::TrendIndicator;
    use std::time::Duration;
    use tracing::trace;
    use tw_common::time::MonotonicClock;

    /// Simulated discrete RGB LED on three GPIO lines.
    #[derive(Debug)]
    pub struct RgbLed<C: MonotonicClock> {
        clock: C,
        cost: Duration,
        levels: LedLevels,
        updates: u64,
    }

    impl<C: MonotonicClock> RgbLed<C> {
        /// Create an LED with all lines low.
        pub fn new(clock: C, cost: Duration) -> Self {
            Self {
                clock,
                cost,
                levels: LedLevels::default(),
                updates: 0,
            }
        }

        /// Current line levels.
        pub fn levels(&self) -> LedLevels {
            self.levels
        }

        /// Number of updates applied.
        pub fn updates(&self) -> u64 {
            self.updates
        }
    }

    impl<C: MonotonicClock> TrendIndicator for RgbLed<C> {
        fn show(&mut self, pattern: IndicatorPattern) {
            self.levels = LedLevels::from(pattern.color());
            self.updates += 1;
            self.clock.spin_for(self.cost);
            trace!(?pattern, levels = ?self.levels, "RGB LED updated");
        }
    }

    /// Simulated 5x5 addressable LED matrix filled with one colour.
    #[derive(Debug)]
    pub struct NeoPixelMatrix<C: MonotonicClock> {
        clock: C,
        cost: Duration,
        brightness: u8,
        pixels: [Rgb; MATRIX_PIXELS],
        writes: u64,
    }

    impl<C: MonotonicClock> NeoPixelMatrix<C> {
        /// Create a dark matrix; colours are scaled by `brightness`.
        pub fn new(clock: C, brightness: u8, cost: Duration) -> Self {
            Self {
                clock,
                cost,
                brightness,
                pixels: [Rgb::OFF; MATRIX_PIXELS],
                writes: 0,
            }
        }

        /// Pixel buffer as last written.
        pub fn pixels(&self) -> &[Rgb; MATRIX_PIXELS] {
            &self.pixels
        }

        /// Number of buffer writes.
        pub fn writes(&self) -> u64 {
            self.writes
        }
    }

    impl<C: MonotonicClock> TrendIndicator for NeoPixelMatrix<C> {
        fn show(&mut self, pattern: IndicatorPattern) {
            self.pixels.fill(pattern.color().scaled(self.brightness));
            self.writes += 1;
            self.clock.spin_for(self.cost);
            trace!(?pattern, pixel = ?self.pixels[0], "Matrix written");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrendIndicator;
    use std::time::Duration;
    use tw_common::time::{ManualClock, MonotonicClock};

    #[test]
    fn test_trend_colors() {
        assert_eq!(IndicatorPattern::from(Trend::Rising).color(), Rgb::RED);
        assert_eq!(IndicatorPattern::from(Trend::Falling).color(), Rgb::BLUE);
        assert_eq!(IndicatorPattern::from(Trend::Stable).color(), Rgb::GREEN);
        assert_eq!(IndicatorPattern::SensorFault { lit: true }.color(), Rgb::WHITE);
        assert_eq!(IndicatorPattern::SensorFault { lit: false }.color(), Rgb::OFF);
    }

    #[test]
    fn test_brightness_scaling() {
        assert_eq!(Rgb::WHITE.scaled(255), Rgb::WHITE);
        assert_eq!(Rgb::RED.scaled(64), Rgb::new(64, 0, 0));
        assert_eq!(Rgb::GREEN.scaled(0), Rgb::OFF);
    }

    #[test]
    fn test_rgb_led_levels() {
        let clock = ManualClock::new();
        let mut led = RgbLed::new(clock.clone(), Duration::from_millis(1));

        led.actuate(Trend::Rising);
        assert_eq!(
            led.levels(),
            LedLevels {
                red: true,
                green: false,
                blue: false
            }
        );

        led.actuate(Trend::Falling);
        assert!(led.levels().blue && !led.levels().red);

        led.show(IndicatorPattern::SensorFault { lit: true });
        assert!(led.levels().red && led.levels().green && led.levels().blue);

        assert_eq!(led.updates(), 3);
        assert_eq!(clock.now().as_micros(), 3_000);
    }

    #[test]
    fn test_neopixel_fill() {
        let mut matrix = NeoPixelMatrix::new(ManualClock::new(), 128, Duration::ZERO);

        matrix.actuate(Trend::Stable);
        assert!(matrix.pixels().iter().all(|&p| p == Rgb::new(0, 128, 0)));

        matrix.show(IndicatorPattern::SensorFault { lit: false });
        assert!(matrix.pixels().iter().all(|&p| p == Rgb::OFF));
        assert_eq!(matrix.writes(), 2);
    }
}
