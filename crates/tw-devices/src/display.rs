//! Status display.
//!
//! The status screen is a 128x64 monochrome OLED driven in text mode: 8 rows
//! of 16 characters with an 8x8 font.

use crate::StatusDisplay;
use tw_common::Trend;

/// Text rows on the screen.
pub const ROWS: usize = 8;

/// Characters per row.
pub const COLUMNS: usize = 16;

/// Lay out the status screen for one reading.
///
/// Every row is at most [`COLUMNS`] characters; longer text is cut.
#[must_use]
pub fn status_frame(value: f32, trend: Trend) -> [String; ROWS] {
    let mut frame: [String; ROWS] = Default::default();
    frame[0] = fit("TrendWatch");
    frame[2] = fit(&format!("Temp {value:>7.2} C"));
    frame[3] = fit(&format!("Trend {}", trend.label()));
    frame
}

fn fit(text: &str) -> String {
    text.chars().take(COLUMNS).collect()
}

#[cfg(feature = "simulated")]
pub use simulated::TextDisplay;

#[cfg(feature = "simulated")]
mod simulated {
    use super::{status_frame, ROWS};
    use crate::StatusDisplay;
    use std::time::Duration;
    use tracing::debug;
    use tw_common::time::MonotonicClock;
    use tw_common::Trend;

    /// Simulated text-mode OLED that keeps the last drawn frame.
    #[derive(Debug)]
    pub struct TextDisplay<C: MonotonicClock> {
        clock: C,
        cost: Duration,
        frame: [String; ROWS],
        frames_drawn: u64,
    }

    impl<C: MonotonicClock> TextDisplay<C> {
        /// Create a blank display whose updates take `cost`.
        pub fn new(clock: C, cost: Duration) -> Self {
            Self {
                clock,
                cost,
                frame: Default::default(),
                frames_drawn: 0,
            }
        }

        /// Rows of the last drawn frame.
        pub fn frame(&self) -> &[String] {
            &self.frame
        }

        /// Number of frames drawn.
        pub fn frames_drawn(&self) -> u64 {
            self.frames_drawn
        }
    }

    impl<C: MonotonicClock> StatusDisplay for TextDisplay<C> {
        fn render_status(&mut self, value: f32, trend: Trend) {
            self.frame = status_frame(value, trend);
            self.frames_drawn += 1;
            self.clock.spin_for(self.cost);
            debug!(line = %self.frame[2], trend = %trend, "Display updated");
        }
    }
}

/// Display that ignores every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDisplay;

impl StatusDisplay for NullDisplay {
    fn render_status(&mut self, _value: f32, _trend: Trend) {}
}
