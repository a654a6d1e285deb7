//! Discrete trend signal shared by the classifier, display, and indicator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of the temperature trend between two consecutive blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    /// Block average rose by more than the threshold.
    Rising,
    /// Block average fell by more than the threshold.
    Falling,
    /// Change within the threshold, or no previous block to compare with.
    #[default]
    Stable,
}

impl Trend {
    /// Classify a block-to-block delta against a symmetric threshold.
    ///
    /// The comparison is strict on both sides, so a delta of exactly
    /// `±threshold` is still stable.
    #[must_use]
    pub fn from_delta(delta: f32, threshold: f32) -> Self {
        if delta > threshold {
            Self::Rising
        } else if delta < -threshold {
            Self::Falling
        } else {
            Self::Stable
        }
    }

    /// Short lowercase label used on the status display.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Rising => "rising",
            Self::Falling => "falling",
            Self::Stable => "stable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rising => write!(f, "RISING"),
            Self::Falling => write!(f, "FALLING"),
            Self::Stable => write!(f, "STABLE"),
        }
    }
}
