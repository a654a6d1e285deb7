//! Configuration structures for the cyclic executor.
//!
//! The executor's behaviour is fixed by three constants (cycle budget, block
//! size, trend threshold). They can be overridden from TOML; every table has
//! defaults so a partial file is enough.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Default fixed duration of one executor cycle.
pub const DEFAULT_CYCLE_BUDGET: Duration = Duration::from_secs(1);

/// Default number of samples per trend block.
pub const DEFAULT_BLOCK_SIZE: usize = 50;

/// Default block-to-block delta (in °C) that counts as a trend.
pub const DEFAULT_TREND_THRESHOLD: f32 = 0.05;

/// Default number of raw ADC conversions averaged per sensor read.
pub const DEFAULT_SAMPLES_PER_READ: usize = 100;

/// Largest accepted trend block.
pub const MAX_BLOCK_SIZE: usize = 1_000_000;

/// Largest accepted sensor burst.
pub const MAX_SAMPLES_PER_READ: usize = 65_536;

/// Largest accepted execution-time ring buffer.
pub const MAX_HISTOGRAM_SIZE: usize = 1_000_000;

/// Top-level executor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Fixed wall-clock duration of every cycle.
    #[serde(with = "humantime_serde")]
    pub cycle_budget: Duration,

    /// Trend classifier configuration.
    pub trend: TrendConfig,

    /// Simulated temperature sensor configuration.
    pub sensor: SensorConfig,

    /// Simulated status display configuration.
    pub display: DisplayConfig,

    /// Simulated trend indicator configuration.
    pub indicator: IndicatorConfig,

    /// Metrics and periodic reporting configuration.
    pub metrics: MetricsConfig,

    /// Real-time thread configuration.
    pub realtime: RealtimeConfig,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            cycle_budget: DEFAULT_CYCLE_BUDGET,
            trend: TrendConfig::default(),
            sensor: SensorConfig::default(),
            display: DisplayConfig::default(),
            indicator: IndicatorConfig::default(),
            metrics: MetricsConfig::default(),
            realtime: RealtimeConfig::default(),
        }
    }
}

/// Trend classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Samples per block.
    pub block_size: usize,
    /// Minimum absolute delta between block averages to report a trend.
    pub threshold: f32,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            threshold: DEFAULT_TREND_THRESHOLD,
        }
    }
}

/// Simulated temperature sensor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Raw conversions captured per read (one burst transfer).
    pub samples_per_read: usize,

    /// Readings below this value are treated as a sensor fault.
    pub min_valid_celsius: f32,

    /// Time the read occupies on the executor.
    #[serde(with = "humantime_serde")]
    pub cost: Duration,

    /// Temperature the simulated die follows over time.
    pub profile: ProfileConfig,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            samples_per_read: DEFAULT_SAMPLES_PER_READ,
            min_valid_celsius: 1.0,
            cost: Duration::from_millis(2),
            profile: ProfileConfig::default(),
        }
    }
}

/// Shape of the simulated temperature signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    /// Fixed temperature.
    Constant,
    /// Linear drift per read.
    #[default]
    Ramp,
    /// Slow oscillation around the base temperature.
    Sine,
}

/// Simulated temperature profile parameters.
///
/// Only the fields relevant to `kind` are used.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Profile shape.
    pub kind: ProfileKind,
    /// Starting (or centre) temperature in °C.
    pub base_celsius: f32,
    /// Ramp slope in °C per read.
    pub slope_per_read: f32,
    /// Sine amplitude in °C.
    pub amplitude: f32,
    /// Sine period in reads.
    pub period_reads: u32,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            kind: ProfileKind::Ramp,
            base_celsius: 25.0,
            slope_per_read: 0.002,
            amplitude: 0.5,
            period_reads: 600,
        }
    }
}

/// Simulated status display configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Time a frame update occupies on the executor.
    #[serde(with = "humantime_serde")]
    pub cost: Duration,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            cost: Duration::from_millis(15),
        }
    }
}

/// Which indicator the actuate slot drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    /// Discrete RGB LED on three GPIO lines.
    #[default]
    RgbLed,
    /// 5x5 addressable LED matrix.
    #[serde(rename = "neopixel")]
    NeoPixel,
}

/// Simulated trend indicator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Indicator type.
    pub kind: IndicatorKind,
    /// Matrix brightness (0-255); ignored by the RGB LED.
    pub brightness: u8,
    /// Time an update occupies on the executor.
    #[serde(with = "humantime_serde")]
    pub cost: Duration,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            kind: IndicatorKind::RgbLed,
            brightness: 64,
            cost: Duration::from_millis(1),
        }
    }
}

/// Metrics and diagnostics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Size of the execution-time ring buffer.
    pub histogram_size: usize,

    /// Percentiles to report (e.g., [50, 99, 100]).
    pub percentiles: Vec<f64>,

    /// Emit a status line every this many cycles (0 disables).
    pub report_every: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            histogram_size: 1_000,
            percentiles: vec![50.0, 99.0, 100.0],
            report_every: 10,
        }
    }
}

/// Real-time setup for the executor thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Apply any of the settings below (requires privileges).
    pub enabled: bool,

    /// SCHED_FIFO priority (1-99).
    pub priority: u8,

    /// Pin the executor to this CPU.
    pub cpu: Option<usize>,

    /// Lock all memory pages (mlockall).
    pub lock_memory: bool,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            priority: 80,
            cpu: None,
            lock_memory: true,
        }
    }
}

impl ExecutorConfig {
    /// Load and validate configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "Reading configuration file");
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or a value is out of range.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Check value ranges the executor relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cycle_budget.is_zero() {
            return Err(ConfigError::Invalid("cycle_budget must be non-zero".into()));
        }
        if !(1..=MAX_BLOCK_SIZE).contains(&self.trend.block_size) {
            return Err(ConfigError::Invalid(format!(
                "trend.block_size must be within 1..={MAX_BLOCK_SIZE}, got {}",
                self.trend.block_size
            )));
        }
        if !self.trend.threshold.is_finite() || self.trend.threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "trend.threshold must be a finite non-negative number, got {}",
                self.trend.threshold
            )));
        }
        if !(1..=MAX_SAMPLES_PER_READ).contains(&self.sensor.samples_per_read) {
            return Err(ConfigError::Invalid(format!(
                "sensor.samples_per_read must be within 1..={MAX_SAMPLES_PER_READ}, got {}",
                self.sensor.samples_per_read
            )));
        }
        if self.metrics.histogram_size > MAX_HISTOGRAM_SIZE {
            return Err(ConfigError::Invalid(format!(
                "metrics.histogram_size must be at most {MAX_HISTOGRAM_SIZE}, got {}",
                self.metrics.histogram_size
            )));
        }
        if self.sensor.profile.kind == ProfileKind::Sine && self.sensor.profile.period_reads == 0 {
            return Err(ConfigError::Invalid(
                "sensor.profile.period_reads must be non-zero for a sine profile".into(),
            ));
        }
        if self.realtime.enabled && !(1..=99).contains(&self.realtime.priority) {
            return Err(ConfigError::Invalid(format!(
                "realtime.priority must be within 1..=99, got {}",
                self.realtime.priority
            )));
        }
        Ok(())
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is outside the range the executor accepts.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Serde helper module for `Duration` using humantime format.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
