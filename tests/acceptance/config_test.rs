//! Configuration files as the daemon loads them.

use std::io::Write;
use std::time::Duration;
use tw_common::config::{ExecutorConfig, IndicatorKind, ProfileKind};

#[test]
fn test_shipped_default_config_loads() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config/default.toml");
    let config = ExecutorConfig::from_file(&path).unwrap();
    assert_eq!(config.cycle_budget, Duration::from_secs(1));
    assert_eq!(config.trend.block_size, 50);
    assert!((config.trend.threshold - 0.05).abs() < f32::EPSILON);
    assert_eq!(config.sensor.samples_per_read, 100);
}

#[test]
fn test_partial_file_keeps_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
cycle_budget = "250ms"

[indicator]
kind = "neopixel"

[sensor.profile]
kind = "sine"
period_reads = 120
"#
    )
    .unwrap();

    let config = ExecutorConfig::from_file(file.path()).unwrap();
    assert_eq!(config.cycle_budget, Duration::from_millis(250));
    assert_eq!(config.indicator.kind, IndicatorKind::NeoPixel);
    assert_eq!(config.sensor.profile.kind, ProfileKind::Sine);
    assert_eq!(config.sensor.profile.period_reads, 120);
    assert_eq!(config.trend.block_size, 50);
}

#[test]
fn test_invalid_file_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "cycle_budget = \"0s\"").unwrap();
    assert!(ExecutorConfig::from_file(file.path()).is_err());
}
