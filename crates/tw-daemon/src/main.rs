//! TrendWatch daemon entry point.
//!
//! Loads configuration, applies real-time settings, wires the simulated
//! peripherals to the cyclic executor and runs it.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tw_common::config::ExecutorConfig;
use tw_common::metrics::MetricsSnapshot;
use tw_common::time::{duration_micros, SystemClock};
use tw_common::Trend;
use tw_runtime::{init_realtime, Executor, Peripherals};
use tw_trend::BlockSummary;

/// Environment variable naming a configuration file.
const CONFIG_ENV: &str = "TRENDWATCH_CONFIG";

/// TrendWatch command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "trendwatch",
    about = "TrendWatch - fixed-period temperature trend monitor",
    version,
    long_about = None
)]
struct Args {
    /// Path to a configuration file (TOML).
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum cycles to run (0 = run forever).
    #[arg(long, default_value = "0")]
    max_cycles: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// Cycle budget, e.g. "1s" or "250ms" (overrides config file).
    #[arg(long, value_parser = humantime::parse_duration)]
    budget: Option<Duration>,

    /// Samples per trend block (overrides config file).
    #[arg(long)]
    block_size: Option<usize>,

    /// Trend threshold in °C (overrides config file).
    #[arg(long)]
    threshold: Option<f32>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,

    /// Print the final summary as JSON on stdout.
    #[arg(long)]
    summary_json: bool,
}

/// Final run summary.
#[derive(Debug, Serialize)]
struct Summary {
    cycles: u64,
    trend: Trend,
    blocks_completed: u64,
    last_block: Option<BlockSummary>,
    percentiles_us: Vec<(f64, u64)>,
    metrics: MetricsSnapshot,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    let mut config = load_config(&args)?;
    apply_overrides(&mut config, &args);
    config.validate().context("Invalid configuration")?;

    if args.print_config {
        print!("{}", config.to_toml().context("Failed to serialize configuration")?);
        return Ok(());
    }

    info!(version = env!("CARGO_PKG_VERSION"), "Starting TrendWatch");
    info!(
        budget = %humantime::format_duration(config.cycle_budget),
        block_size = config.trend.block_size,
        threshold = config.trend.threshold,
        indicator = ?config.indicator.kind,
        "Configuration loaded"
    );

    let status = init_realtime(&config.realtime).context("Failed to initialize real-time environment")?;
    if config.realtime.enabled && status.priority.is_none() {
        warn!("Running without real-time priority, expect larger jitter");
    }

    let clock = SystemClock::new();
    let peripherals = Peripherals::simulated(&clock, &config);
    let mut executor = Executor::from_config(clock, peripherals, &config);

    if args.max_cycles == 0 {
        executor.run();
    }

    info!(cycles = args.max_cycles, "Running bounded session");
    executor.run_cycles(args.max_cycles);

    let summary = summarize(&executor, &config);
    log_summary(&summary);
    if args.summary_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?
        );
    }

    Ok(())
}

/// Initialize logging with the specified log level.
fn init_logging(level: &str) {
    let filter = format!(
        "trendwatch={level},tw_runtime={level},tw_trend={level},tw_devices={level},tw_common={level}"
    );

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .with_target(true)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Resolution priority (first existing file wins):
/// 1. Command-line `--config` argument
/// 2. `TRENDWATCH_CONFIG` environment variable
/// 3. `/etc/trendwatch/config.toml` (system path)
/// 4. `config/default.toml` (local development)
/// 5. Built-in defaults
fn load_config(args: &Args) -> Result<ExecutorConfig> {
    if let Some(config_path) = &args.config {
        info!(?config_path, "Loading config from command-line argument");
        return ExecutorConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()));
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        let config_path = PathBuf::from(&env_path);
        if config_path.exists() {
            info!(?config_path, "Loading config from {CONFIG_ENV}");
            return ExecutorConfig::from_file(&config_path)
                .with_context(|| format!("Failed to load config from {CONFIG_ENV}={env_path}"));
        }
        warn!(
            path = %env_path,
            "{CONFIG_ENV} set but file does not exist, checking other locations"
        );
    }

    for path in ["/etc/trendwatch/config.toml", "config/default.toml"] {
        let config_path = PathBuf::from(path);
        if config_path.exists() {
            info!(?config_path, "Loading config file");
            return ExecutorConfig::from_file(&config_path)
                .with_context(|| format!("Failed to load config from {path}"));
        }
    }

    info!("No config file found, using built-in defaults");
    Ok(ExecutorConfig::default())
}

/// Apply command-line overrides on top of the loaded configuration.
fn apply_overrides(config: &mut ExecutorConfig, args: &Args) {
    if let Some(budget) = args.budget {
        config.cycle_budget = budget;
    }
    if let Some(block_size) = args.block_size {
        config.trend.block_size = block_size;
    }
    if let Some(threshold) = args.threshold {
        config.trend.threshold = threshold;
    }
}

fn summarize(executor: &Executor<SystemClock>, config: &ExecutorConfig) -> Summary {
    let metrics = executor.metrics();
    let context = executor.context();
    Summary {
        cycles: executor.cycle_count(),
        trend: context.trend,
        blocks_completed: context.classifier.blocks_completed(),
        last_block: context.last_block,
        percentiles_us: metrics
            .percentiles(&config.metrics.percentiles)
            .into_iter()
            .map(|(p, d)| (p, duration_micros(d)))
            .collect(),
        metrics: metrics.snapshot(),
    }
}

fn log_summary(summary: &Summary) {
    let m = &summary.metrics;
    info!(
        cycles = summary.cycles,
        min_us = m.min_us,
        mean_us = m.mean_us,
        max_us = m.max_us,
        max_abs_jitter_us = m.max_abs_jitter_us,
        peak_utilization = m.peak_utilization(),
        overruns = m.overrun_count,
        skipped = m.skipped_boundaries,
        "Session timing"
    );
    for (p, us) in &summary.percentiles_us {
        info!(percentile = p, us, "Execution time percentile");
    }
    for (index, slot) in m.slots.iter().enumerate() {
        info!(
            slot = index,
            mean_us = slot.mean_us(),
            max_us = slot.max_us,
            "Slot timing"
        );
    }
    info!(
        trend = %summary.trend,
        blocks = summary.blocks_completed,
        last_average = summary.last_block.map(|b| b.average),
        "TrendWatch stopped"
    );
}
