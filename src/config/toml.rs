//! TOML configuration file parsing

use super::*;
use crate::config::cli::Cli;
use crate::config::cli_convert::{convert_oracle_kind, convert_output_format, parse_duration};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config = ::toml::from_str(contents).context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Result<Config> {
    // A number source on the command line replaces both file-configured sources
    if cli.number.is_some() || cli.number_file.is_some() {
        config.coordinator.number = cli.number.clone();
        config.coordinator.number_file = cli.number_file.clone();
    }

    // Coordinator
    if let Some(ref listen) = cli.listen {
        config.coordinator.listen_addr = listen.clone();
    }
    if let Some(size) = cli.range_size {
        config.coordinator.range_size = size;
    }
    if let Some(floor) = cli.start_floor {
        config.coordinator.start_floor = floor;
    }
    if let Some(window) = cli.recent_window {
        config.coordinator.recent_window = window;
    }
    if let Some(ref timeout) = cli.worker_timeout {
        config.coordinator.worker_timeout_secs = whole_secs(parse_duration(timeout).context("Invalid --worker-timeout")?);
    }

    // Worker
    if let Some(ref url) = cli.coordinator_url {
        config.worker.coordinator_url = url.clone();
    }
    if let Some(workers) = cli.workers {
        config.worker.workers = workers;
    }
    if let Some(batch) = cli.batch_size {
        config.worker.batch_size = batch;
    }
    if let Some(ref interval) = cli.work_interval {
        config.worker.work_interval_ms = millis(parse_duration(interval).context("Invalid --work-interval")?);
    }
    if let Some(ref interval) = cli.status_interval {
        config.worker.status_interval_ms = millis(parse_duration(interval).context("Invalid --status-interval")?);
    }
    if let Some(ref timeout) = cli.request_timeout {
        config.worker.request_timeout_secs = whole_secs(parse_duration(timeout).context("Invalid --request-timeout")?);
    }
    if let Some(oracle) = cli.oracle {
        config.worker.oracle = convert_oracle_kind(oracle);
    }
    if let Some(seed) = cli.seed {
        config.worker.oracle_seed = Some(seed);
    }
    if let Some(ref id) = cli.worker_id {
        config.worker.worker_id = Some(id.clone());
    }

    // Output
    if let Some(format) = cli.format {
        config.output.format = convert_output_format(format);
    }
    if let Some(horizon) = cli.progress_horizon {
        config.output.progress_horizon = horizon;
    }

    // Runtime
    if let Some(ref duration) = cli.duration {
        let duration = parse_duration(duration).context("Invalid --duration")?;
        // Zero means run until interrupted
        config.runtime.duration_secs = if duration.is_zero() {
            None
        } else {
            Some(whole_secs(duration))
        };
    }
    if cli.dry_run {
        config.runtime.dry_run = true;
    }
    if cli.debug {
        config.runtime.debug = true;
    }

    Ok(config)
}

fn millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Seconds rounded up, so any nonzero duration is at least 1
fn whole_secs(duration: std::time::Duration) -> u64 {
    duration
        .as_secs()
        .saturating_add(u64::from(duration.subsec_nanos() > 0))
}
