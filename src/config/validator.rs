//! Configuration validation

use super::*;
use crate::config::cli::ExecutionMode;
use crate::prime::LARGEST_U64_PRIME;
use anyhow::Result;
use std::net::SocketAddr;

/// Upper bound on range workers in one process
pub const MAX_WORKERS: usize = 1024;

/// Validate complete configuration for the given mode
pub fn validate_config(config: &Config, mode: ExecutionMode) -> Result<()> {
    match mode {
        ExecutionMode::Standalone => {
            validate_coordinator(&config.coordinator)?;
            validate_number_source(&config.coordinator)?;
            validate_worker(&config.worker)?;
        }
        ExecutionMode::Coordinator => {
            validate_coordinator(&config.coordinator)?;
            validate_number_source(&config.coordinator)?;
            validate_listen_addr(&config.coordinator.listen_addr)?;
        }
        ExecutionMode::Worker => {
            validate_worker(&config.worker)?;
            validate_coordinator_url(&config.worker.coordinator_url)?;
        }
    }

    validate_output(&config.output)?;

    Ok(())
}

/// Validate coordinator configuration
pub fn validate_coordinator(coordinator: &CoordinatorConfig) -> Result<()> {
    if coordinator.range_size == 0 {
        anyhow::bail!("range_size must be at least 1");
    }

    if coordinator.start_floor < 2 {
        anyhow::bail!("start_floor must be at least 2, got {}", coordinator.start_floor);
    }

    if coordinator.start_floor > LARGEST_U64_PRIME {
        anyhow::bail!(
            "start_floor must be at most {} (the largest 64-bit prime), got {}",
            LARGEST_U64_PRIME,
            coordinator.start_floor
        );
    }

    if coordinator.recent_window == 0 {
        anyhow::bail!("recent_window must be at least 1");
    }

    if coordinator.worker_timeout_secs == 0 {
        anyhow::bail!("worker_timeout must be greater than zero");
    }

    Ok(())
}

fn validate_number_source(coordinator: &CoordinatorConfig) -> Result<()> {
    match (&coordinator.number, &coordinator.number_file) {
        (Some(_), Some(_)) => anyhow::bail!("number and number_file are mutually exclusive"),
        (None, None) => anyhow::bail!("No number to factor: set --number or --number-file"),
        (Some(digits), None) => {
            crate::target::TargetNumber::parse(digits)?;
        }
        // The file is read at startup, where a bad path gets its own context
        (None, Some(_)) => {}
    }

    Ok(())
}

fn validate_listen_addr(addr: &str) -> Result<()> {
    addr.parse::<SocketAddr>()
        .map_err(|e| anyhow::anyhow!("Invalid listen address '{}': {}", addr, e))?;
    Ok(())
}

/// Validate worker configuration
pub fn validate_worker(worker: &WorkerConfig) -> Result<()> {
    if worker.workers > MAX_WORKERS {
        anyhow::bail!("workers must be at most {}, got {}", MAX_WORKERS, worker.workers);
    }

    if worker.batch_size == 0 {
        anyhow::bail!("batch_size must be at least 1");
    }

    if worker.work_interval_ms == 0 {
        anyhow::bail!("work_interval must be greater than zero");
    }

    if worker.status_interval_ms == 0 {
        anyhow::bail!("status_interval must be greater than zero");
    }

    if worker.request_timeout_secs == 0 {
        anyhow::bail!("request_timeout must be greater than zero");
    }

    if let Some(ref id) = worker.worker_id {
        if id.trim().is_empty() {
            anyhow::bail!("worker_id must not be blank");
        }
    }

    Ok(())
}

fn validate_coordinator_url(url: &str) -> Result<()> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        anyhow::bail!("coordinator_url must start with http:// or https://, got '{}'", url);
    }

    Ok(())
}

/// Validate output configuration
pub fn validate_output(output: &OutputConfig) -> Result<()> {
    if output.progress_horizon == 0 {
        anyhow::bail!("progress_horizon must be at least 1");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standalone() -> Config {
        let mut config = Config::default();
        config.coordinator.number = Some("589".into());
        config
    }

    #[test]
    fn test_defaults_with_number_are_valid() {
        assert!(validate_config(&standalone(), ExecutionMode::Standalone).is_ok());
        assert!(validate_config(&standalone(), ExecutionMode::Coordinator).is_ok());
        assert!(validate_config(&Config::default(), ExecutionMode::Worker).is_ok());
    }

    #[test]
    fn test_number_required_outside_worker_mode() {
        assert!(validate_config(&Config::default(), ExecutionMode::Standalone).is_err());
        assert!(validate_config(&Config::default(), ExecutionMode::Coordinator).is_err());
    }

    #[test]
    fn test_invalid_number_digits() {
        let mut config = standalone();
        config.coordinator.number = Some("12a".into());
        assert!(validate_config(&config, ExecutionMode::Standalone).is_err());
    }

    #[test]
    fn test_zero_sizes_rejected() {
        let mut config = standalone();
        config.coordinator.range_size = 0;
        assert!(validate_config(&config, ExecutionMode::Standalone).is_err());

        let mut config = standalone();
        config.worker.batch_size = 0;
        assert!(validate_config(&config, ExecutionMode::Standalone).is_err());

        let mut config = standalone();
        config.coordinator.recent_window = 0;
        assert!(validate_config(&config, ExecutionMode::Coordinator).is_err());
    }

    #[test]
    fn test_start_floor_bounds() {
        let mut config = standalone();
        config.coordinator.start_floor = 1;
        assert!(validate_config(&config, ExecutionMode::Standalone).is_err());

        config.coordinator.start_floor = u64::MAX - 100;
        let err = validate_config(&config, ExecutionMode::Coordinator).unwrap_err();
        assert!(err.to_string().contains("start_floor"));

        config.coordinator.start_floor = LARGEST_U64_PRIME + 1;
        assert!(validate_config(&config, ExecutionMode::Standalone).is_err());

        config.coordinator.start_floor = LARGEST_U64_PRIME;
        assert!(validate_config(&config, ExecutionMode::Standalone).is_ok());
    }

    #[test]
    fn test_worker_limits() {
        let mut config = Config::default();
        config.worker.workers = MAX_WORKERS + 1;
        assert!(validate_config(&config, ExecutionMode::Worker).is_err());

        config.worker.workers = 0;
        assert!(validate_config(&config, ExecutionMode::Worker).is_ok());
    }

    #[test]
    fn test_addresses() {
        let mut config = standalone();
        config.coordinator.listen_addr = "localhost".into();
        assert!(validate_config(&config, ExecutionMode::Coordinator).is_err());
        // Standalone never binds
        assert!(validate_config(&config, ExecutionMode::Standalone).is_ok());

        let mut config = Config::default();
        config.worker.coordinator_url = "10.0.0.5:5000".into();
        assert!(validate_config(&config, ExecutionMode::Worker).is_err());
    }
}
