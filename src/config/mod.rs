//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.
//! Every field has a default, so an empty TOML file (or none at all) plus a
//! `--number` is a complete standalone configuration.

pub mod cli;
pub mod cli_convert;
pub mod toml;
pub mod validator;

use crate::coordinator::CoordinatorSettings;
use crate::target::TargetNumber;
use crate::worker::WorkerSettings;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Complete run configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// HTTP listen address (coordinator mode)
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Candidates per issued range
    #[serde(default = "default_range_size")]
    pub range_size: u64,
    /// First candidate of the first range
    #[serde(default = "default_start_floor")]
    pub start_floor: u64,
    /// Capacity of the recent-divisor window
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,
    /// Seconds of silence before a lease stops counting as active
    #[serde(default = "default_worker_timeout_secs")]
    pub worker_timeout_secs: u64,
    /// Number to factor, as decimal digits
    pub number: Option<String>,
    /// File holding the number to factor
    pub number_file: Option<PathBuf>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_range_size() -> u64 {
    10_000
}

fn default_start_floor() -> u64 {
    2
}

fn default_recent_window() -> usize {
    5
}

fn default_worker_timeout_secs() -> u64 {
    300
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            range_size: default_range_size(),
            start_floor: default_start_floor(),
            recent_window: default_recent_window(),
            worker_timeout_secs: default_worker_timeout_secs(),
            number: None,
            number_file: None,
        }
    }
}

impl CoordinatorConfig {
    /// Load the number to factor from whichever source is configured
    pub fn load_number(&self) -> crate::Result<TargetNumber> {
        match (&self.number, &self.number_file) {
            (Some(digits), None) => Ok(TargetNumber::parse(digits)?),
            (None, Some(path)) => TargetNumber::from_file(path),
            (Some(_), Some(_)) => {
                anyhow::bail!("number and number_file are mutually exclusive")
            }
            (None, None) => anyhow::bail!("No number to factor: set --number or --number-file"),
        }
    }

    pub fn settings(&self) -> CoordinatorSettings {
        CoordinatorSettings::from(self)
    }
}

/// Divisibility oracle selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleKind {
    /// Exact remainder test
    #[default]
    Modulus,
    /// Seeded random placeholder
    Simulated,
}

impl fmt::Display for OracleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleKind::Modulus => write!(f, "modulus"),
            OracleKind::Simulated => write!(f, "simulated"),
        }
    }
}

/// Worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Coordinator base URL (worker mode)
    #[serde(default = "default_coordinator_url")]
    pub coordinator_url: String,
    /// Range workers per process (0 = one per CPU)
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Candidates tested per tick
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Work tick period (milliseconds)
    #[serde(default = "default_work_interval_ms")]
    pub work_interval_ms: u64,
    /// Status poll period (milliseconds)
    #[serde(default = "default_status_interval_ms")]
    pub status_interval_ms: u64,
    /// Bound on every HTTP request (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Divisibility oracle
    #[serde(default)]
    pub oracle: OracleKind,
    /// Seed for the simulated oracle (entropy when absent)
    pub oracle_seed: Option<u64>,
    /// Worker id prefix (generated ids when absent)
    pub worker_id: Option<String>,
}

fn default_coordinator_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_workers() -> usize {
    1
}

fn default_batch_size() -> usize {
    10
}

fn default_work_interval_ms() -> u64 {
    100
}

fn default_status_interval_ms() -> u64 {
    2000
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            coordinator_url: default_coordinator_url(),
            workers: default_workers(),
            batch_size: default_batch_size(),
            work_interval_ms: default_work_interval_ms(),
            status_interval_ms: default_status_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            oracle: OracleKind::default(),
            oracle_seed: None,
            worker_id: None,
        }
    }
}

impl WorkerConfig {
    /// Worker count with `0` resolved to the number of CPUs
    pub fn resolved_workers(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn settings(&self) -> WorkerSettings {
        WorkerSettings {
            batch_size: self.batch_size,
            work_interval: Duration::from_millis(self.work_interval_ms),
            status_interval: Some(Duration::from_millis(self.status_interval_ms)),
        }
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Console lines
    #[default]
    Text,
    /// JSON lines on stdout
    Json,
    /// No status output
    None,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::None => write!(f, "none"),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Denominator of the progress percentage
    #[serde(default = "default_progress_horizon")]
    pub progress_horizon: u64,
}

fn default_progress_horizon() -> u64 {
    crate::stats::DEFAULT_PROGRESS_HORIZON
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            progress_horizon: default_progress_horizon(),
        }
    }
}

/// Runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Stop after this many seconds (run until interrupted when absent)
    pub duration_secs: Option<u64>,
    /// Validate and print the configuration, then exit
    #[serde(default)]
    pub dry_run: bool,
    /// Debug-level logging
    #[serde(default)]
    pub debug: bool,
}

impl RuntimeConfig {
    pub fn duration(&self) -> Option<Duration> {
        self.duration_secs.map(Duration::from_secs)
    }
}
