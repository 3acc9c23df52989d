//! CLI argument parsing using clap
//!
//! Every tunable is an `Option` so that only flags the user actually passed
//! override values from a `--config` file.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Execution mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExecutionMode {
    /// Standalone mode (default) - in-process coordinator plus local workers
    Standalone,
    /// Coordinator mode - serve range leases over HTTP
    Coordinator,
    /// Worker mode - run range workers against a remote coordinator
    Worker,
}

/// Divisibility oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OracleKind {
    /// Exact remainder test
    Modulus,
    /// Seeded random placeholder
    Simulated,
}

/// Status output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    None,
}

/// PrimePulse - distributed prime-divisor search
#[derive(Parser, Debug)]
#[command(name = "primepulse")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Execution mode: standalone, coordinator, or worker
    #[arg(long, value_enum, default_value = "standalone")]
    pub mode: ExecutionMode,

    /// TOML configuration file (flags override its values)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    // === Number ===
    /// Number to factor, as decimal digits
    #[arg(short = 'n', long)]
    pub number: Option<String>,

    /// File containing the number to factor
    #[arg(long)]
    pub number_file: Option<PathBuf>,

    // === Coordinator Options ===
    /// Address to listen on (coordinator mode)
    #[arg(long)]
    pub listen: Option<String>,

    /// Candidates per issued range
    #[arg(short = 'r', long)]
    pub range_size: Option<u64>,

    /// First candidate of the first range
    #[arg(long)]
    pub start_floor: Option<u64>,

    /// Number of recent divisors kept for status
    #[arg(long)]
    pub recent_window: Option<usize>,

    /// Inactivity before a lease stops counting as active (e.g., 300s, 5m)
    #[arg(long)]
    pub worker_timeout: Option<String>,

    // === Worker Options ===
    /// Coordinator base URL (worker mode)
    #[arg(long, env = "PRIMEPULSE_COORDINATOR")]
    pub coordinator_url: Option<String>,

    /// Range workers in this process (0 = one per CPU)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Candidates tested per work tick
    #[arg(short = 'b', long)]
    pub batch_size: Option<usize>,

    /// Work tick period (e.g., 100ms, 1s)
    #[arg(long)]
    pub work_interval: Option<String>,

    /// Status poll period (e.g., 2s)
    #[arg(long)]
    pub status_interval: Option<String>,

    /// Timeout for each coordinator request (e.g., 30s)
    #[arg(long)]
    pub request_timeout: Option<String>,

    /// Divisibility oracle
    #[arg(long, value_enum)]
    pub oracle: Option<OracleKind>,

    /// Seed for the simulated oracle
    #[arg(long)]
    pub seed: Option<u64>,

    /// Worker id prefix (ids are generated when omitted)
    #[arg(long)]
    pub worker_id: Option<String>,

    // === Output Options ===
    /// Status output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Denominator of the progress percentage
    #[arg(long)]
    pub progress_horizon: Option<u64>,

    // === Runtime Options ===
    /// Stop after this long (e.g., 60s, 5m, 1h); runs until Ctrl-C otherwise
    #[arg(short = 'd', long)]
    pub duration: Option<String>,

    /// Print the resolved configuration and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Debug-level logging (RUST_LOG overrides)
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Check flag combinations that are wrong regardless of any config file
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.number.is_some() && self.number_file.is_some() {
            anyhow::bail!("--number and --number-file are mutually exclusive");
        }

        if self.mode == ExecutionMode::Worker && (self.number.is_some() || self.number_file.is_some()) {
            anyhow::bail!("worker mode receives the number from the coordinator; drop --number/--number-file");
        }

        if self.mode != ExecutionMode::Coordinator && self.listen.is_some() {
            anyhow::bail!("--listen is only valid in coordinator mode");
        }

        if self.mode == ExecutionMode::Coordinator && self.workers.is_some() {
            anyhow::bail!("--workers is not valid in coordinator mode");
        }

        if self.seed.is_some() && self.oracle == Some(OracleKind::Modulus) {
            anyhow::bail!("--seed only applies to the simulated oracle");
        }

        if let Some(size) = self.range_size {
            if size == 0 {
                anyhow::bail!("range_size must be at least 1");
            }
        }

        if let Some(batch) = self.batch_size {
            if batch == 0 {
                anyhow::bail!("batch_size must be at least 1");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["primepulse"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_to_standalone() {
        let cli = parse(&["--number", "589"]);
        assert_eq!(cli.mode, ExecutionMode::Standalone);
        assert_eq!(cli.number.as_deref(), Some("589"));
        assert!(cli.workers.is_none());
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_worker_mode_flags() {
        let cli = parse(&[
            "--mode",
            "worker",
            "--coordinator-url",
            "http://10.0.0.5:5000",
            "-w",
            "4",
            "--oracle",
            "simulated",
            "--seed",
            "9",
        ]);
        assert_eq!(cli.mode, ExecutionMode::Worker);
        assert_eq!(cli.workers, Some(4));
        assert_eq!(cli.oracle, Some(OracleKind::Simulated));
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_invalid_combinations() {
        assert!(parse(&["-n", "589", "--number-file", "n.txt"]).validate().is_err());
        assert!(parse(&["--mode", "worker", "-n", "589"]).validate().is_err());
        assert!(parse(&["--listen", "0.0.0.0:5000"]).validate().is_err());
        assert!(parse(&["--mode", "coordinator", "-w", "2"]).validate().is_err());
        assert!(parse(&["--oracle", "modulus", "--seed", "1"]).validate().is_err());
        assert!(parse(&["-r", "0"]).validate().is_err());
        assert!(parse(&["-b", "0"]).validate().is_err());
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(Cli::try_parse_from(["primepulse", "--mode", "service"]).is_err());
    }
}
