//! CLI to Config conversion utilities

use crate::config::cli;
use anyhow::{Context, Result};
use std::time::Duration;

/// Parse a duration string (e.g., "250ms", "60s", "5m", "1h"); bare numbers are seconds
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();

    let (num_str, millis_per_unit) = if let Some(n) = s.strip_suffix("ms") {
        (n, 1u64)
    } else if let Some(n) = s.strip_suffix("sec").or_else(|| s.strip_suffix('s')) {
        (n, 1000)
    } else if let Some(n) = s.strip_suffix("min").or_else(|| s.strip_suffix('m')) {
        (n, 60_000)
    } else if let Some(n) = s.strip_suffix("hr").or_else(|| s.strip_suffix('h')) {
        (n, 3_600_000)
    } else {
        (s.as_str(), 1000)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .with_context(|| format!("Invalid duration format: {}", s))?;

    let millis = num
        .checked_mul(millis_per_unit)
        .with_context(|| format!("Duration out of range: {}", s))?;

    Ok(Duration::from_millis(millis))
}

/// Convert CLI OracleKind to config OracleKind
pub fn convert_oracle_kind(cli_kind: cli::OracleKind) -> super::OracleKind {
    match cli_kind {
        cli::OracleKind::Modulus => super::OracleKind::Modulus,
        cli::OracleKind::Simulated => super::OracleKind::Simulated,
    }
}

/// Convert CLI OutputFormat to config OutputFormat
pub fn convert_output_format(cli_format: cli::OutputFormat) -> super::OutputFormat {
    match cli_format {
        cli::OutputFormat::Text => super::OutputFormat::Text,
        cli::OutputFormat::Json => super::OutputFormat::Json,
        cli::OutputFormat::None => super::OutputFormat::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("30sec").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("2min").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration(" 45 ").unwrap(), Duration::from_secs(45));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("-5s").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn test_conversions() {
        assert_eq!(convert_oracle_kind(cli::OracleKind::Simulated), super::super::OracleKind::Simulated);
        assert_eq!(convert_output_format(cli::OutputFormat::Json), super::super::OutputFormat::Json);
    }
}
