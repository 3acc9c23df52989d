//! Rate and count formatting
//!
//! Helpers shared by the console sink, the configuration banner and the end of
//! run summary.

use std::time::Duration;

/// Format a duration in human-readable form
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use primepulse::util::time::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
/// assert_eq!(format_duration(Duration::from_secs(5)), "5.00s");
/// assert_eq!(format_duration(Duration::from_secs(150)), "2m30s");
/// assert_eq!(format_duration(Duration::from_secs(7260)), "2h01m");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 1 {
        format!("{}ms", duration.as_millis())
    } else if secs < 60 {
        format!("{:.2}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{}h{:02}m", secs / 3600, (secs % 3600) / 60)
    }
}

/// Format a per-second rate with a metric suffix
///
/// ```
/// use primepulse::util::time::format_rate;
///
/// assert_eq!(format_rate(500.0), "500/s");
/// assert_eq!(format_rate(1500.0), "1.50K/s");
/// assert_eq!(format_rate(2_500_000.0), "2.50M/s");
/// ```
pub fn format_rate(rate: f64) -> String {
    const UNITS: [(f64, &str); 3] = [(1e9, "G"), (1e6, "M"), (1e3, "K")];

    for (scale, suffix) in UNITS {
        if rate >= scale {
            return format!("{:.2}{}/s", rate / scale, suffix);
        }
    }
    format!("{:.0}/s", rate)
}

/// Events per second over `duration` (0 for an empty duration)
pub fn calculate_rate(count: u64, duration: Duration) -> f64 {
    let seconds = duration.as_secs_f64();
    if seconds > 0.0 {
        count as f64 / seconds
    } else {
        0.0
    }
}

/// Format a count with thousands separators
///
/// ```
/// use primepulse::util::time::format_count;
///
/// assert_eq!(format_count(1234567), "1,234,567");
/// ```
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(0)), "0ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(60)), "1m00s");
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h00m");
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(0.0), "0/s");
        assert_eq!(format_rate(999.4), "999/s");
        assert_eq!(format_rate(3_000_000_000.0), "3.00G/s");
    }

    #[test]
    fn test_calculate_rate() {
        assert_eq!(calculate_rate(1000, Duration::from_secs(10)), 100.0);
        assert_eq!(calculate_rate(1000, Duration::ZERO), 0.0);
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(u64::MAX), "18,446,744,073,709,551,615");
    }
}
