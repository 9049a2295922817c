//! Formatting helpers for telemetry values
//!
//! Pure conversions shared by every screen: byte counts to human units,
//! minute counts to durations, percentages to a severity tier.

use colored::{ColoredString, Colorize};

/// Placeholder shown for any field the provider could not fill in.
pub const DASH: &str = "—";

/// Format a byte count as gigabytes with two decimals, e.g. "16.00 GB".
pub fn bytes_to_gb(bytes: u64) -> String {
    format!("{:.2} GB", bytes as f64 / 1024.0 / 1024.0 / 1024.0)
}

/// Format a byte count as megabytes with two decimals, e.g. "512.00 MB".
pub fn bytes_to_mb(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}

/// Format a minute count as "2h 5m". None and negative values render as
/// the placeholder dash (the provider reports -1 or nothing when the
/// estimate is unavailable). Zero is a real estimate and renders as
/// "0h 0m", not the dash.
pub fn minutes_to_duration(minutes: Option<i64>) -> String {
    match minutes {
        Some(min) if min >= 0 => format!("{}h {}m", min / 60, min % 60),
        _ => DASH.to_string(),
    }
}

/// Severity tier derived from a percentage. Used only to pick a display
/// color; out-of-range inputs classify through the same thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    High,
    Medium,
    Low,
}

impl Tier {
    pub fn from_percent(percent: f64) -> Self {
        if percent >= 80.0 {
            Tier::High
        } else if percent >= 40.0 {
            Tier::Medium
        } else {
            Tier::Low
        }
    }

    /// Colorize `text` for this tier (high charge reads as healthy).
    pub fn paint(self, text: &str) -> ColoredString {
        match self {
            Tier::High => text.green(),
            Tier::Medium => text.yellow(),
            Tier::Low => text.red(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gigabytes_round_to_two_decimals() {
        assert_eq!(bytes_to_gb(1_073_741_824), "1.00 GB");
        assert_eq!(bytes_to_gb(0), "0.00 GB");
        assert_eq!(bytes_to_gb(16_106_127_360), "15.00 GB");
    }

    #[test]
    fn megabytes_round_to_two_decimals() {
        assert_eq!(bytes_to_mb(1_048_576), "1.00 MB");
        assert_eq!(bytes_to_mb(1_572_864), "1.50 MB");
    }

    #[test]
    fn durations_use_floor_division() {
        assert_eq!(minutes_to_duration(Some(125)), "2h 5m");
        assert_eq!(minutes_to_duration(Some(59)), "0h 59m");
        assert_eq!(minutes_to_duration(Some(0)), "0h 0m");
    }

    #[test]
    fn unavailable_durations_render_as_dash() {
        assert_eq!(minutes_to_duration(None), DASH);
        assert_eq!(minutes_to_duration(Some(-5)), DASH);
    }

    #[test]
    fn tier_thresholds() {
        assert_eq!(Tier::from_percent(85.0), Tier::High);
        assert_eq!(Tier::from_percent(50.0), Tier::Medium);
        assert_eq!(Tier::from_percent(10.0), Tier::Low);
    }

    #[test]
    fn tier_boundaries_are_inclusive() {
        assert_eq!(Tier::from_percent(80.0), Tier::High);
        assert_eq!(Tier::from_percent(40.0), Tier::Medium);
        assert_eq!(Tier::from_percent(39.9), Tier::Low);
        // Out-of-range inputs still classify.
        assert_eq!(Tier::from_percent(120.0), Tier::High);
        assert_eq!(Tier::from_percent(-3.0), Tier::Low);
    }
}
