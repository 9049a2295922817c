//! Battery detection module
//!
//! Detects battery state using:
//! - Linux: /sys/class/power_supply
//! - Windows: wmic Win32_Battery
//!
//! Hosts without a battery report `has_battery = false` with the AC line
//! assumed connected; every other field is then meaningless and stays None.

use anyhow::Result;
use serde::{Deserialize, Serialize};
#[cfg(target_os = "linux")]
use std::fs;
#[cfg(target_os = "linux")]
use std::path::Path;

/// Battery information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryRecord {
    pub has_battery: bool,
    pub ac_connected: bool,
    /// Battery chemistry (e.g. "Li-ion")
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub model: Option<String>,
    pub manufacturer: Option<String>,
    pub serial: Option<String>,
    /// Charge level in percent
    pub percent: Option<u8>,
    pub is_charging: bool,
    /// Estimated minutes until empty (discharging) or full (charging)
    pub time_remaining_min: Option<i64>,
    /// Unit for the capacity fields ("mWh" or "mAh")
    pub capacity_unit: Option<String>,
    pub current_capacity: Option<u64>,
    pub designed_capacity: Option<u64>,
    pub max_capacity: Option<u64>,
    pub cycle_count: Option<u32>,
    /// Battery voltage in volts
    pub voltage_v: Option<f64>,
}

impl Default for BatteryRecord {
    fn default() -> Self {
        BatteryRecord {
            has_battery: false,
            // A host running without a battery is on mains power.
            ac_connected: true,
            kind: None,
            model: None,
            manufacturer: None,
            serial: None,
            percent: None,
            is_charging: false,
            time_remaining_min: None,
            capacity_unit: None,
            current_capacity: None,
            designed_capacity: None,
            max_capacity: None,
            cycle_count: None,
            voltage_v: None,
        }
    }
}

impl BatteryRecord {
    /// Detect battery information (platform-specific)
    pub fn detect() -> Result<Self> {
        #[cfg(target_os = "linux")]
        {
            Ok(Self::detect_power_supply())
        }
        #[cfg(target_os = "windows")]
        {
            Ok(Self::detect_wmic())
        }
        #[cfg(not(any(target_os = "linux", target_os = "windows")))]
        {
            Ok(BatteryRecord::default())
        }
    }

    /// Scan /sys/class/power_supply for the system battery and AC adapter
    #[cfg(target_os = "linux")]
    fn detect_power_supply() -> Self {
        let mut record = BatteryRecord::default();
        let base = Path::new("/sys/class/power_supply");
        let entries = match fs::read_dir(base) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::debug!(error = %err, "no power_supply class");
                return record;
            }
        };

        let mut adapter_online = false;
        for entry in entries.flatten() {
            let path = entry.path();
            let kind = read_trimmed(&path.join("type")).unwrap_or_default();
            match kind.as_str() {
                "Mains" | "USB" => {
                    if read_trimmed(&path.join("online")).as_deref() == Some("1") {
                        adapter_online = true;
                    }
                }
                "Battery" => {
                    // Peripherals (mice, headsets) also show up as batteries.
                    if read_trimmed(&path.join("scope")).as_deref() == Some("Device") {
                        continue;
                    }
                    if !record.has_battery {
                        record.fill_from_sysfs(&path);
                    }
                }
                _ => {}
            }
        }
        if adapter_online {
            record.ac_connected = true;
        }
        record
    }

    #[cfg(target_os = "linux")]
    fn fill_from_sysfs(&mut self, path: &Path) {
        self.has_battery = true;
        self.ac_connected = false;
        self.kind = read_trimmed(&path.join("technology"));
        self.model = read_trimmed(&path.join("model_name"));
        self.manufacturer = read_trimmed(&path.join("manufacturer"));
        self.serial = read_trimmed(&path.join("serial_number"));
        self.percent = read_parsed(&path.join("capacity"));
        self.cycle_count = read_parsed(&path.join("cycle_count"));
        self.voltage_v = read_parsed::<u64>(&path.join("voltage_now"))
            .map(|microvolts| microvolts as f64 / 1_000_000.0);

        let status = read_trimmed(&path.join("status")).unwrap_or_default();
        self.is_charging = status == "Charging";
        if status == "Full" || status == "Charging" {
            self.ac_connected = true;
        }

        // Energy counters are in microwatt-hours; charge counters in
        // microamp-hours. Whichever family the driver exposes wins.
        let energy_now = read_parsed::<u64>(&path.join("energy_now"));
        let energy_full = read_parsed::<u64>(&path.join("energy_full"));
        let energy_design = read_parsed::<u64>(&path.join("energy_full_design"));
        let rate = read_parsed::<u64>(&path.join("power_now"));

        let (now, full, design, rate, unit) = if energy_now.is_some() {
            (energy_now, energy_full, energy_design, rate, "mWh")
        } else {
            (
                read_parsed::<u64>(&path.join("charge_now")),
                read_parsed::<u64>(&path.join("charge_full")),
                read_parsed::<u64>(&path.join("charge_full_design")),
                read_parsed::<u64>(&path.join("current_now")),
                "mAh",
            )
        };

        if now.is_some() || full.is_some() || design.is_some() {
            self.capacity_unit = Some(unit.to_string());
        }
        self.current_capacity = now.map(|v| v / 1000);
        self.max_capacity = full.map(|v| v / 1000);
        self.designed_capacity = design.map(|v| v / 1000);
        self.time_remaining_min = estimate_minutes(self.is_charging, now, full, rate);
    }

    /// Query Win32_Battery via wmic (Windows only)
    #[cfg(target_os = "windows")]
    fn detect_wmic() -> Self {
        use std::process::Command;

        let mut record = BatteryRecord::default();
        let output = Command::new("wmic")
            .args([
                "path",
                "Win32_Battery",
                "get",
                "BatteryStatus,EstimatedChargeRemaining,EstimatedRunTime,DeviceID",
                "/format:csv",
            ])
            .output();

        let output = match output {
            Ok(output) if output.status.success() => output,
            _ => return record,
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        // CSV columns: Node,BatteryStatus,DeviceID,EstimatedChargeRemaining,EstimatedRunTime
        for line in stdout.lines().skip(1) {
            let parts: Vec<&str> = line.split(',').collect();
            if parts.len() < 5 {
                continue;
            }
            record.has_battery = true;
            let status: Option<u32> = parts[1].trim().parse().ok();
            // Status 1 = discharging, 2 = on AC, 6..9 = charging states.
            record.ac_connected = !matches!(status, Some(1));
            record.is_charging = matches!(status, Some(6..=9));
            record.serial = Some(parts[2].trim().to_string()).filter(|s| !s.is_empty());
            record.percent = parts[3].trim().parse().ok();
            // EstimatedRunTime reports 71582788 when the estimate is unknown.
            record.time_remaining_min = parts[4]
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|&min| min > 0 && min < 60 * 24 * 7);
            break;
        }
        record
    }
}

#[cfg(target_os = "linux")]
fn read_trimmed(path: &Path) -> Option<String> {
    let raw = fs::read_to_string(path).ok()?;
    let trimmed = raw.trim().to_string();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(target_os = "linux")]
fn read_parsed<T: std::str::FromStr>(path: &Path) -> Option<T> {
    read_trimmed(path)?.parse().ok()
}

/// Minutes until empty while discharging, or until full while charging.
/// The counters share a unit, so the ratio works for both energy and
/// charge families. A zero or missing rate means no estimate.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn estimate_minutes(
    charging: bool,
    now: Option<u64>,
    full: Option<u64>,
    rate: Option<u64>,
) -> Option<i64> {
    let rate = rate.filter(|&r| r > 0)?;
    let now = now?;
    let remaining = if charging {
        full?.saturating_sub(now)
    } else {
        now
    };
    Some((remaining * 60 / rate) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discharge_estimate_uses_remaining_energy() {
        // 24 Wh left, drawing 12 W -> two hours.
        assert_eq!(
            estimate_minutes(false, Some(24_000_000), Some(50_000_000), Some(12_000_000)),
            Some(120)
        );
    }

    #[test]
    fn charge_estimate_uses_energy_to_full() {
        // 26 Wh to go, charging at 26 W -> one hour.
        assert_eq!(
            estimate_minutes(true, Some(24_000_000), Some(50_000_000), Some(26_000_000)),
            Some(60)
        );
    }

    #[test]
    fn zero_or_missing_rate_yields_no_estimate() {
        assert_eq!(estimate_minutes(false, Some(1_000), Some(2_000), Some(0)), None);
        assert_eq!(estimate_minutes(false, Some(1_000), Some(2_000), None), None);
        assert_eq!(estimate_minutes(false, None, Some(2_000), Some(5)), None);
    }

    #[test]
    fn batteryless_default_is_on_mains() {
        let record = BatteryRecord::default();
        assert!(!record.has_battery);
        assert!(record.ac_connected);
        assert!(record.percent.is_none());
    }
}
