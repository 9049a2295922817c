//! Presentation layer
//!
//! Renders each telemetry record as labeled, colorized, divider-separated
//! lines. Screens are built as Strings so the navigator decides when to
//! clear and print. Missing fields render as a placeholder dash; the field
//! layout never changes with data completeness.

use colored::Colorize;

use crate::format::{bytes_to_gb, bytes_to_mb, minutes_to_duration, Tier, DASH};
use crate::hardware::battery::BatteryRecord;
use crate::hardware::cpu::CpuRecord;
use crate::hardware::graphics::{ControllerRecord, DisplayRecord};
use crate::hardware::memory::MemoryRecord;

pub const NO_CONTROLLERS_NOTICE: &str = "No GPU controllers detected";
pub const NO_DISPLAYS_NOTICE: &str = "No displays detected";

const LABEL_WIDTH: usize = 16;

fn divider() -> String {
    "─".repeat(36).bright_black().to_string()
}

fn title(text: &str) -> String {
    text.bold().white().to_string()
}

fn subtitle(text: &str) -> String {
    text.bold().blue().to_string()
}

fn field(label: &str, value: impl std::fmt::Display) -> String {
    let label = format!("{label}:");
    format!("{} {value}", format!("{label:<LABEL_WIDTH$}").bright_black())
}

fn opt(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(DASH)
}

fn num<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| DASH.to_string())
}

fn yes_no(flag: bool) -> String {
    if flag {
        "Yes".green().to_string()
    } else {
        "No".bright_black().to_string()
    }
}

pub fn cpu_screen(cpu: &CpuRecord) -> String {
    let mut out = Vec::new();
    out.push(title("CPU INFORMATION"));
    out.push(divider());
    out.push(field("Manufacturer", &cpu.manufacturer));
    out.push(field("Brand", &cpu.brand));
    out.push(field("Vendor", &cpu.vendor));
    out.push(field("Family", opt(&cpu.family)));
    out.push(field("Model", opt(&cpu.model)));
    out.push(field("Stepping", opt(&cpu.stepping)));
    out.push(field("Speed", format!("{:.2} GHz", cpu.speed_ghz)));
    out.push(divider());
    out.push(field("Cores (logical)", cpu.cores));
    out.push(field("Cores (physical)", cpu.physical_cores));
    out.push(field("Perf cores", num(cpu.performance_cores)));
    out.push(field("Eff cores", num(cpu.efficiency_cores)));
    out.push(field("Processors", cpu.processors));
    out.push(divider());
    out.push(subtitle("Cache"));
    out.push(format!(
        "{}   {}",
        field("L1d", format!("{} KB", num(cpu.cache.l1d_kb))),
        field("L1i", format!("{} KB", num(cpu.cache.l1i_kb)))
    ));
    out.push(format!(
        "{}   {}",
        field("L2", format!("{} KB", num(cpu.cache.l2_kb))),
        field("L3", format!("{} KB", num(cpu.cache.l3_kb)))
    ));
    out.push(divider());
    out.join("\n")
}

pub fn memory_screen(mem: &MemoryRecord) -> String {
    let mut out = Vec::new();
    out.push(title("MEMORY INFORMATION"));
    out.push(divider());
    out.push(field("Total", bytes_to_gb(mem.total)));
    out.push(field("Used", bytes_to_gb(mem.used)));
    out.push(field("Free", bytes_to_gb(mem.free)));
    out.push(field("Available", bytes_to_gb(mem.available)));
    out.push(divider());
    out.push(subtitle("Swap"));
    out.push(field("Total", bytes_to_gb(mem.swap_total)));
    out.push(field("Used", bytes_to_gb(mem.swap_used)));
    out.push(field("Free", bytes_to_gb(mem.swap_free)));
    out.push(divider());
    out.join("\n")
}

pub fn controllers_screen(controllers: &[ControllerRecord]) -> String {
    let mut out = Vec::new();
    out.push(title("GPU CONTROLLERS"));
    out.push(divider());

    if controllers.is_empty() {
        out.push(NO_CONTROLLERS_NOTICE.red().to_string());
        return out.join("\n");
    }

    for (index, controller) in controllers.iter().enumerate() {
        out.push(format!("GPU #{}", index + 1).bold().magenta().to_string());
        out.push(field("Vendor", opt(&controller.vendor)));
        out.push(field("Model", opt(&controller.model)));
        out.push(field("Bus", opt(&controller.bus)));
        out.push(field("Driver", opt(&controller.driver_version)));
        out.push(divider());
        out.push(subtitle("Memory"));
        out.push(field(
            "VRAM",
            controller
                .vram_bytes
                .map(bytes_to_gb)
                .unwrap_or_else(|| DASH.to_string()),
        ));
        out.push(field(
            "Dynamic VRAM",
            if controller.vram_dynamic {
                "Yes".yellow().to_string()
            } else {
                "No".bright_black().to_string()
            },
        ));
        if let (Some(total), Some(used), Some(free)) = (
            controller.memory_total,
            controller.memory_used,
            controller.memory_free,
        ) {
            out.push(field("Total", bytes_to_mb(total)));
            out.push(field("Used", bytes_to_mb(used)));
            out.push(field("Free", bytes_to_mb(free)));
        }
        if index < controllers.len() - 1 {
            out.push(divider());
        }
    }
    out.push(divider());
    out.join("\n")
}

pub fn displays_screen(displays: &[DisplayRecord]) -> String {
    let mut out = Vec::new();
    out.push(title("DISPLAYS"));
    out.push(divider());

    if displays.is_empty() {
        out.push(NO_DISPLAYS_NOTICE.red().to_string());
        return out.join("\n");
    }

    let resolution = |x: Option<u32>, y: Option<u32>| match (x, y) {
        (Some(x), Some(y)) => format!("{x}×{y}"),
        _ => DASH.to_string(),
    };

    for (index, display) in displays.iter().enumerate() {
        out.push(
            format!("Display #{}", index + 1)
                .bold()
                .magenta()
                .to_string(),
        );
        out.push(field("Vendor", opt(&display.vendor)));
        out.push(field("Model", opt(&display.model)));
        out.push(field("Serial", opt(&display.serial)));
        out.push(field("Display ID", opt(&display.display_id)));
        out.push(divider());
        out.push(subtitle("General"));
        out.push(field("Main", yes_no(display.main)));
        out.push(field("Built-in", yes_no(display.builtin)));
        out.push(field("Connection", opt(&display.connection)));
        out.push(divider());
        out.push(subtitle("Resolution"));
        out.push(field(
            "Native",
            resolution(display.resolution_x, display.resolution_y),
        ));
        out.push(field(
            "Current",
            resolution(display.current_res_x, display.current_res_y),
        ));
        if index < displays.len() - 1 {
            out.push(divider());
        }
    }
    out.push(divider());
    out.join("\n")
}

pub fn battery_screen(battery: &BatteryRecord) -> String {
    let power_source = if battery.ac_connected {
        "AC adapter".green().to_string()
    } else {
        "Battery".yellow().to_string()
    };

    let mut out = Vec::new();
    out.push(title("BATTERY INFORMATION"));
    out.push(divider());

    if !battery.has_battery {
        out.push("No battery detected or data not available".bold().red().to_string());
        out.push(field("Power source", power_source));
        out.push(divider());
        return out.join("\n");
    }

    out.push(field("Type", opt(&battery.kind)));
    out.push(field("Model", opt(&battery.model)));
    out.push(field("Manufacturer", opt(&battery.manufacturer)));
    out.push(field("Serial", opt(&battery.serial)));
    out.push(divider());
    out.push(field("Power source", power_source));
    let charge = match battery.percent {
        Some(percent) => Tier::from_percent(percent as f64)
            .paint(&format!("{percent}%"))
            .to_string(),
        None => DASH.to_string(),
    };
    out.push(field("Charge", charge));
    out.push(field("Charging", yes_no(battery.is_charging)));
    out.push(field(
        "Time remaining",
        minutes_to_duration(battery.time_remaining_min),
    ));
    out.push(divider());
    out.push(subtitle("Capacity"));
    let unit = battery.capacity_unit.as_deref().unwrap_or("");
    let capacity =
        |value: Option<u64>| format!("{} {unit}", num(value)).trim_end().to_string();
    out.push(field("Current", capacity(battery.current_capacity)));
    out.push(field("Designed", capacity(battery.designed_capacity)));
    out.push(field("Max", capacity(battery.max_capacity)));
    out.push(field("Cycles", num(battery.cycle_count)));
    out.push(divider());
    out.push(subtitle("Electrical"));
    out.push(field(
        "Voltage",
        battery
            .voltage_v
            .map(|v| format!("{v:.2} V"))
            .unwrap_or_else(|| DASH.to_string()),
    ));
    out.push(divider());
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::cpu::CpuCache;

    fn plain() {
        colored::control::set_override(false);
    }

    fn sample_cpu() -> CpuRecord {
        CpuRecord {
            manufacturer: "Intel".to_string(),
            brand: "12th Gen Intel(R) Core(TM) i7-1260P".to_string(),
            vendor: "GenuineIntel".to_string(),
            family: Some("6".to_string()),
            model: Some("154".to_string()),
            stepping: Some("3".to_string()),
            speed_ghz: 2.1,
            cores: 16,
            physical_cores: 12,
            performance_cores: Some(4),
            efficiency_cores: Some(8),
            processors: 1,
            cache: CpuCache {
                l1d_kb: Some(48),
                l1i_kb: Some(32),
                l2_kb: Some(1280),
                l3_kb: Some(18432),
                },
        }
    }

    #[test]
    fn cpu_screen_lists_every_field() {
        plain();
        let screen = cpu_screen(&sample_cpu());
        for label in [
            "Manufacturer:",
            "Brand:",
            "Vendor:",
            "Family:",
            "Stepping:",
            "Cores (logical):",
            "Processors:",
            "L1d:",
            "L3:",
        ] {
            assert!(screen.contains(label), "missing {label}");
        }
        assert!(screen.contains("2.10 GHz"));
    }

    #[test]
    fn cpu_screen_dashes_missing_cache_levels() {
        plain();
        let mut cpu = sample_cpu();
        cpu.cache = CpuCache::default();
        cpu.family = None;
        let screen = cpu_screen(&cpu);
        assert!(screen.contains(&format!("{DASH} KB")));
        // Layout is static: the family row stays, dashed out.
        assert!(screen.contains("Family:"));
    }

    #[test]
    fn memory_screen_formats_gigabytes() {
        plain();
        let mem = MemoryRecord {
            total: 16 * 1024 * 1024 * 1024,
            used: 8 * 1024 * 1024 * 1024,
            free: 4 * 1024 * 1024 * 1024,
            available: 6 * 1024 * 1024 * 1024,
            swap_total: 2 * 1024 * 1024 * 1024,
            swap_used: 0,
            swap_free: 2 * 1024 * 1024 * 1024,
        };
        let screen = memory_screen(&mem);
        assert!(screen.contains("16.00 GB"));
        assert!(screen.contains("Swap"));
        assert!(screen.contains("0.00 GB"));
    }

    #[test]
    fn empty_controller_list_renders_single_notice() {
        plain();
        let screen = controllers_screen(&[]);
        let notices = screen
            .lines()
            .filter(|l| l.contains(NO_CONTROLLERS_NOTICE))
            .count();
        assert_eq!(notices, 1);
        assert!(!screen.contains("GPU #1"));
    }

    #[test]
    fn controllers_are_numbered_from_one() {
        plain();
        let controllers = vec![
            ControllerRecord {
                vendor: Some("Intel".to_string()),
                model: Some("Iris Xe".to_string()),
                vram_dynamic: true,
                ..ControllerRecord::default()
            },
            ControllerRecord {
                vendor: Some("NVIDIA".to_string()),
                model: Some("NVIDIA GeForce RTX 3070".to_string()),
                memory_total: Some(8 * 1024 * 1024 * 1024),
                memory_used: Some(1024 * 1024 * 1024),
                memory_free: Some(7 * 1024 * 1024 * 1024),
                ..ControllerRecord::default()
            },
        ];
        let screen = controllers_screen(&controllers);
        assert!(screen.contains("GPU #1"));
        assert!(screen.contains("GPU #2"));
        // Live counters render only when the whole triple is present.
        assert!(screen.contains("8192.00 MB"));
    }

    #[test]
    fn controller_without_counters_omits_the_triple() {
        plain();
        let controllers = vec![ControllerRecord {
            memory_total: Some(1024),
            ..ControllerRecord::default()
        }];
        let screen = controllers_screen(&controllers);
        assert!(!screen.contains("Used:"));
    }

    #[test]
    fn empty_display_list_renders_single_notice() {
        plain();
        let screen = displays_screen(&[]);
        assert!(screen.contains(NO_DISPLAYS_NOTICE));
        assert!(!screen.contains("Display #1"));
    }

    #[test]
    fn display_resolutions_need_both_axes() {
        plain();
        let displays = vec![DisplayRecord {
            display_id: Some("HDMI-A-1".to_string()),
            resolution_x: Some(2560),
            resolution_y: Some(1440),
            current_res_x: Some(2560),
            current_res_y: None,
            ..DisplayRecord::default()
        }];
        let screen = displays_screen(&displays);
        assert!(screen.contains("2560×1440"));
        let current_line = screen
            .lines()
            .find(|l| l.contains("Current:"))
            .unwrap();
        assert!(current_line.contains(DASH));
    }

    #[test]
    fn batteryless_screen_shows_only_power_source() {
        plain();
        let screen = battery_screen(&BatteryRecord::default());
        assert!(screen.contains("Power source:"));
        assert!(screen.contains("AC adapter"));
        for label in ["Charge:", "Cycles:", "Voltage:", "Capacity"] {
            assert!(!screen.contains(label), "unexpected {label}");
        }
    }

    #[test]
    fn full_battery_screen_renders_capacity_with_unit() {
        plain();
        let battery = BatteryRecord {
            has_battery: true,
            ac_connected: false,
            kind: Some("Li-ion".to_string()),
            percent: Some(87),
            time_remaining_min: Some(125),
            capacity_unit: Some("mWh".to_string()),
            current_capacity: Some(42_000),
            designed_capacity: Some(57_000),
            max_capacity: Some(50_000),
            cycle_count: Some(312),
            voltage_v: Some(12.3),
            ..BatteryRecord::default()
        };
        let screen = battery_screen(&battery);
        assert!(screen.contains("87%"));
        assert!(screen.contains("2h 5m"));
        assert!(screen.contains("42000 mWh"));
        assert!(screen.contains("12.30 V"));
        assert!(screen.contains("Battery"));
    }
}
