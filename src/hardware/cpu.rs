//! CPU detection module
//!
//! Detects CPU information using:
//! - Cross-platform: sysinfo crate
//! - Linux: /proc/cpuinfo, cpufreq and cache sysfs
//! - Windows: registry

use anyhow::Result;
use serde::{Deserialize, Serialize};
#[cfg(target_os = "linux")]
use std::fs;
#[cfg(target_os = "linux")]
use std::path::Path;
use sysinfo::System;

/// CPU cache sizes in KB. Any level the platform does not expose stays None.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CpuCache {
    pub l1d_kb: Option<u64>,
    pub l1i_kb: Option<u64>,
    pub l2_kb: Option<u64>,
    pub l3_kb: Option<u64>,
}

/// CPU information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuRecord {
    /// Manufacturer (e.g. "Intel", "AMD")
    pub manufacturer: String,
    /// Full brand string (e.g. "AMD Ryzen 7 5800X 8-Core Processor")
    pub brand: String,
    /// Vendor id string (e.g. "GenuineIntel")
    pub vendor: String,
    /// CPU family identifier
    pub family: Option<String>,
    /// CPU model identifier
    pub model: Option<String>,
    /// Stepping identifier
    pub stepping: Option<String>,
    /// Base clock in GHz
    pub speed_ghz: f64,
    /// Logical core count
    pub cores: usize,
    /// Physical core count
    pub physical_cores: usize,
    /// Performance core count (hybrid CPUs only)
    pub performance_cores: Option<usize>,
    /// Efficiency core count (hybrid CPUs only)
    pub efficiency_cores: Option<usize>,
    /// Physical processor package count
    pub processors: usize,
    /// Cache sizes
    pub cache: CpuCache,
}

impl CpuRecord {
    /// Detect CPU information (platform-specific)
    pub fn detect() -> Result<Self> {
        let mut sys = System::new();
        sys.refresh_cpu_all();

        let cpus = sys.cpus();
        if cpus.is_empty() {
            anyhow::bail!("No CPU detected");
        }

        let first_cpu = &cpus[0];
        let brand = first_cpu.brand().trim().to_string();
        let vendor = first_cpu.vendor_id().to_string();
        let speed_ghz = first_cpu.frequency() as f64 / 1000.0;

        let cores = cpus.len();
        let physical_cores = sys.physical_core_count().unwrap_or(cores);

        #[cfg(target_os = "linux")]
        let (family, model, stepping, processors) = Self::read_cpuinfo_identifiers();

        #[cfg(target_os = "windows")]
        let (family, model, stepping, processors) = Self::read_windows_identifiers();

        #[cfg(not(any(target_os = "linux", target_os = "windows")))]
        let (family, model, stepping, processors) = (None, None, None, 1);

        #[cfg(target_os = "linux")]
        let cache = Self::read_sysfs_cache();

        #[cfg(not(target_os = "linux"))]
        let cache = CpuCache::default();

        #[cfg(target_os = "linux")]
        let (performance_cores, efficiency_cores) = Self::read_hybrid_core_counts();

        #[cfg(not(target_os = "linux"))]
        let (performance_cores, efficiency_cores) = (None, None);

        Ok(CpuRecord {
            manufacturer: manufacturer_from_vendor(&vendor, &brand),
            brand,
            vendor,
            family,
            model,
            stepping,
            speed_ghz,
            cores,
            physical_cores,
            performance_cores,
            efficiency_cores,
            processors,
            cache,
        })
    }

    /// Family/model/stepping and package count from /proc/cpuinfo
    #[cfg(target_os = "linux")]
    fn read_cpuinfo_identifiers() -> (Option<String>, Option<String>, Option<String>, usize) {
        match fs::read_to_string("/proc/cpuinfo") {
            Ok(content) => parse_cpuinfo_identifiers(&content),
            Err(err) => {
                tracing::debug!(error = %err, "could not read /proc/cpuinfo");
                (None, None, None, 1)
            }
        }
    }

    /// Cache sizes from /sys/devices/system/cpu/cpu0/cache
    #[cfg(target_os = "linux")]
    fn read_sysfs_cache() -> CpuCache {
        let mut cache = CpuCache::default();
        let base = Path::new("/sys/devices/system/cpu/cpu0/cache");
        let entries = match fs::read_dir(base) {
            Ok(entries) => entries,
            Err(_) => return cache,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let level = fs::read_to_string(path.join("level"))
                .ok()
                .and_then(|s| s.trim().parse::<u32>().ok());
            let cache_type = fs::read_to_string(path.join("type"))
                .map(|s| s.trim().to_string())
                .unwrap_or_default();
            let size_kb = fs::read_to_string(path.join("size"))
                .ok()
                .and_then(|s| parse_cache_size_kb(s.trim()));

            match (level, cache_type.as_str()) {
                (Some(1), "Data") => cache.l1d_kb = size_kb,
                (Some(1), "Instruction") => cache.l1i_kb = size_kb,
                (Some(2), _) => cache.l2_kb = size_kb,
                (Some(3), _) => cache.l3_kb = size_kb,
                _ => {}
            }
        }
        cache
    }

    /// Hybrid (P/E) core counts inferred from distinct cpufreq max
    /// frequencies. Uniform parts report None for both.
    #[cfg(target_os = "linux")]
    fn read_hybrid_core_counts() -> (Option<usize>, Option<usize>) {
        let cpu_base = Path::new("/sys/devices/system/cpu");
        let mut max_freqs = Vec::new();

        if let Ok(entries) = fs::read_dir(cpu_base) {
            for entry in entries.flatten() {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if !name.starts_with("cpu") || !name[3..].chars().all(|c| c.is_ascii_digit()) {
                    continue;
                }
                let freq_path = entry.path().join("cpufreq/cpuinfo_max_freq");
                if let Ok(raw) = fs::read_to_string(&freq_path) {
                    if let Ok(khz) = raw.trim().parse::<u64>() {
                        max_freqs.push(khz);
                    }
                }
            }
        }

        split_hybrid_cores(&max_freqs)
    }

    /// Identifiers from the Windows registry "Identifier" value, e.g.
    /// "Intel64 Family 6 Model 154 Stepping 3"
    #[cfg(target_os = "windows")]
    fn read_windows_identifiers() -> (Option<String>, Option<String>, Option<String>, usize) {
        use std::process::Command;

        let output = Command::new("reg")
            .args([
                "query",
                "HKEY_LOCAL_MACHINE\\HARDWARE\\DESCRIPTION\\System\\CentralProcessor\\0",
                "/v",
                "Identifier",
            ])
            .output();

        if let Ok(output) = output {
            if output.status.success() {
                let stdout = String::from_utf8_lossy(&output.stdout);
                for line in stdout.lines() {
                    if line.contains("Identifier") {
                        let (family, model, stepping) = parse_identifier_line(line);
                        return (family, model, stepping, 1);
                    }
                }
            }
        }
        (None, None, None, 1)
    }
}

/// Map a vendor id string to a manufacturer name, falling back to the
/// first word of the brand string.
fn manufacturer_from_vendor(vendor: &str, brand: &str) -> String {
    match vendor {
        "GenuineIntel" => "Intel".to_string(),
        "AuthenticAMD" => "AMD".to_string(),
        "Apple" => "Apple".to_string(),
        _ => brand
            .split_whitespace()
            .next()
            .unwrap_or("Unknown")
            .to_string(),
    }
}

/// Parse family/model/stepping and distinct package count out of
/// /proc/cpuinfo content.
fn parse_cpuinfo_identifiers(content: &str) -> (Option<String>, Option<String>, Option<String>, usize) {
    let mut family = None;
    let mut model = None;
    let mut stepping = None;
    let mut packages: Vec<String> = Vec::new();

    for line in content.lines() {
        let mut parts = line.splitn(2, ':');
        let key = parts.next().unwrap_or("").trim();
        let val = parts.next().unwrap_or("").trim();
        if val.is_empty() {
            continue;
        }
        match key {
            "cpu family" if family.is_none() => family = Some(val.to_string()),
            "model" if model.is_none() => model = Some(val.to_string()),
            "stepping" if stepping.is_none() => stepping = Some(val.to_string()),
            "physical id" => {
                if !packages.iter().any(|p| p == val) {
                    packages.push(val.to_string());
                }
            }
            _ => {}
        }
    }

    let processors = if packages.is_empty() { 1 } else { packages.len() };
    (family, model, stepping, processors)
}

/// Parse a sysfs cache size string ("32K", "1024K", "16M") into KB.
fn parse_cache_size_kb(raw: &str) -> Option<u64> {
    if let Some(kb) = raw.strip_suffix('K') {
        return kb.trim().parse().ok();
    }
    if let Some(mb) = raw.strip_suffix('M') {
        return mb.trim().parse::<u64>().ok().map(|v| v * 1024);
    }
    raw.parse().ok()
}

/// Split per-core max frequencies into (performance, efficiency) counts.
/// Exactly two distinct frequency groups means a hybrid part.
fn split_hybrid_cores(max_freqs_khz: &[u64]) -> (Option<usize>, Option<usize>) {
    let mut distinct: Vec<u64> = max_freqs_khz.to_vec();
    distinct.sort_unstable();
    distinct.dedup();

    if distinct.len() != 2 {
        return (None, None);
    }

    let fast = distinct[1];
    let performance = max_freqs_khz.iter().filter(|&&f| f == fast).count();
    let efficiency = max_freqs_khz.len() - performance;
    (Some(performance), Some(efficiency))
}

/// Parse "Intel64 Family 6 Model 154 Stepping 3" style identifier lines.
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
fn parse_identifier_line(line: &str) -> (Option<String>, Option<String>, Option<String>) {
    let mut family = None;
    let mut model = None;
    let mut stepping = None;

    let words: Vec<&str> = line.split_whitespace().collect();
    for pair in words.windows(2) {
        match pair[0] {
            "Family" => family = Some(pair[1].to_string()),
            "Model" => model = Some(pair[1].to_string()),
            "Stepping" => stepping = Some(pair[1].to_string()),
            _ => {}
        }
    }
    (family, model, stepping)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpuinfo_identifiers_take_first_occurrence() {
        let content = "\
processor\t: 0\n\
vendor_id\t: GenuineIntel\n\
cpu family\t: 6\n\
model\t\t: 154\n\
model name\t: 12th Gen Intel(R) Core(TM) i7-1260P\n\
stepping\t: 3\n\
physical id\t: 0\n\
processor\t: 1\n\
cpu family\t: 6\n\
model\t\t: 154\n\
stepping\t: 3\n\
physical id\t: 0\n";
        let (family, model, stepping, processors) = parse_cpuinfo_identifiers(content);
        assert_eq!(family.as_deref(), Some("6"));
        assert_eq!(model.as_deref(), Some("154"));
        assert_eq!(stepping.as_deref(), Some("3"));
        assert_eq!(processors, 1);
    }

    #[test]
    fn cpuinfo_counts_distinct_packages() {
        let content = "physical id\t: 0\nphysical id\t: 1\nphysical id\t: 0\n";
        let (_, _, _, processors) = parse_cpuinfo_identifiers(content);
        assert_eq!(processors, 2);
    }

    #[test]
    fn cache_sizes_parse_k_and_m_suffixes() {
        assert_eq!(parse_cache_size_kb("32K"), Some(32));
        assert_eq!(parse_cache_size_kb("36864K"), Some(36864));
        assert_eq!(parse_cache_size_kb("16M"), Some(16384));
        assert_eq!(parse_cache_size_kb("bogus"), None);
    }

    #[test]
    fn hybrid_split_needs_exactly_two_groups() {
        // 4 P-cores at 4.7 GHz, 8 E-cores at 3.4 GHz
        let freqs = [
            4_700_000, 4_700_000, 4_700_000, 4_700_000, 3_400_000, 3_400_000, 3_400_000,
            3_400_000, 3_400_000, 3_400_000, 3_400_000, 3_400_000,
        ];
        assert_eq!(split_hybrid_cores(&freqs), (Some(4), Some(8)));

        let uniform = [3_600_000; 8];
        assert_eq!(split_hybrid_cores(&uniform), (None, None));
        assert_eq!(split_hybrid_cores(&[]), (None, None));
    }

    #[test]
    fn identifier_line_parses_registry_format() {
        let (family, model, stepping) =
            parse_identifier_line("    Identifier    REG_SZ    Intel64 Family 6 Model 154 Stepping 3");
        assert_eq!(family.as_deref(), Some("6"));
        assert_eq!(model.as_deref(), Some("154"));
        assert_eq!(stepping.as_deref(), Some("3"));
    }

    #[test]
    fn manufacturer_falls_back_to_brand_prefix() {
        assert_eq!(manufacturer_from_vendor("GenuineIntel", ""), "Intel");
        assert_eq!(manufacturer_from_vendor("AuthenticAMD", ""), "AMD");
        assert_eq!(
            manufacturer_from_vendor("unknown", "Qualcomm Snapdragon X"),
            "Qualcomm"
        );
    }
}
