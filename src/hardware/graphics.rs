//! GPU and display detection module
//!
//! Detects graphics information using:
//! - NVIDIA: nvidia-smi if available (cross-platform, live memory counters)
//! - Linux: lspci for controller enumeration, /sys/class/drm for
//!   connectors, modes and EDID identity bytes
//! - Windows: wmic

use anyhow::Result;
use serde::{Deserialize, Serialize};
#[cfg(target_os = "linux")]
use std::fs;
use std::process::Command;

/// One GPU controller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControllerRecord {
    pub vendor: Option<String>,
    pub model: Option<String>,
    /// PCI bus address (e.g. "01:00.0")
    pub bus: Option<String>,
    pub driver_version: Option<String>,
    /// Dedicated VRAM in bytes
    pub vram_bytes: Option<u64>,
    /// Whether VRAM is allocated dynamically from system memory
    pub vram_dynamic: bool,
    /// Live memory counters in bytes (NVIDIA only)
    pub memory_total: Option<u64>,
    pub memory_used: Option<u64>,
    pub memory_free: Option<u64>,
}

/// One connected display
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayRecord {
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub serial: Option<String>,
    /// Connector identifier (e.g. "HDMI-A-1")
    pub display_id: Option<String>,
    pub main: bool,
    pub builtin: bool,
    /// Connection type (e.g. "HDMI", "DP", "eDP")
    pub connection: Option<String>,
    /// Native (preferred) resolution
    pub resolution_x: Option<u32>,
    pub resolution_y: Option<u32>,
    /// Current resolution
    pub current_res_x: Option<u32>,
    pub current_res_y: Option<u32>,
}

/// Graphics information: ordered controller and display lists. Either list
/// may be empty on headless or virtualized hosts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphicsRecord {
    pub controllers: Vec<ControllerRecord>,
    pub displays: Vec<DisplayRecord>,
}

impl GraphicsRecord {
    /// Detect GPU controllers and displays (platform-specific)
    pub fn detect() -> Result<Self> {
        Ok(GraphicsRecord {
            controllers: detect_controllers(),
            displays: detect_displays(),
        })
    }
}

/// Enumerate controllers, then enrich NVIDIA entries with nvidia-smi data.
fn detect_controllers() -> Vec<ControllerRecord> {
    #[cfg(target_os = "linux")]
    let mut controllers = detect_controllers_lspci().unwrap_or_default();

    #[cfg(target_os = "windows")]
    let mut controllers = detect_controllers_wmic().unwrap_or_default();

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    let mut controllers: Vec<ControllerRecord> = Vec::new();

    match detect_nvidia_smi() {
        Ok(nvidia) => {
            // Pair nvidia-smi records with the NVIDIA slots found by PCI
            // enumeration, in order; extras are appended as-is.
            let slots: Vec<usize> = controllers
                .iter()
                .enumerate()
                .filter(|(_, c)| c.vendor.as_deref() == Some("NVIDIA"))
                .map(|(i, _)| i)
                .collect();
            for (i, record) in nvidia.into_iter().enumerate() {
                match slots.get(i) {
                    Some(&idx) => merge_nvidia(&mut controllers[idx], record),
                    None => controllers.push(record),
                }
            }
        }
        Err(err) => tracing::debug!(error = %err, "nvidia-smi unavailable"),
    }

    controllers
}

/// Query all NVIDIA GPUs via nvidia-smi
fn detect_nvidia_smi() -> Result<Vec<ControllerRecord>> {
    let output = Command::new("nvidia-smi")
        .args([
            "--query-gpu=name,pci.bus_id,driver_version,memory.total,memory.used,memory.free",
            "--format=csv,noheader,nounits",
        ])
        .output()?;

    if !output.status.success() {
        anyhow::bail!("nvidia-smi failed");
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let controllers: Vec<ControllerRecord> =
        stdout.lines().filter_map(parse_nvidia_smi_line).collect();

    if controllers.is_empty() {
        anyhow::bail!("nvidia-smi reported no GPUs");
    }
    Ok(controllers)
}

/// Parse one nvidia-smi CSV line:
/// "NVIDIA GeForce RTX 3070, 00000000:01:00.0, 550.54.14, 8192, 1024, 7168"
fn parse_nvidia_smi_line(line: &str) -> Option<ControllerRecord> {
    let parts: Vec<&str> = line.split(", ").collect();
    if parts.len() < 6 {
        return None;
    }

    let raw_name = parts[0].trim();
    let model = if raw_name.starts_with("NVIDIA") {
        raw_name.to_string()
    } else {
        format!("NVIDIA {raw_name}")
    };
    let mib = |s: &str| s.trim().parse::<u64>().ok().map(|v| v * 1024 * 1024);

    Some(ControllerRecord {
        vendor: Some("NVIDIA".to_string()),
        model: Some(model),
        bus: Some(parts[1].trim().to_string()),
        driver_version: Some(parts[2].trim().to_string()),
        vram_bytes: mib(parts[3]),
        vram_dynamic: false,
        memory_total: mib(parts[3]),
        memory_used: mib(parts[4]),
        memory_free: mib(parts[5]),
    })
}

/// Fold nvidia-smi data into a controller found by PCI enumeration.
fn merge_nvidia(slot: &mut ControllerRecord, record: ControllerRecord) {
    slot.vendor = record.vendor;
    slot.model = record.model;
    slot.driver_version = record.driver_version;
    slot.vram_bytes = record.vram_bytes;
    slot.memory_total = record.memory_total;
    slot.memory_used = record.memory_used;
    slot.memory_free = record.memory_free;
}

/// Enumerate display controllers from lspci (Linux only)
#[cfg(target_os = "linux")]
fn detect_controllers_lspci() -> Result<Vec<ControllerRecord>> {
    let output = Command::new("lspci").output()?;
    if !output.status.success() {
        anyhow::bail!("lspci failed");
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let controllers: Vec<ControllerRecord> = stdout
        .lines()
        .filter(|l| {
            l.contains("VGA") || l.contains("3D controller") || l.contains("Display controller")
        })
        .map(parse_lspci_controller)
        .collect();

    if controllers.is_empty() {
        anyhow::bail!("no display controllers in lspci output");
    }
    Ok(controllers)
}

/// Parse a single lspci line, e.g.
/// "01:00.0 VGA compatible controller: NVIDIA Corporation GA104 [GeForce RTX 3070] (rev a1)"
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_lspci_controller(line: &str) -> ControllerRecord {
    let bus = line.split_whitespace().next().map(|s| s.to_string());

    let vendor = if line.contains("NVIDIA") {
        Some("NVIDIA".to_string())
    } else if line.contains("AMD") || line.contains("ATI") || line.contains("Radeon") {
        Some("AMD".to_string())
    } else if line.contains("Intel") {
        Some("Intel".to_string())
    } else {
        None
    };

    let model = line.find(": ").map(|idx| {
        let after_colon = &line[idx + 2..];
        match after_colon.rfind(" (rev") {
            Some(rev_idx) => after_colon[..rev_idx].to_string(),
            None => after_colon.to_string(),
        }
    });

    // Integrated parts borrow system memory instead of carrying VRAM.
    let vram_dynamic = vendor.as_deref() == Some("Intel");

    ControllerRecord {
        vendor,
        model,
        bus,
        vram_dynamic,
        ..ControllerRecord::default()
    }
}

/// Enumerate video controllers from wmic (Windows only)
#[cfg(target_os = "windows")]
fn detect_controllers_wmic() -> Result<Vec<ControllerRecord>> {
    let output = Command::new("wmic")
        .args([
            "path",
            "win32_VideoController",
            "get",
            "Name,AdapterRAM,DriverVersion",
            "/format:csv",
        ])
        .output()?;

    if !output.status.success() {
        anyhow::bail!("wmic failed");
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut controllers = Vec::new();

    // CSV columns: Node,AdapterRAM,DriverVersion,Name
    for line in stdout.lines().skip(1) {
        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() < 4 || parts[3].trim().is_empty() {
            continue;
        }
        let name = parts[3].trim().to_string();
        let vendor = ["NVIDIA", "AMD", "Intel"]
            .iter()
            .find(|v| name.contains(*v))
            .map(|v| v.to_string());
        controllers.push(ControllerRecord {
            vram_bytes: parts[1].trim().parse().ok(),
            driver_version: Some(parts[2].trim().to_string()).filter(|s| !s.is_empty()),
            vram_dynamic: vendor.as_deref() == Some("Intel"),
            vendor,
            model: Some(name),
            ..ControllerRecord::default()
        });
    }

    if controllers.is_empty() {
        anyhow::bail!("no video controllers in wmic output");
    }
    Ok(controllers)
}

fn detect_displays() -> Vec<DisplayRecord> {
    #[cfg(target_os = "linux")]
    {
        detect_displays_drm().unwrap_or_default()
    }
    #[cfg(target_os = "windows")]
    {
        detect_displays_wmic().unwrap_or_default()
    }
    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Vec::new()
    }
}

/// Enumerate monitors from wmic (Windows only)
#[cfg(target_os = "windows")]
fn detect_displays_wmic() -> Result<Vec<DisplayRecord>> {
    let output = Command::new("wmic")
        .args([
            "path",
            "Win32_DesktopMonitor",
            "get",
            "MonitorManufacturer,Name,PNPDeviceID,ScreenWidth,ScreenHeight",
            "/format:csv",
        ])
        .output()?;

    if !output.status.success() {
        anyhow::bail!("wmic failed");
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut displays = Vec::new();

    // CSV columns: Node,MonitorManufacturer,Name,PNPDeviceID,ScreenHeight,ScreenWidth
    for line in stdout.lines().skip(1) {
        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() < 6 || parts[2].trim().is_empty() {
            continue;
        }
        let height: Option<u32> = parts[4].trim().parse().ok();
        let width: Option<u32> = parts[5].trim().parse().ok();
        displays.push(DisplayRecord {
            vendor: Some(parts[1].trim().to_string()).filter(|s| !s.is_empty()),
            model: Some(parts[2].trim().to_string()),
            display_id: Some(parts[3].trim().to_string()).filter(|s| !s.is_empty()),
            main: displays.is_empty(),
            resolution_x: width,
            resolution_y: height,
            current_res_x: width,
            current_res_y: height,
            ..DisplayRecord::default()
        });
    }

    Ok(displays)
}

/// Walk /sys/class/drm connectors and keep the connected ones (Linux only)
#[cfg(target_os = "linux")]
fn detect_displays_drm() -> Result<Vec<DisplayRecord>> {
    let mut connectors: Vec<String> = Vec::new();
    for entry in fs::read_dir("/sys/class/drm")? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        // Connectors look like "card0-HDMI-A-1"; bare "card0" is the device.
        if name.starts_with("card") && name.contains('-') {
            connectors.push(name);
        }
    }
    connectors.sort();

    let mut displays = Vec::new();
    for name in connectors {
        let base = std::path::Path::new("/sys/class/drm").join(&name);
        let status = fs::read_to_string(base.join("status")).unwrap_or_default();
        if status.trim() != "connected" {
            continue;
        }

        let connector = name.splitn(2, '-').nth(1).unwrap_or(&name).to_string();
        let connection = connector_kind(&connector);
        let builtin = matches!(connection.as_deref(), Some("eDP" | "LVDS" | "DSI"));

        let native = fs::read_to_string(base.join("modes"))
            .ok()
            .and_then(|modes| modes.lines().next().and_then(parse_mode_line));

        let identity = fs::read(base.join("edid"))
            .ok()
            .and_then(|bytes| parse_edid_identity(&bytes));

        let mut record = DisplayRecord {
            display_id: Some(connector),
            // The first connected connector is what the session treats as
            // the primary output.
            main: displays.is_empty(),
            builtin,
            connection,
            ..DisplayRecord::default()
        };
        if let Some((x, y)) = native {
            record.resolution_x = Some(x);
            record.resolution_y = Some(y);
            // drm orders modes by preference; the preferred mode is what
            // the connector is driven at outside of explicit overrides.
            record.current_res_x = Some(x);
            record.current_res_y = Some(y);
        }
        if let Some(identity) = identity {
            record.vendor = identity.vendor;
            record.model = identity.model;
            record.serial = identity.serial;
        }
        displays.push(record);
    }

    Ok(displays)
}

/// "HDMI-A-1" -> "HDMI", "eDP-1" -> "eDP", "DP-2" -> "DP"
fn connector_kind(connector: &str) -> Option<String> {
    let kind: String = connector
        .split('-')
        .next()
        .unwrap_or("")
        .trim()
        .to_string();
    if kind.is_empty() {
        None
    } else {
        Some(kind)
    }
}

/// "1920x1080" -> (1920, 1080)
fn parse_mode_line(line: &str) -> Option<(u32, u32)> {
    let mut parts = line.trim().splitn(2, 'x');
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    Some((x, y))
}

struct EdidIdentity {
    vendor: Option<String>,
    model: Option<String>,
    serial: Option<String>,
}

/// Pull vendor/model/serial out of an EDID blob. The PNP vendor id lives in
/// bytes 8-9 (three 5-bit letters), the product code in bytes 10-11; the
/// descriptor blocks may carry a monitor name (0xFC) and serial text (0xFF).
fn parse_edid_identity(edid: &[u8]) -> Option<EdidIdentity> {
    const HEADER: [u8; 8] = [0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00];
    if edid.len() < 128 || edid[..8] != HEADER {
        return None;
    }

    let packed = u16::from_be_bytes([edid[8], edid[9]]);
    let letters = [
        ((packed >> 10) & 0x1F) as u8,
        ((packed >> 5) & 0x1F) as u8,
        (packed & 0x1F) as u8,
    ];
    let vendor: Option<String> = letters
        .iter()
        .map(|&l| (1u8..=26).contains(&l).then(|| (b'A' + l - 1) as char))
        .collect();

    let product = u16::from_le_bytes([edid[10], edid[11]]);
    let mut model = Some(format!("{product:04X}"));
    let serial_number = u32::from_le_bytes([edid[12], edid[13], edid[14], edid[15]]);
    let mut serial = (serial_number != 0).then(|| serial_number.to_string());

    // Four 18-byte descriptor blocks start at offset 54.
    for block in 0..4 {
        let start = 54 + block * 18;
        let descriptor = &edid[start..start + 18];
        if descriptor[0] != 0 || descriptor[1] != 0 {
            continue;
        }
        let text = || {
            let raw: String = descriptor[5..18]
                .iter()
                .take_while(|&&b| b != 0x0A)
                .map(|&b| b as char)
                .collect();
            let trimmed = raw.trim().to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        };
        match descriptor[3] {
            0xFC => {
                if let Some(name) = text() {
                    model = Some(name);
                }
            }
            0xFF => {
                if let Some(text) = text() {
                    serial = Some(text);
                }
            }
            _ => {}
        }
    }

    Some(EdidIdentity {
        vendor,
        model,
        serial,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nvidia_smi_line_converts_mib_to_bytes() {
        let record = parse_nvidia_smi_line(
            "NVIDIA GeForce RTX 3070, 00000000:01:00.0, 550.54.14, 8192, 1024, 7168",
        )
        .unwrap();
        assert_eq!(record.vendor.as_deref(), Some("NVIDIA"));
        assert_eq!(record.model.as_deref(), Some("NVIDIA GeForce RTX 3070"));
        assert_eq!(record.vram_bytes, Some(8192 * 1024 * 1024));
        assert_eq!(record.memory_used, Some(1024 * 1024 * 1024));
        assert!(!record.vram_dynamic);
    }

    #[test]
    fn nvidia_smi_prefixes_bare_names() {
        let record =
            parse_nvidia_smi_line("GeForce GTX 1660, 00000000:01:00.0, 535.0, 6144, 100, 6044")
                .unwrap();
        assert_eq!(record.model.as_deref(), Some("NVIDIA GeForce GTX 1660"));
    }

    #[test]
    fn nvidia_smi_rejects_short_lines() {
        assert!(parse_nvidia_smi_line("garbage").is_none());
    }

    #[test]
    fn lspci_line_extracts_vendor_model_and_bus() {
        let record = parse_lspci_controller(
            "01:00.0 VGA compatible controller: NVIDIA Corporation GA104 [GeForce RTX 3070] (rev a1)",
        );
        assert_eq!(record.bus.as_deref(), Some("01:00.0"));
        assert_eq!(record.vendor.as_deref(), Some("NVIDIA"));
        assert_eq!(
            record.model.as_deref(),
            Some("NVIDIA Corporation GA104 [GeForce RTX 3070]")
        );
    }

    #[test]
    fn lspci_intel_parts_report_dynamic_vram() {
        let record = parse_lspci_controller(
            "00:02.0 VGA compatible controller: Intel Corporation Alder Lake-P GT2 [Iris Xe Graphics] (rev 0c)",
        );
        assert_eq!(record.vendor.as_deref(), Some("Intel"));
        assert!(record.vram_dynamic);
    }

    #[test]
    fn connector_kinds() {
        assert_eq!(connector_kind("HDMI-A-1").as_deref(), Some("HDMI"));
        assert_eq!(connector_kind("eDP-1").as_deref(), Some("eDP"));
        assert_eq!(connector_kind("DP-2").as_deref(), Some("DP"));
    }

    #[test]
    fn mode_lines_parse() {
        assert_eq!(parse_mode_line("1920x1080"), Some((1920, 1080)));
        assert_eq!(parse_mode_line("3440x1440\n"), Some((3440, 1440)));
        assert_eq!(parse_mode_line("not-a-mode"), None);
    }

    #[test]
    fn edid_identity_decodes_vendor_and_name_descriptor() {
        let mut edid = vec![0u8; 128];
        edid[..8].copy_from_slice(&[0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00]);
        // "DEL" = Dell: D=4, E=5, L=12 -> 00100 00101 01100
        let packed: u16 = (4 << 10) | (5 << 5) | 12;
        edid[8..10].copy_from_slice(&packed.to_be_bytes());
        edid[10..12].copy_from_slice(&0xA0C5u16.to_le_bytes());
        edid[12..16].copy_from_slice(&1_129_743_445u32.to_le_bytes());
        // Monitor name descriptor in the first block.
        edid[54] = 0;
        edid[55] = 0;
        edid[57] = 0xFC;
        let name = b"DELL U2723QE\n";
        edid[59..59 + name.len()].copy_from_slice(name);

        let identity = parse_edid_identity(&edid).unwrap();
        assert_eq!(identity.vendor.as_deref(), Some("DEL"));
        assert_eq!(identity.model.as_deref(), Some("DELL U2723QE"));
        assert_eq!(identity.serial.as_deref(), Some("1129743445"));
    }

    #[test]
    fn edid_rejects_bad_headers() {
        assert!(parse_edid_identity(&[0u8; 128]).is_none());
        assert!(parse_edid_identity(&[]).is_none());
    }
}
