//! System snapshot aggregator

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::battery::BatteryRecord;
use super::cpu::CpuRecord;
use super::graphics::GraphicsRecord;
use super::memory::MemoryRecord;

/// One-time, immutable capture of all queried hardware facts. Fetched once
/// at startup and never refreshed within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub cpu: CpuRecord,
    pub memory: MemoryRecord,
    pub graphics: GraphicsRecord,
    pub battery: BatteryRecord,
}

impl SystemSnapshot {
    /// Capture all telemetry categories. The sub-queries are independent
    /// reads and run sequentially; any failure aborts the capture.
    pub fn capture() -> Result<Self> {
        let cpu = CpuRecord::detect().context("CPU detection failed")?;
        let memory = MemoryRecord::detect().context("memory detection failed")?;
        let graphics = GraphicsRecord::detect().context("graphics detection failed")?;
        let battery = BatteryRecord::detect().context("battery detection failed")?;

        Ok(SystemSnapshot {
            cpu,
            memory,
            graphics,
            battery,
        })
    }
}
