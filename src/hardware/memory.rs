//! Memory detection module
//!
//! All counters come from sysinfo; no platform-specific paths needed.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sysinfo::System;

/// Memory and swap counters, all in bytes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub available: u64,
    pub swap_total: u64,
    pub swap_used: u64,
    pub swap_free: u64,
}

impl MemoryRecord {
    /// Detect memory information
    pub fn detect() -> Result<Self> {
        let mut sys = System::new();
        sys.refresh_memory();

        Ok(MemoryRecord {
            total: sys.total_memory(),
            used: sys.used_memory(),
            free: sys.free_memory(),
            available: sys.available_memory(),
            swap_total: sys.total_swap(),
            swap_used: sys.used_swap(),
            swap_free: sys.free_swap(),
        })
    }
}
