//! Hardware telemetry modules
//!
//! Queries CPU, memory, GPU, display, and battery facts using sysinfo
//! plus platform-specific sources (procfs/sysfs, nvidia-smi, wmic).

pub mod battery;
pub mod cpu;
pub mod graphics;
pub mod memory;
mod snapshot;

pub use snapshot::SystemSnapshot;
