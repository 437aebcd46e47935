//! GPU discovery
//!
//! Provides:
//! - Vendor identification from PCI vendor IDs
//! - A device description shared by every detection backend
//! - Primary GPU selection for the report

mod detect;

pub use detect::*;

use serde::Serialize;

// ─────────────────────────────────────────────────────────────────
// GPU Vendor Identification
// ─────────────────────────────────────────────────────────────────

/// Known GPU vendors identified by PCI vendor ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GpuVendor {
    /// AMD (vendor ID: 0x1002)
    Amd,
    /// NVIDIA (vendor ID: 0x10DE)
    Nvidia,
    /// Intel (vendor ID: 0x8086)
    Intel,
    /// Apple (vendor ID: 0x106B)
    Apple,
    /// Unknown vendor with raw ID
    Unknown(u32),
}

impl GpuVendor {
    pub const AMD_VENDOR_ID: u32 = 0x1002;
    pub const NVIDIA_VENDOR_ID: u32 = 0x10DE;
    pub const INTEL_VENDOR_ID: u32 = 0x8086;
    pub const APPLE_VENDOR_ID: u32 = 0x106B;

    /// Map a PCI vendor ID
    pub fn from_vendor_id(id: u32) -> Self {
        match id {
            Self::AMD_VENDOR_ID => GpuVendor::Amd,
            Self::NVIDIA_VENDOR_ID => GpuVendor::Nvidia,
            Self::INTEL_VENDOR_ID => GpuVendor::Intel,
            Self::APPLE_VENDOR_ID => GpuVendor::Apple,
            other => GpuVendor::Unknown(other),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GpuVendor::Amd => "AMD",
            GpuVendor::Nvidia => "NVIDIA",
            GpuVendor::Intel => "Intel",
            GpuVendor::Apple => "Apple",
            GpuVendor::Unknown(_) => "Unknown",
        }
    }
}

impl std::fmt::Display for GpuVendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ─────────────────────────────────────────────────────────────────
// GPU Information
// ─────────────────────────────────────────────────────────────────

/// A GPU found by one of the detection backends
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpuInfo {
    /// Index in detection order
    pub id: u32,

    /// Device name as reported by the driver
    pub name: String,

    pub vendor: GpuVendor,

    /// Total video memory in MB (0 when unknown)
    pub total_memory_mb: u64,

    /// Driver version string (empty when unknown)
    pub driver_version: String,

    /// Whether this is a discrete GPU (vs integrated)
    pub is_discrete: bool,
}

impl GpuInfo {
    /// One-line description for logs
    pub fn summary(&self) -> String {
        let mut summary = format!("{} ({}MB)", self.name, self.total_memory_mb);
        if !self.driver_version.is_empty() {
            summary.push_str(&format!(", driver {}", self.driver_version));
        }
        summary
    }
}

// ─────────────────────────────────────────────────────────────────
// GPU Selection
// ─────────────────────────────────────────────────────────────────

/// Pick the GPU to report: the first discrete device, otherwise the first one found
pub fn select_primary_gpu(gpus: &[GpuInfo]) -> Option<&GpuInfo> {
    gpus.iter().find(|g| g.is_discrete).or_else(|| gpus.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gpu(id: u32, name: &str, vendor: GpuVendor, is_discrete: bool) -> GpuInfo {
        GpuInfo {
            id,
            name: name.to_string(),
            vendor,
            total_memory_mb: 0,
            driver_version: String::new(),
            is_discrete,
        }
    }

    #[test]
    fn test_vendor_from_id() {
        assert_eq!(GpuVendor::from_vendor_id(0x1002), GpuVendor::Amd);
        assert_eq!(GpuVendor::from_vendor_id(0x10DE), GpuVendor::Nvidia);
        assert_eq!(GpuVendor::from_vendor_id(0x8086), GpuVendor::Intel);
        assert_eq!(GpuVendor::from_vendor_id(0x106B), GpuVendor::Apple);
        assert_eq!(GpuVendor::from_vendor_id(0xFFFF), GpuVendor::Unknown(0xFFFF));
    }

    #[test]
    fn test_select_prefers_discrete() {
        let gpus = vec![
            gpu(0, "Intel UHD 630", GpuVendor::Intel, false),
            gpu(1, "NVIDIA GeForce RTX 3060", GpuVendor::Nvidia, true),
            gpu(2, "AMD Radeon RX 6600", GpuVendor::Amd, true),
        ];

        assert_eq!(select_primary_gpu(&gpus).unwrap().name, "NVIDIA GeForce RTX 3060");
    }

    #[test]
    fn test_select_falls_back_to_first() {
        let gpus = vec![
            gpu(0, "Intel UHD 630", GpuVendor::Intel, false),
            gpu(1, "llvmpipe", GpuVendor::Unknown(0x10005), false),
        ];

        assert_eq!(select_primary_gpu(&gpus).unwrap().id, 0);
        assert!(select_primary_gpu(&[]).is_none());
    }

    #[test]
    fn test_gpu_summary() {
        let mut info = gpu(0, "Radeon RX 7900 XTX", GpuVendor::Amd, true);
        info.total_memory_mb = 24576;
        assert_eq!(info.summary(), "Radeon RX 7900 XTX (24576MB)");

        info.driver_version = "23.10".to_string();
        assert!(info.summary().ends_with("driver 23.10"));
    }
}
