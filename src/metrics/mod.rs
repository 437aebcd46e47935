//! Host metrics access
//!
//! Provides:
//! - The [`MetricsProvider`] trait the reporter consumes
//! - Value types for disk, I/O and temperature readings
//! - [`SystemMetricsProvider`], backed by sysinfo, lm-sensors and GPU detection
//! - [`StaticMetrics`], a fixed-value provider for tests and dry runs

mod fixed;
mod system;
mod thermal;

pub use fixed::*;
pub use system::*;
pub use thermal::*;

use std::fmt;

use serde::Serialize;

use crate::error::MetricResult;

/// Message used whenever no GPU can be found
pub const NO_GPU_MESSAGE: &str = "No GPU detected or available";

// ─────────────────────────────────────────────────────────────────
// Metric Values
// ─────────────────────────────────────────────────────────────────

/// Space usage of one filesystem
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiskUsage {
    /// Capacity in bytes
    pub total: u64,

    /// Bytes in use
    pub used: u64,

    /// Bytes available
    pub free: u64,

    /// `used / total` as a percentage
    pub percent_used: f64,
}

impl DiskUsage {
    /// Build from capacity and available space
    pub fn new(total: u64, free: u64) -> Self {
        let free = free.min(total);
        let used = total - free;
        let percent_used = if total == 0 {
            0.0
        } else {
            used as f64 / total as f64 * 100.0
        };

        Self {
            total,
            used,
            free,
            percent_used,
        }
    }
}

/// Cumulative disk I/O since boot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiskIoCounters {
    pub read_bytes: u64,
    pub write_bytes: u64,
}

/// Cumulative network I/O since boot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NetworkIoCounters {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
}

/// Temperature in degrees Celsius
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Celsius(pub f64);

impl fmt::Display for Celsius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} °C", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────
// Provider Trait
// ─────────────────────────────────────────────────────────────────

/// Source of host metrics.
///
/// Every query is independent and may fail on its own; callers decide
/// how to present a failure.
pub trait MetricsProvider {
    /// Short name of the implementation, for logs
    fn backend_name(&self) -> &'static str;

    /// CPU model string
    fn cpu_brand(&self) -> MetricResult<String>;

    /// Installed physical memory in bytes
    fn total_ram(&self) -> MetricResult<u64>;

    /// Capacity of the monitored filesystem in bytes
    fn total_disk(&self) -> MetricResult<u64> {
        self.disk_usage().map(|usage| usage.total)
    }

    /// Name of the primary GPU
    fn gpu_name(&self) -> MetricResult<String>;

    /// Current CPU temperature
    fn cpu_temperature(&self) -> MetricResult<Celsius>;

    /// Space usage of the monitored filesystem
    fn disk_usage(&self) -> MetricResult<DiskUsage>;

    /// Cumulative disk read/write byte counters
    fn disk_io_counters(&self) -> MetricResult<DiskIoCounters>;

    /// Cumulative network sent/received byte counters
    fn network_io_counters(&self) -> MetricResult<NetworkIoCounters>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_usage_percent() {
        let usage = DiskUsage::new(1000, 250);
        assert_eq!(usage.used, 750);
        assert_eq!(usage.free, 250);
        assert!((usage.percent_used - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_disk_usage_empty_and_inconsistent() {
        assert_eq!(DiskUsage::new(0, 0).percent_used, 0.0);

        // Free space larger than capacity is clamped
        let usage = DiskUsage::new(100, 500);
        assert_eq!(usage.free, 100);
        assert_eq!(usage.used, 0);
    }

    #[test]
    fn test_celsius_display() {
        assert_eq!(Celsius(45.0).to_string(), "45.00 °C");
        assert_eq!(Celsius(61.237).to_string(), "61.24 °C");
    }

    #[test]
    fn test_total_disk_defaults_to_usage() {
        let provider = StaticMetrics::new();
        assert_eq!(provider.total_disk(), Ok(500_000_000_000));
    }
}
