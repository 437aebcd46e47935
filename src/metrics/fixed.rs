//! Fixed-value metrics provider

use std::cell::Cell;

use crate::error::MetricResult;

use super::{Celsius, DiskIoCounters, DiskUsage, MetricsProvider, NetworkIoCounters};

/// Provider that returns preset results.
///
/// Disk I/O counters are served from a sequence: each call returns the
/// next entry and the last entry repeats once the sequence runs out.
#[derive(Debug, Clone)]
pub struct StaticMetrics {
    cpu_brand: MetricResult<String>,
    total_ram: MetricResult<u64>,
    gpu_name: MetricResult<String>,
    cpu_temperature: MetricResult<Celsius>,
    disk_usage: MetricResult<DiskUsage>,
    disk_io: MetricResult<Vec<DiskIoCounters>>,
    network_io: MetricResult<NetworkIoCounters>,
    disk_io_reads: Cell<usize>,
}

impl StaticMetrics {
    /// A healthy 8 GB machine with a 500 GB disk, a GPU and a 45 °C CPU
    pub fn new() -> Self {
        Self {
            cpu_brand: Ok("Test CPU".to_string()),
            total_ram: Ok(8 * 1024 * 1024 * 1024),
            gpu_name: Ok("Test GPU".to_string()),
            cpu_temperature: Ok(Celsius(45.0)),
            disk_usage: Ok(DiskUsage::new(500_000_000_000, 200_000_000_000)),
            disk_io: Ok(vec![
                DiskIoCounters {
                    read_bytes: 10 * 1024 * 1024,
                    write_bytes: 4 * 1024 * 1024,
                },
                DiskIoCounters {
                    read_bytes: 11 * 1024 * 1024,
                    write_bytes: 4 * 1024 * 1024 + 512 * 1024,
                },
            ]),
            network_io: Ok(NetworkIoCounters {
                bytes_sent: 1024 * 1024,
                bytes_recv: 5 * 1024 * 1024 * 1024,
            }),
            disk_io_reads: Cell::new(0),
        }
    }

    pub fn with_cpu_brand(mut self, result: MetricResult<String>) -> Self {
        self.cpu_brand = result;
        self
    }

    pub fn with_total_ram(mut self, result: MetricResult<u64>) -> Self {
        self.total_ram = result;
        self
    }

    pub fn with_gpu_name(mut self, result: MetricResult<String>) -> Self {
        self.gpu_name = result;
        self
    }

    pub fn with_cpu_temperature(mut self, result: MetricResult<Celsius>) -> Self {
        self.cpu_temperature = result;
        self
    }

    pub fn with_disk_usage(mut self, result: MetricResult<DiskUsage>) -> Self {
        self.disk_usage = result;
        self
    }

    pub fn with_disk_io(mut self, result: MetricResult<Vec<DiskIoCounters>>) -> Self {
        self.disk_io = result;
        self
    }

    pub fn with_network_io(mut self, result: MetricResult<NetworkIoCounters>) -> Self {
        self.network_io = result;
        self
    }

    /// Number of disk I/O counter reads served so far
    pub fn disk_io_reads(&self) -> usize {
        self.disk_io_reads.get()
    }
}

impl Default for StaticMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsProvider for StaticMetrics {
    fn backend_name(&self) -> &'static str {
        "static"
    }

    fn cpu_brand(&self) -> MetricResult<String> {
        self.cpu_brand.clone()
    }

    fn total_ram(&self) -> MetricResult<u64> {
        self.total_ram.clone()
    }

    fn gpu_name(&self) -> MetricResult<String> {
        self.gpu_name.clone()
    }

    fn cpu_temperature(&self) -> MetricResult<Celsius> {
        self.cpu_temperature.clone()
    }

    fn disk_usage(&self) -> MetricResult<DiskUsage> {
        self.disk_usage.clone()
    }

    fn disk_io_counters(&self) -> MetricResult<DiskIoCounters> {
        let sequence = self.disk_io.as_ref().map_err(Clone::clone)?;
        let index = self.disk_io_reads.get();
        self.disk_io_reads.set(index + 1);

        Ok(sequence
            .get(index)
            .or_else(|| sequence.last())
            .copied()
            .unwrap_or_default())
    }

    fn network_io_counters(&self) -> MetricResult<NetworkIoCounters> {
        self.network_io.clone()
    }
}
