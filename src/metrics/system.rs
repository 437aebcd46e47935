//! Live host metrics via sysinfo

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use sysinfo::{Disks, Networks, System};
use tracing::info;

use crate::error::{MetricError, MetricResult};
use crate::gpu::{select_primary_gpu, GpuSource};

use super::{Celsius, DiskIoCounters, DiskUsage, MetricsProvider, NetworkIoCounters, ThermalSource, NO_GPU_MESSAGE};

const PLATFORM_UNSUPPORTED: &str = "System metrics are not supported on this OS";

/// Metrics provider for the machine the process runs on.
///
/// Sources for temperature and GPU data are detected once in
/// [`SystemMetricsProvider::detect`]; every query re-reads the host.
#[derive(Debug, Clone)]
pub struct SystemMetricsProvider {
    mount_point: PathBuf,
    thermal: ThermalSource,
    gpu: GpuSource,
    supported: bool,
}

impl SystemMetricsProvider {
    /// Detect sources and build a provider for the filesystem at `mount_point`
    pub fn detect(mount_point: impl Into<PathBuf>) -> Self {
        let provider = Self::with_sources(mount_point, ThermalSource::detect(), GpuSource::detect());

        info!(
            mount_point = %provider.mount_point.display(),
            thermal = provider.thermal.name(),
            gpu = provider.gpu.name(),
            supported = provider.supported,
            "Metric sources detected"
        );

        provider
    }

    /// Build a provider with explicit sources
    pub fn with_sources(mount_point: impl Into<PathBuf>, thermal: ThermalSource, gpu: GpuSource) -> Self {
        Self {
            mount_point: mount_point.into(),
            thermal,
            gpu,
            supported: sysinfo::IS_SUPPORTED_SYSTEM,
        }
    }

    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }

    fn ensure_supported(&self) -> MetricResult<()> {
        if self.supported {
            Ok(())
        } else {
            Err(MetricError::unsupported(PLATFORM_UNSUPPORTED))
        }
    }
}

impl MetricsProvider for SystemMetricsProvider {
    fn backend_name(&self) -> &'static str {
        "sysinfo"
    }

    fn cpu_brand(&self) -> MetricResult<String> {
        self.ensure_supported()?;

        let mut sys = System::new();
        sys.refresh_cpu_all();

        sys.cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .filter(|brand| !brand.is_empty())
            .ok_or_else(|| MetricError::not_found("CPU model not reported by the OS"))
    }

    fn total_ram(&self) -> MetricResult<u64> {
        self.ensure_supported()?;

        let mut sys = System::new();
        sys.refresh_memory();

        match sys.total_memory() {
            0 => Err(MetricError::provider("OS reported zero installed memory")),
            total => Ok(total),
        }
    }

    fn gpu_name(&self) -> MetricResult<String> {
        let gpus = self.gpu.enumerate()?;
        select_primary_gpu(&gpus)
            .map(|gpu| gpu.name.clone())
            .ok_or_else(|| MetricError::not_found(NO_GPU_MESSAGE))
    }

    fn cpu_temperature(&self) -> MetricResult<Celsius> {
        self.thermal.read()
    }

    fn disk_usage(&self) -> MetricResult<DiskUsage> {
        self.ensure_supported()?;

        let disks = Disks::new_with_refreshed_list();
        let disk = disks
            .iter()
            .find(|disk| disk.mount_point() == self.mount_point.as_path())
            .ok_or_else(|| {
                MetricError::provider(format!(
                    "no filesystem mounted at {}",
                    self.mount_point.display()
                ))
            })?;

        Ok(DiskUsage::new(disk.total_space(), disk.available_space()))
    }

    fn disk_io_counters(&self) -> MetricResult<DiskIoCounters> {
        self.ensure_supported()?;

        let disks = Disks::new_with_refreshed_list();
        if disks.is_empty() {
            return Err(MetricError::not_found("No disks reported by the OS"));
        }

        // A device mounted in several places is counted once
        let mut seen = HashSet::new();
        let mut counters = DiskIoCounters::default();
        for disk in disks.iter().filter(|disk| seen.insert(disk.name().to_os_string())) {
            let usage = disk.usage();
            counters.read_bytes = counters.read_bytes.saturating_add(usage.total_read_bytes);
            counters.write_bytes = counters.write_bytes.saturating_add(usage.total_written_bytes);
        }

        Ok(counters)
    }

    fn network_io_counters(&self) -> MetricResult<NetworkIoCounters> {
        self.ensure_supported()?;

        let networks = Networks::new_with_refreshed_list();
        if networks.is_empty() {
            return Err(MetricError::not_found("No network interfaces reported by the OS"));
        }

        let mut counters = NetworkIoCounters::default();
        for (_interface, data) in &networks {
            counters.bytes_sent = counters.bytes_sent.saturating_add(data.total_transmitted());
            counters.bytes_recv = counters.bytes_recv.saturating_add(data.total_received());
        }

        Ok(counters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(mount_point: &str) -> SystemMetricsProvider {
        SystemMetricsProvider::with_sources(mount_point, ThermalSource::Unsupported, GpuSource::None)
    }

    #[test]
    fn test_unknown_mount_point_is_provider_error() {
        let result = provider("/definitely/not/a/mount/point").disk_usage();
        assert!(matches!(result, Err(MetricError::Provider(_)) | Err(MetricError::Unsupported(_))));
    }

    #[test]
    fn test_no_gpu_source_reports_not_found() {
        assert_eq!(provider("/").gpu_name(), Err(MetricError::not_found(NO_GPU_MESSAGE)));
    }

    #[test]
    fn test_unsupported_thermal_source() {
        let result = provider("/").cpu_temperature();
        assert!(matches!(result, Err(MetricError::Unsupported(_))));
    }

    #[test]
    fn test_missing_sensor_reports_not_found() {
        let provider = SystemMetricsProvider::with_sources("/", ThermalSource::Unavailable, GpuSource::None);
        assert_eq!(
            provider.cpu_temperature(),
            Err(MetricError::not_found(crate::metrics::TEMPERATURE_NOT_FOUND))
        );
    }

    #[test]
    fn test_unsupported_platform_short_circuits() {
        let mut provider = provider("/");
        provider.supported = false;

        assert_eq!(provider.cpu_brand(), Err(MetricError::unsupported(PLATFORM_UNSUPPORTED)));
        assert_eq!(provider.total_disk(), Err(MetricError::unsupported(PLATFORM_UNSUPPORTED)));
        assert!(matches!(provider.network_io_counters(), Err(MetricError::Unsupported(_))));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_live_queries_do_not_panic() {
        let provider = provider("/");
        let _ = provider.cpu_brand();
        let _ = provider.total_ram();
        let _ = provider.disk_io_counters();
        let _ = provider.network_io_counters();
    }
}
