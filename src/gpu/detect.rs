//! GPU detection backends
//!
//! The backend is chosen once at start-up: Vulkan when compiled with the
//! `gpu` feature and a loader is present, otherwise `nvidia-smi` when it is
//! on the PATH, otherwise nothing.

use std::process::Command;

use tracing::debug;

use crate::error::{MetricError, MetricResult};

use super::{GpuInfo, GpuVendor};

/// Fields requested from nvidia-smi, in output order
const NVIDIA_SMI_QUERY: &str = "--query-gpu=index,name,memory.total,driver_version";

/// Where GPU information comes from on this host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuSource {
    /// Vulkan physical device enumeration
    #[cfg(feature = "gpu")]
    Vulkan,
    /// `nvidia-smi` CSV query
    NvidiaSmi,
    /// No backend available
    None,
}

impl GpuSource {
    /// Find a usable backend on this host
    pub fn detect() -> Self {
        if let Some(source) = vulkan_source() {
            return source;
        }

        if nvidia_smi_available() {
            return GpuSource::NvidiaSmi;
        }

        GpuSource::None
    }

    pub fn name(&self) -> &'static str {
        match self {
            #[cfg(feature = "gpu")]
            GpuSource::Vulkan => "vulkan",
            GpuSource::NvidiaSmi => "nvidia-smi",
            GpuSource::None => "none",
        }
    }

    /// List GPUs in detection order. An empty list means none were found.
    pub fn enumerate(&self) -> MetricResult<Vec<GpuInfo>> {
        let gpus = match self {
            #[cfg(feature = "gpu")]
            GpuSource::Vulkan => detect_vulkan_gpus()?,
            GpuSource::NvidiaSmi => query_nvidia_smi()?,
            GpuSource::None => Vec::new(),
        };

        for gpu in &gpus {
            debug!(source = self.name(), "GPU {}: {}", gpu.id, gpu.summary());
        }
        Ok(gpus)
    }
}

// ─────────────────────────────────────────────────────────────────
// nvidia-smi
// ─────────────────────────────────────────────────────────────────

fn nvidia_smi_available() -> bool {
    Command::new("nvidia-smi")
        .arg("-L")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

fn query_nvidia_smi() -> MetricResult<Vec<GpuInfo>> {
    let output = Command::new("nvidia-smi")
        .args([NVIDIA_SMI_QUERY, "--format=csv,noheader,nounits"])
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MetricError::provider(format!(
            "nvidia-smi exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(parse_nvidia_smi(&String::from_utf8_lossy(&output.stdout)))
}

/// Parse `nvidia-smi --format=csv,noheader,nounits` output.
///
/// Lines without a name are skipped; unparsable numbers become 0.
pub fn parse_nvidia_smi(output: &str) -> Vec<GpuInfo> {
    output
        .lines()
        .enumerate()
        .filter_map(|(line_no, line)| {
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            let name = fields.get(1).filter(|n| !n.is_empty())?;

            Some(GpuInfo {
                id: fields
                    .first()
                    .and_then(|i| i.parse().ok())
                    .unwrap_or(line_no as u32),
                name: name.to_string(),
                vendor: GpuVendor::Nvidia,
                total_memory_mb: fields.get(2).and_then(|m| m.parse().ok()).unwrap_or(0),
                driver_version: fields.get(3).map(|d| d.to_string()).unwrap_or_default(),
                is_discrete: true,
            })
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────
// Vulkan (when feature enabled)
// ─────────────────────────────────────────────────────────────────

/// Check if a Vulkan loader can be found
pub fn is_vulkan_available() -> bool {
    #[cfg(feature = "gpu")]
    {
        unsafe { ash::Entry::load().is_ok() }
    }

    #[cfg(not(feature = "gpu"))]
    {
        false
    }
}

fn vulkan_source() -> Option<GpuSource> {
    #[cfg(feature = "gpu")]
    {
        is_vulkan_available().then_some(GpuSource::Vulkan)
    }

    #[cfg(not(feature = "gpu"))]
    {
        None
    }
}

#[cfg(feature = "gpu")]
fn detect_vulkan_gpus() -> MetricResult<Vec<GpuInfo>> {
    use ash::vk;

    let entry = unsafe {
        ash::Entry::load()
            .map_err(|e| MetricError::unsupported(format!("Failed to load Vulkan: {}", e)))?
    };

    let app_info = vk::ApplicationInfo::builder()
        .application_name(c"HealthMetrix")
        .application_version(vk::make_api_version(0, 0, 1, 0))
        .api_version(vk::API_VERSION_1_0);

    let create_info = vk::InstanceCreateInfo::builder().application_info(&app_info);

    let instance = unsafe {
        entry
            .create_instance(&create_info, None)
            .map_err(|e| MetricError::provider(format!("Failed to create Vulkan instance: {:?}", e)))?
    };

    let devices = unsafe { instance.enumerate_physical_devices() };

    let gpus = devices.map(|devices| {
        devices
            .iter()
            .filter_map(|device| {
                let properties = unsafe { instance.get_physical_device_properties(*device) };

                // Software rasterizers are not GPUs
                if properties.device_type == vk::PhysicalDeviceType::CPU {
                    return None;
                }

                let memory_props = unsafe { instance.get_physical_device_memory_properties(*device) };
                let name = unsafe {
                    std::ffi::CStr::from_ptr(properties.device_name.as_ptr())
                        .to_string_lossy()
                        .to_string()
                };
                let vendor = GpuVendor::from_vendor_id(properties.vendor_id);

                Some((name, vendor, properties, device_memory_mb(&memory_props)))
            })
            .enumerate()
            .map(|(idx, (name, vendor, properties, total_memory_mb))| GpuInfo {
                id: idx as u32,
                name,
                vendor,
                total_memory_mb,
                driver_version: format_driver_version(properties.driver_version, vendor),
                is_discrete: properties.device_type == vk::PhysicalDeviceType::DISCRETE_GPU,
            })
            .collect::<Vec<_>>()
    });

    unsafe {
        instance.destroy_instance(None);
    }

    let gpus = gpus.map_err(|e| MetricError::provider(format!("Failed to enumerate devices: {:?}", e)))?;
    tracing::info!("Vulkan reported {} GPU(s)", gpus.len());
    Ok(gpus)
}

/// Total device-local memory in MB
#[cfg(feature = "gpu")]
fn device_memory_mb(memory_props: &ash::vk::PhysicalDeviceMemoryProperties) -> u64 {
    memory_props.memory_heaps[..memory_props.memory_heap_count as usize]
        .iter()
        .filter(|heap| heap.flags.contains(ash::vk::MemoryHeapFlags::DEVICE_LOCAL))
        .map(|heap| heap.size)
        .sum::<u64>()
        / (1024 * 1024)
}

/// NVIDIA packs driver versions as 10.8.14 bits; everyone else uses the Vulkan layout
#[cfg(feature = "gpu")]
fn format_driver_version(version: u32, vendor: GpuVendor) -> String {
    match vendor {
        GpuVendor::Nvidia => format!(
            "{}.{}.{}",
            (version >> 22) & 0x3FF,
            (version >> 14) & 0xFF,
            version & 0x3FFF
        ),
        _ => format!(
            "{}.{}.{}",
            ash::vk::api_version_major(version),
            ash::vk::api_version_minor(version),
            ash::vk::api_version_patch(version)
        ),
    }
}
