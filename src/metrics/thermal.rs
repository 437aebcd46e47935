//! CPU temperature sources

use std::process::Command;

use sysinfo::Components;

use crate::error::{MetricError, MetricResult};

use super::Celsius;

pub const TEMPERATURE_UNSUPPORTED: &str = "Temperature monitoring not supported on this OS";
pub const TEMPERATURE_NOT_FOUND: &str = "Unable to retrieve temperature";

/// Sensor labels that identify a CPU reading, most specific first
const CPU_SENSOR_LABELS: &[&str] = &["core 0", "package id 0", "tctl", "tdie", "cpu", "coretemp", "k10temp"];

/// How CPU temperature is read on this host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThermalSource {
    /// sysinfo hardware components
    Components,
    /// `sensors` command from lm-sensors (Linux)
    LmSensors,
    /// Supported OS, but no sensor could be found
    Unavailable,
    /// No way to read temperature on this OS
    Unsupported,
}

impl ThermalSource {
    /// Find a usable source on this host
    pub fn detect() -> Self {
        let has_components = !Components::new_with_refreshed_list().list().is_empty();
        let has_lm_sensors = !has_components && cfg!(target_os = "linux") && lm_sensors_available();
        Self::select(std::env::consts::OS, has_components, has_lm_sensors)
    }

    /// Pick a source from what was found on a host running `os`.
    ///
    /// Linux and Windows always support temperature monitoring; there a
    /// missing sensor is reported as not found rather than unsupported.
    pub fn select(os: &str, has_components: bool, has_lm_sensors: bool) -> Self {
        match os {
            _ if has_components => ThermalSource::Components,
            "linux" if has_lm_sensors => ThermalSource::LmSensors,
            "linux" | "windows" => ThermalSource::Unavailable,
            _ => ThermalSource::Unsupported,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ThermalSource::Components => "sysinfo",
            ThermalSource::LmSensors => "lm-sensors",
            ThermalSource::Unavailable => "unavailable",
            ThermalSource::Unsupported => "none",
        }
    }

    /// Read the current CPU temperature
    pub fn read(&self) -> MetricResult<Celsius> {
        let reading = match self {
            ThermalSource::Components => {
                let components = Components::new_with_refreshed_list();
                pick_cpu_sensor(
                    components
                        .list()
                        .iter()
                        .map(|c| (c.label(), c.temperature())),
                )
            }
            ThermalSource::LmSensors => {
                let output = Command::new("sensors").output()?;
                if !output.status.success() {
                    return Err(MetricError::provider(format!(
                        "sensors exited with {}",
                        output.status
                    )));
                }
                parse_sensors_output(&String::from_utf8_lossy(&output.stdout))?
            }
            ThermalSource::Unavailable => None,
            ThermalSource::Unsupported => {
                return Err(MetricError::unsupported(TEMPERATURE_UNSUPPORTED));
            }
        };

        reading
            .map(Celsius)
            .ok_or_else(|| MetricError::not_found(TEMPERATURE_NOT_FOUND))
    }
}

fn lm_sensors_available() -> bool {
    Command::new("sensors")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Choose the CPU reading from `(label, temperature)` pairs.
///
/// Labels are matched case-insensitively against [`CPU_SENSOR_LABELS`] in
/// order. Sensors without a current value are ignored.
pub fn pick_cpu_sensor<'a, I>(readings: I) -> Option<f64>
where
    I: IntoIterator<Item = (&'a str, Option<f32>)>,
{
    let readings: Vec<(String, f32)> = readings
        .into_iter()
        .filter_map(|(label, temp)| temp.filter(|t| t.is_finite()).map(|t| (label.to_lowercase(), t)))
        .collect();

    CPU_SENSOR_LABELS.iter().find_map(|wanted| {
        readings
            .iter()
            .find(|(label, _)| label.contains(wanted))
            .map(|(_, temp)| f64::from(*temp))
    })
}

/// Extract the "Core 0" reading from `sensors` output.
///
/// Returns `Ok(None)` when no "Core 0" line exists and an error when the
/// line is present but its value cannot be parsed.
pub fn parse_sensors_output(output: &str) -> MetricResult<Option<f64>> {
    let Some(line) = output.lines().find(|line| line.contains("Core 0")) else {
        return Ok(None);
    };

    let field = line
        .split_whitespace()
        .nth(2)
        .ok_or_else(|| MetricError::provider(format!("unexpected sensors line: {}", line.trim())))?;

    field
        .trim_end_matches("°C")
        .trim_start_matches('+')
        .parse::<f64>()
        .map(Some)
        .map_err(|e| MetricError::provider(format!("cannot parse temperature '{}': {}", field, e)))
}
