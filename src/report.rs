//! Diagnostics report
//!
//! The [`Reporter`] queries a [`MetricsProvider`] one metric at a time and
//! turns every outcome into a [`Reading`]. A failing metric never stops
//! the rest of the report; it is rendered as a short message and logged.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn, Dispatch};

use crate::error::{MetricError, MetricResult, Result};
use crate::metrics::MetricsProvider;
use crate::sampler::{Clock, Rate, RateSampler, SystemClock};
use crate::units::format_bytes;

// ─────────────────────────────────────────────────────────────────
// Readings
// ─────────────────────────────────────────────────────────────────

/// Metrics shown in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Cpu,
    Ram,
    Disk,
    Gpu,
    CpuTemperature,
    DiskHealth,
    DiskSpeeds,
    NetworkActivity,
}

impl Metric {
    /// Wording used in "Error retrieving ..." messages
    pub fn subject(&self) -> &'static str {
        match self {
            Metric::Cpu => "CPU info",
            Metric::Ram => "RAM info",
            Metric::Disk => "disk info",
            Metric::Gpu => "GPU info",
            Metric::CpuTemperature => "CPU temperature",
            Metric::DiskHealth => "disk health",
            Metric::DiskSpeeds => "disk read/write speeds",
            Metric::NetworkActivity => "network activity",
        }
    }
}

/// Rendered outcome of one metric query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum Reading {
    Ok(String),
    NotSupported(String),
    NotFound(String),
    Error(String),
}

impl Reading {
    pub fn text(&self) -> &str {
        match self {
            Reading::Ok(text)
            | Reading::NotSupported(text)
            | Reading::NotFound(text)
            | Reading::Error(text) => text,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Reading::Ok(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reading::Error(_))
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Map a query result to a reading, logging anything that is not a value
fn render<T>(metric: Metric, result: MetricResult<T>, format: impl FnOnce(T) -> String) -> Reading {
    let subject = metric.subject();
    let err = match result {
        Ok(value) => return Reading::Ok(format(value)),
        Err(err) => err,
    };

    let code = err.code();
    match err {
        MetricError::Provider(message) => {
            error!(code = %code, "Error retrieving {}: {}", subject, message);
            Reading::Error(format!("Error retrieving {}", subject))
        }
        MetricError::Unsupported(message) => {
            debug!(code = %code, metric = subject, "{}", message);
            Reading::NotSupported(message)
        }
        MetricError::NotFound(message) => {
            debug!(code = %code, metric = subject, "{}", message);
            Reading::NotFound(message)
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Report
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SystemSection {
    pub cpu: Reading,
    pub ram: Reading,
    pub disk: Reading,
    pub gpu: Reading,
    pub cpu_temperature: Reading,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsSection {
    pub disk_speeds: Reading,
    pub network_activity: Reading,
}

/// One complete diagnostics run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub hostname: String,
    pub backend: String,
    pub system: SystemSection,
    pub disk_health: Reading,
    pub diagnostics: DiagnosticsSection,
}

impl Report {
    fn readings(&self) -> [&Reading; 8] {
        [
            &self.system.cpu,
            &self.system.ram,
            &self.system.disk,
            &self.system.gpu,
            &self.system.cpu_temperature,
            &self.disk_health,
            &self.diagnostics.disk_speeds,
            &self.diagnostics.network_activity,
        ]
    }

    /// Number of metrics whose query failed
    pub fn failures(&self) -> usize {
        self.readings().iter().filter(|r| r.is_error()).count()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== System Information ===")?;
        writeln!(f, "CPU: {}", self.system.cpu)?;
        writeln!(f, "RAM: {}", self.system.ram)?;
        writeln!(f, "Disk: {}", self.system.disk)?;
        writeln!(f, "GPU: {}", self.system.gpu)?;
        writeln!(f, "CPU Temperature: {}", self.system.cpu_temperature)?;
        writeln!(f)?;
        writeln!(f, "=== Disk Health Information ===")?;
        writeln!(f, "{}", self.disk_health)?;
        writeln!(f)?;
        writeln!(f, "=== Diagnostics ===")?;
        writeln!(f, "Disk Read/Write Speeds: {}", self.diagnostics.disk_speeds)?;
        writeln!(f, "Network Activity: {}", self.diagnostics.network_activity)
    }
}

// ─────────────────────────────────────────────────────────────────
// Reporter
// ─────────────────────────────────────────────────────────────────

/// Collects a [`Report`] from a provider
pub struct Reporter<'a, C: Clock = SystemClock> {
    provider: &'a dyn MetricsProvider,
    sampler: RateSampler<C>,
    dispatch: Dispatch,
}

impl<'a, C: Clock> Reporter<'a, C> {
    /// Events emitted while collecting go to `dispatch`
    pub fn new(provider: &'a dyn MetricsProvider, sampler: RateSampler<C>, dispatch: Dispatch) -> Self {
        Self {
            provider,
            sampler,
            dispatch,
        }
    }

    /// Query every metric in order and build the report
    pub fn collect(&self) -> Report {
        tracing::dispatcher::with_default(&self.dispatch, || {
            info!(
                backend = self.provider.backend_name(),
                window_ms = self.sampler.window().as_millis() as u64,
                "Collecting diagnostics"
            );

            let report = Report {
                generated_at: Utc::now(),
                hostname: local_hostname(),
                backend: self.provider.backend_name().to_string(),
                system: self.system_information(),
                disk_health: self.disk_health(),
                diagnostics: DiagnosticsSection {
                    disk_speeds: self.disk_speeds(),
                    network_activity: self.network_activity(),
                },
            };

            info!(failures = report.failures(), "Diagnostics collected");
            report
        })
    }

    fn system_information(&self) -> SystemSection {
        let provider = self.provider;
        SystemSection {
            cpu: render(Metric::Cpu, provider.cpu_brand(), |brand| brand),
            ram: render(Metric::Ram, provider.total_ram(), format_bytes),
            disk: render(Metric::Disk, provider.total_disk(), format_bytes),
            gpu: render(Metric::Gpu, provider.gpu_name(), |name| name),
            cpu_temperature: render(Metric::CpuTemperature, provider.cpu_temperature(), |t| t.to_string()),
        }
    }

    fn disk_health(&self) -> Reading {
        render(Metric::DiskHealth, self.provider.disk_usage(), |usage| {
            format!(
                "Total: {}, Used: {}, Free: {}, Percent Used: {:.1}%",
                format_bytes(usage.total),
                format_bytes(usage.used),
                format_bytes(usage.free),
                usage.percent_used
            )
        })
    }

    fn disk_speeds(&self) -> Reading {
        let rates = self.sampler.sample_rates(|| {
            self.provider
                .disk_io_counters()
                .map(|io| [io.read_bytes, io.write_bytes])
        });

        render(Metric::DiskSpeeds, rates, |[read, write]: [Rate; 2]| {
            for (counter, rate) in [("read", read), ("write", write)] {
                if rate.is_anomalous() {
                    warn!(
                        bytes_per_sec = rate.bytes_per_sec,
                        "Disk {} counter went backwards during sampling (counter reset)", counter
                    );
                }
            }
            format!("Read Speed: {}, Write Speed: {}", read, write)
        })
    }

    fn network_activity(&self) -> Reading {
        render(Metric::NetworkActivity, self.provider.network_io_counters(), |io| {
            format!(
                "Bytes Sent: {}, Bytes Received: {}",
                format_bytes(io.bytes_sent),
                format_bytes(io.bytes_recv)
            )
        })
    }
}

fn local_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tracing::Level;

    use crate::logging::{dispatch_with_writer, LogCapture};
    use crate::metrics::{Celsius, DiskIoCounters, StaticMetrics, TEMPERATURE_UNSUPPORTED};
    use crate::sampler::tests::ManualClock;

    fn collect(provider: &StaticMetrics) -> (Report, LogCapture) {
        let capture = LogCapture::default();
        let sampler = RateSampler::with_clock(ManualClock::new(), Duration::from_secs(1));
        let dispatch = dispatch_with_writer(capture.clone(), Level::DEBUG, false);
        let report = Reporter::new(provider, sampler, dispatch).collect();
        (report, capture)
    }

    #[test]
    fn test_full_report_text() {
        let (report, _) = collect(&StaticMetrics::new());

        let expected = "\
=== System Information ===
CPU: Test CPU
RAM: 8.00 GB
Disk: 465.66 GB
GPU: Test GPU
CPU Temperature: 45.00 °C

=== Disk Health Information ===
Total: 465.66 GB, Used: 279.40 GB, Free: 186.26 GB, Percent Used: 60.0%

=== Diagnostics ===
Disk Read/Write Speeds: Read Speed: 1.00 MB/s, Write Speed: 512.00 KB/s
Network Activity: Bytes Sent: 1.00 MB, Bytes Received: 5.00 GB
";
        assert_eq!(report.to_string(), expected);
        assert_eq!(report.failures(), 0);
        assert_eq!(report.backend, "static");
    }

    #[test]
    fn test_gpu_failure_is_isolated_and_logged() {
        let provider = StaticMetrics::new().with_gpu_name(Err(MetricError::provider("driver not loaded")));
        let (report, capture) = collect(&provider);

        assert_eq!(report.system.gpu, Reading::Error("Error retrieving GPU info".to_string()));
        assert!(report.to_string().contains("GPU: Error retrieving GPU info\n"));
        assert_eq!(report.failures(), 1);

        // Everything else still rendered
        assert_eq!(report.system.cpu.text(), "Test CPU");
        assert_eq!(report.system.cpu_temperature.text(), "45.00 °C");
        assert!(report.disk_health.is_ok());
        assert!(report.diagnostics.disk_speeds.is_ok());
        assert!(report.diagnostics.network_activity.is_ok());

        let logs = capture.contents();
        assert!(logs.contains("ERROR"));
        assert!(logs.contains("Error retrieving GPU info: driver not loaded"));
        assert!(logs.contains("code=E301"));
    }

    #[test]
    fn test_unsupported_and_not_found_keep_message() {
        let provider = StaticMetrics::new()
            .with_cpu_temperature(Err(MetricError::unsupported(TEMPERATURE_UNSUPPORTED)))
            .with_gpu_name(Err(MetricError::not_found("No GPU detected or available")));
        let (report, capture) = collect(&provider);

        assert_eq!(
            report.system.cpu_temperature,
            Reading::NotSupported(TEMPERATURE_UNSUPPORTED.to_string())
        );
        assert_eq!(report.system.gpu.text(), "No GPU detected or available");
        assert_eq!(report.failures(), 0);

        let logs = capture.contents();
        assert!(logs.contains("code=E300"));
        assert!(logs.contains("code=E302"));
        assert!(!logs.contains("ERROR"));
    }

    #[test]
    fn test_every_metric_failing_still_produces_report() {
        let boom = || MetricError::provider("boom");
        let provider = StaticMetrics::new()
            .with_cpu_brand(Err(boom()))
            .with_total_ram(Err(boom()))
            .with_gpu_name(Err(boom()))
            .with_cpu_temperature(Err(boom()))
            .with_disk_usage(Err(boom()))
            .with_disk_io(Err(boom()))
            .with_network_io(Err(boom()));
        let (report, _) = collect(&provider);

        assert_eq!(report.failures(), 8);
        let text = report.to_string();
        assert!(text.contains("CPU: Error retrieving CPU info"));
        assert!(text.contains("RAM: Error retrieving RAM info"));
        assert!(text.contains("Disk: Error retrieving disk info"));
        assert!(text.contains("CPU Temperature: Error retrieving CPU temperature"));
        assert!(text.contains("Error retrieving disk health"));
        assert!(text.contains("Disk Read/Write Speeds: Error retrieving disk read/write speeds"));
        assert!(text.contains("Network Activity: Error retrieving network activity"));
    }

    #[test]
    fn test_counter_reset_is_reported_as_anomaly() {
        let provider = StaticMetrics::new().with_disk_io(Ok(vec![
            DiskIoCounters { read_bytes: 50_000, write_bytes: 0 },
            DiskIoCounters { read_bytes: 0, write_bytes: 1024 },
        ]));
        let (report, capture) = collect(&provider);

        assert_eq!(
            report.diagnostics.disk_speeds.text(),
            "Read Speed: anomalous (counter reset), Write Speed: 1.00 KB/s"
        );
        assert!(report.diagnostics.disk_speeds.is_ok());

        let logs = capture.contents();
        assert!(logs.contains("WARN"));
        assert!(logs.contains("Disk read counter went backwards"));
        assert!(!logs.contains("Disk write counter"));
    }

    #[test]
    fn test_disk_io_read_exactly_twice() {
        let provider = StaticMetrics::new();
        collect(&provider);
        assert_eq!(provider.disk_io_reads(), 2);
    }

    #[test]
    fn test_json_report() {
        let provider = StaticMetrics::new()
            .with_gpu_name(Err(MetricError::provider("driver not loaded")))
            .with_cpu_temperature(Ok(Celsius(50.5)));
        let (report, _) = collect(&provider);

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["system"]["ram"]["status"], "ok");
        assert_eq!(value["system"]["ram"]["text"], "8.00 GB");
        assert_eq!(value["system"]["gpu"]["status"], "error");
        assert_eq!(value["system"]["cpu_temperature"]["text"], "50.50 °C");
        assert!(value["generated_at"].is_string());
        assert!(value["hostname"].is_string());
    }
}
