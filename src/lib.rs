//! HealthMetrix - one-shot host health report
//!
//! Collects CPU, memory, disk, GPU, temperature, disk throughput and
//! network totals through a [`metrics::MetricsProvider`], renders them
//! with [`report::Reporter`] and logs every failure to an append-only
//! diagnostics log.

pub mod cli;
pub mod config;
pub mod error;
pub mod gpu;
pub mod logging;
pub mod metrics;
pub mod progress;
pub mod report;
pub mod sampler;
pub mod units;
pub mod version;
