//! CLI argument parsing using clap v4
//!
//! Defines the command-line interface for HealthMetrix.

use clap::{Args, Parser, Subcommand};

use crate::config::HealthConfig;

/// HealthMetrix - host health report
///
/// Collects CPU, memory, disk, GPU, temperature and I/O metrics and prints
/// a one-shot report. Failures of individual metrics are shown inline and
/// written to the diagnostics log.
#[derive(Parser, Debug)]
#[command(name = "healthmetrix")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace) and mirror logs to stderr
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors and hide the progress bar
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Command to run (defaults to `run`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// The command to execute, with `run` as the default
    pub fn resolved_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Run(RunArgs::default()))
    }
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Collect metrics and print the report
    Run(RunArgs),

    /// Display version and build information
    Version,

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

/// Options for a diagnostics run
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct RunArgs {
    /// Path to configuration file
    #[arg(short, long, env = "HEALTHMETRIX_CONFIG")]
    pub config: Option<String>,

    /// Append log lines to this file instead of the configured one
    #[arg(long, conflicts_with = "no_log_file")]
    pub log_file: Option<String>,

    /// Do not write a log file
    #[arg(long)]
    pub no_log_file: bool,

    /// Throughput sampling window in seconds
    #[arg(long, value_name = "SECONDS", value_parser = parse_window)]
    pub window: Option<f64>,

    /// Filesystem to report disk usage for
    #[arg(long, value_name = "PATH")]
    pub mount: Option<String>,

    /// Skip the start-up progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    /// Apply command-line overrides on top of file and environment settings
    pub fn apply_to(&self, config: &mut HealthConfig) {
        if let Some(ref log_file) = self.log_file {
            config.logging.file = Some(crate::config::expand_path(log_file));
        }
        if self.no_log_file {
            config.logging.file = None;
        }
        if let Some(window) = self.window {
            config.diagnostics.sample_window_secs = window;
        }
        if let Some(ref mount) = self.mount {
            config.diagnostics.mount_point = mount.clone();
        }
        if self.no_progress {
            config.diagnostics.show_progress = false;
        }
    }
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the effective configuration
    Show {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn parse_window(value: &str) -> Result<f64, String> {
    let secs: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number of seconds", value))?;
    if secs.is_finite() && secs > 0.0 {
        Ok(secs)
    } else {
        Err("window must be greater than 0".to_string())
    }
}
