//! HealthMetrix command-line entry point

use std::io;

use clap::Parser;
use tracing::{error, info};

use healthmetrix::cli::{Cli, Commands, ConfigSubcommand, RunArgs};
use healthmetrix::config::{self, HealthConfig};
use healthmetrix::error::Result;
use healthmetrix::logging::{self, DiagnosticsLog};
use healthmetrix::metrics::{MetricsProvider, SystemMetricsProvider};
use healthmetrix::progress::ProgressBar;
use healthmetrix::report::Reporter;
use healthmetrix::sampler::{RateSampler, SystemClock};
use healthmetrix::version;

fn main() {
    let cli = Cli::parse();

    let result = match cli.resolved_command() {
        Commands::Run(args) => run_diagnostics(&args, cli.verbose, cli.quiet),
        Commands::Version => {
            version::print_version();
            Ok(())
        }
        Commands::Config { subcommand } => handle_config_command(subcommand),
    };

    if let Err(e) = result {
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

/// Resolve configuration, start logging, then collect and print the report
fn run_diagnostics(args: &RunArgs, verbose: u8, quiet: bool) -> Result<()> {
    // Command-line values win over file and env, so validate after applying them
    let mut config = HealthConfig::load_unvalidated(args.config.as_deref())?;
    args.apply_to(&mut config);
    config.validate()?;

    let log = logging::init_logging(&config.logging, verbose, quiet)?;
    let result = collect_and_print(&config, args, quiet, &log);
    if let Err(ref e) = result {
        log.in_scope(|| error!("Diagnostics aborted: {}", e.format_for_log()));
    }

    result
}

fn collect_and_print(
    config: &HealthConfig,
    args: &RunArgs,
    quiet: bool,
    log: &DiagnosticsLog,
) -> Result<()> {
    let provider = log.in_scope(|| {
        info!(version = %version::build_info().full_version(), "Starting HealthMetrix");
        SystemMetricsProvider::detect(&config.diagnostics.mount_point)
    });

    if !args.json {
        println!("Starting Diagnostics...\n");
    }

    if config.diagnostics.show_progress && !quiet {
        ProgressBar::new("Running Diagnostics", config.diagnostics.progress_steps).run(
            &mut io::stderr().lock(),
            &SystemClock,
            config.diagnostics.progress_step(),
        )?;
    }

    let sampler = RateSampler::new(config.diagnostics.sample_window());
    let provider: &dyn MetricsProvider = &provider;
    let report = Reporter::new(provider, sampler, log.dispatch().clone()).collect();

    if args.json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    println!();
    print!("{}", report);
    match log.file() {
        Some(path) => println!("\nDiagnostics completed. Check {} for details.", path.display()),
        None => println!("\nDiagnostics completed."),
    }

    Ok(())
}

fn handle_config_command(subcommand: ConfigSubcommand) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show { config } => {
            let cfg = HealthConfig::load(config.as_deref())?;
            println!("{}", toml::to_string_pretty(&cfg)?);
        }
        ConfigSubcommand::Init { path, force } => {
            let path = config::init_config(path.as_deref(), force)?;
            println!("Configuration written to {}", path.display());
        }
        ConfigSubcommand::Validate { config } => {
            HealthConfig::load(config.as_deref())?;
            println!("Configuration is valid.");
        }
    }

    Ok(())
}
