//! probar-mobile: audit a web page for mobile-friendliness
//!
//! ## Usage
//!
//! ```bash
//! probar-mobile audit https://example.com               # All reference devices
//! probar-mobile audit https://example.com -d "iPhone 7"  # A single device
//! probar-mobile audit https://example.com --format json -o report.json
//! probar-mobile devices                                  # List device profiles
//! probar-mobile config -c audit.yaml                     # Show effective config
//! ```

use clap::Parser;
use probar_mobile::DeviceCatalog;
use probar_mobile_cli::{
    render_devices_text, render_json, render_text, resolve_audit_config, run_audit, AuditArgs,
    Cli, CliConfig, CliError, CliResult, ColorChoice, Commands, ConfigArgs, DevicesArgs,
    ProgressReporter, ReportFormat, Verbosity,
};
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let config = build_config(&cli);
    init_tracing(&config);

    match cli.command {
        Commands::Audit(args) => run_audit_command(&config, &args),
        Commands::Devices(args) => run_devices(&args),
        Commands::Config(args) => run_config(&args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else {
        match cli.verbose {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    };

    let color: ColorChoice = cli.color.clone().into();

    CliConfig::new()
        .with_verbosity(verbosity)
        .with_color(color)
        .with_log_json(cli.log_json)
}

/// Logs go to stderr so reports on stdout stay machine-readable
fn init_tracing(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.log_filter()));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.log_json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(config.color.should_color()),
            )
            .try_init()
    };
    if let Err(e) = result {
        eprintln!("Warning: failed to initialise logging: {e}");
    }
}

fn run_audit_command(config: &CliConfig, args: &AuditArgs) -> CliResult<()> {
    let use_color = config.color.should_color();
    let mut reporter = ProgressReporter::new(use_color, config.verbosity.is_quiet());

    let report = run_audit(args, &mut reporter)?;
    if config.verbosity.is_verbose() {
        reporter.info(&report.summary());
    }

    let rendered = match args.format {
        ReportFormat::Text => render_text(&report, use_color && args.output.is_none()),
        ReportFormat::Json => render_json(&report)?,
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, rendered)?;
            reporter.info(&format!("Report written to {}", path.display()));
        }
        None => print!("{rendered}"),
    }

    if let Some(min) = args.min_score {
        if report.overall_score < min {
            return Err(CliError::ScoreBelowMinimum {
                score: report.overall_score,
                min,
            });
        }
    }
    Ok(())
}

fn run_devices(args: &DevicesArgs) -> CliResult<()> {
    let catalog = DeviceCatalog::new();
    match args.format {
        ReportFormat::Text => print!("{}", render_devices_text(catalog.devices())),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(catalog.devices())?),
    }
    Ok(())
}

fn run_config(args: &ConfigArgs) -> CliResult<()> {
    let config = resolve_audit_config(&args.options, &DeviceCatalog::new())?;
    print!("{}", config.to_yaml()?);
    Ok(())
}
