//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use probar_mobile::EvaluationFailurePolicy;
use std::path::PathBuf;

/// probar-mobile: audit a web page for mobile-friendliness
#[derive(Parser, Debug)]
#[command(name = "probar-mobile")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Audit a page on emulated phones and tablets
    Audit(AuditArgs),

    /// List the known device profiles
    Devices(DevicesArgs),

    /// Show the effective audit configuration
    Config(ConfigArgs),
}

/// Options shared by commands that build an audit configuration
#[derive(Parser, Debug, Default, Clone)]
pub struct AuditOptions {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Device to audit (repeatable; replaces the configured list)
    #[arg(short, long = "device", value_name = "NAME")]
    pub devices: Vec<String>,

    /// Minimum readable font size in CSS pixels
    #[arg(long, value_name = "PX")]
    pub min_font_px: Option<f64>,

    /// Aspect-ratio divergence at or below which images count as distorted
    #[arg(long, value_name = "RATIO")]
    pub aspect_tolerance: Option<f64>,

    /// What to do when a check cannot be evaluated
    #[arg(long, value_name = "POLICY")]
    pub failure_policy: Option<FailurePolicyArg>,
}

/// Arguments for the audit command
#[derive(Parser, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct AuditArgs {
    /// URL of the page to audit
    pub url: String,

    #[command(flatten)]
    pub options: AuditOptions,

    /// Report format
    #[arg(short, long, default_value = "text")]
    pub format: ReportFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Path to the chromium binary
    #[arg(long, env = "CHROMIUM_PATH")]
    pub chromium_path: Option<String>,

    /// Disable the chromium sandbox (containers/CI)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Exit with an error when the overall score is below this value
    #[arg(long, value_name = "SCORE")]
    pub min_score: Option<f64>,
}

/// Arguments for the devices command
#[derive(Parser, Debug)]
pub struct DevicesArgs {
    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: ReportFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub options: AuditOptions,
}

/// Report output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON document
    Json,
}

/// Evaluation failure policy argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePolicyArg {
    /// Count the device as failing, without evidence
    Record,
    /// Leave the device out of the check's results
    Skip,
}

impl From<FailurePolicyArg> for EvaluationFailurePolicy {
    fn from(arg: FailurePolicyArg) -> Self {
        match arg {
            FailurePolicyArg::Record => Self::Record,
            FailurePolicyArg::Skip => Self::Skip,
        }
    }
}

/// Color output argument
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
