//! probar-mobile CLI library
//!
//! Command-line front end for the mobile-friendliness audit: argument
//! parsing, configuration resolution, report rendering and the browser
//! lifecycle around an audit run.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::format_push_string)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{
    AuditArgs, AuditOptions, Cli, ColorArg, Commands, ConfigArgs, DevicesArgs, FailurePolicyArg,
    ReportFormat,
};
pub use config::{resolve_audit_config, CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{render_devices_text, render_json, render_text, AuditReport, ProgressReporter};
pub use runner::{browser_config, check_arguments, run_audit};
