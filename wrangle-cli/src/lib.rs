//! Command-line interface for auditing and exporting OSM XML map extracts.
#![forbid(unsafe_code)]

use clap::{ArgAction, Parser, Subcommand};

mod audit;
mod error;
mod export;
pub mod logging;
mod paths;

pub use error::CliError;
pub use export::{ExportError, ExportSinkError};

use audit::{AuditArgs, run_audit};
use export::{ExportArgs, run_export};

pub(crate) const ARG_AUDIT_OSM_XML: &str = "osm-xml";
pub(crate) const ARG_AUDIT_REPORT: &str = "report";
pub(crate) const ENV_AUDIT_OSM_XML: &str = "WRANGLE_CMDS_AUDIT_OSM_XML";

pub(crate) const ARG_EXPORT_OSM_XML: &str = "osm-xml";
pub(crate) const ARG_EXPORT_OUTPUT_DIR: &str = "output-dir";
pub(crate) const ARG_EXPORT_VALIDATE: &str = "validate";
pub(crate) const ARG_EXPORT_SQLITE: &str = "sqlite";
pub(crate) const ENV_EXPORT_OSM_XML: &str = "WRANGLE_CMDS_EXPORT_OSM_XML";
pub(crate) const ENV_EXPORT_OUTPUT_DIR: &str = "WRANGLE_CMDS_EXPORT_OUTPUT_DIR";

/// Run the wrangle CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when argument parsing, configuration, or the selected
/// command fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    logging::init_logging(&logging::LogConfig::from_verbosity(cli.verbose))?;
    match cli.command {
        Command::Audit(args) => run_audit(args),
        Command::Export(args) => run_export(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "wrangle",
    about = "Audit and reshape OpenStreetMap XML extracts into tabular exports",
    version
)]
struct Cli {
    /// Increase log verbosity (`-v` for debug, `-vv` for trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Report field types and anomalies found in an extract.
    Audit(AuditArgs),
    /// Clean an extract and write the five output tables.
    Export(ExportArgs),
}

#[cfg(test)]
mod tests;
