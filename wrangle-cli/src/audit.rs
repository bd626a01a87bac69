//! Audit command implementation for the wrangle CLI.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use std::io::Write;
use wrangle_core::AuditReport;
use wrangle_data::audit_osm_xml;

use crate::paths::require_existing;
use crate::{ARG_AUDIT_OSM_XML, ARG_AUDIT_REPORT, CliError, ENV_AUDIT_OSM_XML};

/// CLI arguments for the `audit` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "audit",
    long_about = "Stream an OSM XML extract once, recording the value types seen \
                 for every node, way and tag field together with coordinate and \
                 timestamp ranges, malformed postcodes and unexpected street \
                 name suffixes. The report is printed as JSON.",
    about = "Audit an OSM XML extract"
)]
#[ortho_config(prefix = "WRANGLE")]
pub(crate) struct AuditArgs {
    /// Path to the OSM XML extract.
    #[arg(long = ARG_AUDIT_OSM_XML, value_name = "path")]
    #[serde(default)]
    pub(crate) osm_xml: Option<Utf8PathBuf>,
    /// Write the report to this file instead of stdout.
    #[arg(long = ARG_AUDIT_REPORT, value_name = "path")]
    #[serde(default)]
    pub(crate) report: Option<Utf8PathBuf>,
}

impl AuditArgs {
    pub(crate) fn into_config(self) -> Result<AuditConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        AuditConfig::try_from(merged)
    }
}

/// Resolved `audit` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AuditConfig {
    /// Extract to audit.
    pub(crate) osm_xml: Utf8PathBuf,
    /// Optional report destination.
    pub(crate) report: Option<Utf8PathBuf>,
}

impl AuditConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.osm_xml, ARG_AUDIT_OSM_XML)
    }
}

impl TryFrom<AuditArgs> for AuditConfig {
    type Error = CliError;

    fn try_from(args: AuditArgs) -> Result<Self, Self::Error> {
        let osm_xml = args.osm_xml.ok_or(CliError::MissingArgument {
            field: ARG_AUDIT_OSM_XML,
            env: ENV_AUDIT_OSM_XML,
        })?;
        Ok(Self {
            osm_xml,
            report: args.report,
        })
    }
}

pub(super) fn run_audit(args: AuditArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_audit_with(args, &mut stdout)
}

/// Audit the configured extract and write the report to `--report` when
/// given, otherwise to `writer`.
pub(super) fn run_audit_with(args: AuditArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = resolve_audit_config(args)?;
    let report = execute_audit(&config)?;
    match &config.report {
        Some(path) => write_report_file(path, &report),
        None => write_report(writer, &report),
    }
}

pub(super) fn resolve_audit_config(args: AuditArgs) -> Result<AuditConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

fn execute_audit(config: &AuditConfig) -> Result<AuditReport, CliError> {
    audit_osm_xml(&config.osm_xml).map_err(|source| CliError::Audit {
        path: config.osm_xml.clone(),
        source,
    })
}

fn write_report_file(path: &Utf8Path, report: &AuditReport) -> Result<(), CliError> {
    let create = |source| CliError::CreateReport {
        path: path.to_path_buf(),
        source,
    };
    wrangle_fs::ensure_parent_dir(path).map_err(create)?;
    let mut file = wrangle_fs::create_file(path).map_err(create)?;
    write_report(&mut file, report)?;
    info!("wrote audit report to {path}");
    Ok(())
}

pub(super) fn write_report(writer: &mut dyn Write, report: &AuditReport) -> Result<(), CliError> {
    let payload =
        serde_json::to_string_pretty(report).map_err(|source| CliError::Serialise {
            what: "audit report",
            source,
        })?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<AuditConfig, CliError> {
    let merged = AuditArgs::merge_from_layers(layers).map_err(CliError::from)?;
    AuditConfig::try_from(merged)
}
