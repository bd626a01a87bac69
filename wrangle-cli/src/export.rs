//! Export command implementation for the wrangle CLI.

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use std::io::Write;
use thiserror::Error;
use wrangle_core::{PipelineDriver, PipelineError, PipelineSummary, Row, RowSink};
use wrangle_data::{
    CsvSinkError, CsvTableSink, OsmXmlError, SqliteSinkError, SqliteTableSink, open_osm_xml,
};

use crate::paths::{require_existing, require_output_dir};
use crate::{
    ARG_EXPORT_OSM_XML, ARG_EXPORT_OUTPUT_DIR, ARG_EXPORT_SQLITE, ARG_EXPORT_VALIDATE, CliError,
    ENV_EXPORT_OSM_XML, ENV_EXPORT_OUTPUT_DIR,
};

/// Pipeline failure raised while exporting.
pub type ExportError = PipelineError<OsmXmlError, ExportSinkError>;

/// CLI arguments for the `export` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "export",
    long_about = "Clean an OSM XML extract and write nodes.csv, nodes_tags.csv, \
                 ways.csv, ways_nodes.csv and ways_tags.csv into the output \
                 directory. Problematic tag keys and malformed postcodes are \
                 dropped, abbreviated English names are expanded, and every \
                 row can optionally be checked against the table schema. A \
                 SQLite database with the same five tables can be written \
                 alongside the CSV files.",
    about = "Export an OSM XML extract as CSV tables"
)]
#[ortho_config(prefix = "WRANGLE")]
pub(crate) struct ExportArgs {
    /// Path to the OSM XML extract.
    #[arg(long = ARG_EXPORT_OSM_XML, value_name = "path")]
    #[serde(default)]
    pub(crate) osm_xml: Option<Utf8PathBuf>,
    /// Directory receiving the CSV tables.
    #[arg(long = ARG_EXPORT_OUTPUT_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) output_dir: Option<Utf8PathBuf>,
    /// Abort on the first row that breaks the table schema.
    #[arg(
        long = ARG_EXPORT_VALIDATE,
        value_name = "bool",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    #[serde(default)]
    pub(crate) validate: Option<bool>,
    /// Also load the tables into this SQLite database.
    #[arg(long = ARG_EXPORT_SQLITE, value_name = "path")]
    #[serde(default)]
    pub(crate) sqlite: Option<Utf8PathBuf>,
}

impl ExportArgs {
    pub(crate) fn into_config(self) -> Result<ExportConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ExportConfig::try_from(merged)
    }
}

/// Resolved `export` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExportConfig {
    /// Extract to export.
    pub(crate) osm_xml: Utf8PathBuf,
    /// Directory receiving the CSV tables.
    pub(crate) output_dir: Utf8PathBuf,
    /// Whether rows are validated before writing.
    pub(crate) validate: bool,
    /// Optional SQLite database.
    pub(crate) sqlite: Option<Utf8PathBuf>,
}

impl ExportConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.osm_xml, ARG_EXPORT_OSM_XML)?;
        require_output_dir(&self.output_dir)
    }
}

impl TryFrom<ExportArgs> for ExportConfig {
    type Error = CliError;

    fn try_from(args: ExportArgs) -> Result<Self, Self::Error> {
        let osm_xml = args.osm_xml.ok_or(CliError::MissingArgument {
            field: ARG_EXPORT_OSM_XML,
            env: ENV_EXPORT_OSM_XML,
        })?;
        let output_dir = args.output_dir.ok_or(CliError::MissingArgument {
            field: ARG_EXPORT_OUTPUT_DIR,
            env: ENV_EXPORT_OUTPUT_DIR,
        })?;
        Ok(Self {
            osm_xml,
            output_dir,
            validate: args.validate.unwrap_or(false),
            sqlite: args.sqlite,
        })
    }
}

/// Errors raised by [`ExportSink`].
#[derive(Debug, Error)]
pub enum ExportSinkError {
    /// The CSV tables rejected a row.
    #[error(transparent)]
    Csv(#[from] CsvSinkError),
    /// The SQLite tables rejected a row.
    #[error(transparent)]
    Sqlite(#[from] SqliteSinkError),
}

/// Writes every row to the CSV tables and, when configured, to SQLite.
#[derive(Debug)]
pub(crate) struct ExportSink {
    csv: CsvTableSink,
    sqlite: Option<SqliteTableSink>,
}

impl ExportSink {
    pub(crate) fn create(config: &ExportConfig) -> Result<Self, CliError> {
        let csv = CsvTableSink::create(&config.output_dir)?;
        let sqlite = config
            .sqlite
            .as_deref()
            .map(SqliteTableSink::create)
            .transpose()?;
        Ok(Self { csv, sqlite })
    }
}

impl RowSink for ExportSink {
    type Error = ExportSinkError;

    fn write(&mut self, row: Row<'_>) -> Result<(), Self::Error> {
        self.csv.write(row)?;
        if let Some(sqlite) = self.sqlite.as_mut() {
            sqlite.write(row)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Self::Error> {
        self.csv.finish()?;
        if let Some(sqlite) = self.sqlite.as_mut() {
            sqlite.finish()?;
        }
        Ok(())
    }
}

pub(super) fn run_export(args: ExportArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_export_with(args, &mut stdout)
}

/// Export the configured extract and print the run summary as JSON.
pub(super) fn run_export_with(args: ExportArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = resolve_export_config(args)?;
    let summary = execute_export(&config)?;
    write_summary(writer, &summary)
}

pub(super) fn resolve_export_config(args: ExportArgs) -> Result<ExportConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

fn execute_export(config: &ExportConfig) -> Result<PipelineSummary, CliError> {
    let elements = open_osm_xml(&config.osm_xml).map_err(|source| CliError::OpenInput {
        path: config.osm_xml.clone(),
        source,
    })?;
    let sink = ExportSink::create(config)?;
    PipelineDriver::new()
        .with_validation(config.validate)
        .run(elements, sink)
        .map_err(|source| CliError::Export {
            path: config.osm_xml.clone(),
            source: Box::new(source),
        })
}

fn write_summary(writer: &mut dyn Write, summary: &PipelineSummary) -> Result<(), CliError> {
    let payload =
        serde_json::to_string_pretty(summary).map_err(|source| CliError::Serialise {
            what: "export summary",
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
) -> Result<ExportConfig, CliError> {
    let merged = ExportArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ExportConfig::try_from(merged)
}
