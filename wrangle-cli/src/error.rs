//! Error types emitted by the wrangle CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use tracing_subscriber::util::TryInitError;
use wrangle_data::{CsvSinkError, OsmXmlError, SqliteSinkError};

use crate::export::ExportError;

/// Errors emitted by the wrangle CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The output directory exists but is a file.
    #[error("output directory {path:?} is not a directory")]
    OutputDirectoryNotDirectory { path: Utf8PathBuf },
    /// Installing the logging backend failed.
    #[error("failed to initialise logging: {0}")]
    InitLogging(#[source] TryInitError),
    /// Reading the extract failed during an audit.
    #[error("failed to audit {path:?}: {source}")]
    Audit {
        path: Utf8PathBuf,
        #[source]
        source: OsmXmlError,
    },
    /// Opening the extract for export failed.
    #[error("failed to open {path:?}: {source}")]
    OpenInput {
        path: Utf8PathBuf,
        #[source]
        source: OsmXmlError,
    },
    /// Creating the CSV tables failed.
    #[error(transparent)]
    CreateCsvSink(#[from] CsvSinkError),
    /// Creating the SQLite tables failed.
    #[error(transparent)]
    CreateSqliteSink(#[from] SqliteSinkError),
    /// The export pipeline aborted.
    #[error("failed to export {path:?}: {source}")]
    Export {
        path: Utf8PathBuf,
        #[source]
        source: Box<ExportError>,
    },
    /// Serialising JSON output failed.
    #[error("failed to serialise {what}: {source}")]
    Serialise {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// Creating the report file failed.
    #[error("failed to create report file {path:?}: {source}")]
    CreateReport {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
