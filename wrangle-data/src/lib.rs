//! Adapters connecting the core pipeline to files and databases.
//!
//! Responsibilities:
//! - Stream nodes and ways out of OSM XML exports.
//! - Persist shaped rows as CSV files or SQLite tables.
//!
//! Boundaries:
//! - Do not encode cleaning or audit rules (live in `wrangle-core`).
//! - Route filesystem access through `wrangle-fs`.

#![forbid(unsafe_code)]

mod csv_sink;
mod sqlite_sink;
mod xml;

pub use csv_sink::{CsvSinkError, CsvTableSink, csv_file_name};
pub use sqlite_sink::{SqliteSinkError, SqliteTableSink};
pub use xml::{OsmXmlError, OsmXmlReader, open_osm_xml};

use camino::Utf8Path;
use wrangle_core::{AuditReport, audit};

/// Audit the OSM XML file at `path` in a single streaming pass.
///
/// # Errors
/// Returns [`OsmXmlError`] when the file cannot be opened or is not
/// well-formed.
pub fn audit_osm_xml(path: &Utf8Path) -> Result<AuditReport, OsmXmlError> {
    audit(open_osm_xml(path)?)
}
