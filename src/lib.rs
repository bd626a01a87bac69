//! Facade crate for the OSM extract wrangling tools.
//!
//! This crate re-exports the audit and cleaning API of `wrangle-core` and,
//! behind the `data` feature, the XML reader and table sinks.

#![forbid(unsafe_code)]

pub use wrangle_core::{
    AuditEngine, AuditReport, Element, ElementShaper, MemorySink, NameRules, PipelineDriver,
    PipelineError, PipelineSummary, Row, RowSink, SchemaViolation, ShapeError, ShapedRecord,
    Table, TypeTag, ValidityTracker, audit, check_postcode, detect, normalise_name, shape,
};

#[cfg(feature = "data")]
pub use wrangle_data::{
    CsvSinkError, CsvTableSink, OsmXmlError, OsmXmlReader, SqliteSinkError, SqliteTableSink,
    audit_osm_xml, open_osm_xml,
};
