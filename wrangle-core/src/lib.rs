//! Core types for auditing and reshaping OpenStreetMap map exports.
//!
//! The crate performs no I/O. Callers hand it a stream of [`Element`]s and
//! either audit them ([`audit`], [`AuditEngine`]) or shape them into rows for
//! five output tables ([`PipelineDriver`], [`ElementShaper`]) delivered to a
//! [`RowSink`].

#![forbid(unsafe_code)]

pub mod audit;
pub mod detect;
pub mod element;
pub mod normalise;
pub mod pipeline;
pub mod schema;
pub mod shape;
pub mod sink;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod validity;

pub use audit::{AuditEngine, AuditReport, FieldTypes, RecordClass, TypeSet, audit};
pub use detect::{TypeTag, detect, detect_optional, is_integer, parse_timestamp};
pub use element::{
    Element, ElementKind, EntityAttributes, EntityField, NODE_FIELDS, Node, NodeRef, Tag,
    WAY_FIELDS, Way,
};
pub use normalise::{NameRule, NameRules, check_postcode, normalise_name};
pub use pipeline::{PipelineDriver, PipelineError, PipelineSummary};
pub use schema::{
    FieldRule, Row, SchemaViolation, Table, ViolationReason, validate_record, validate_row,
};
pub use shape::{
    ElementShaper, NodeRow, ShapeError, ShapedRecord, TagRow, WayNodeRow, WayRow,
    has_problem_chars, shape, split_namespace,
};
pub use sink::{MemorySink, RowSink};
pub use validity::{
    Bounds, FieldValidity, NodeValidityReport, RangeTracker, TagValidity, ValidityTracker,
    WayValidityReport, name_suffix,
};
