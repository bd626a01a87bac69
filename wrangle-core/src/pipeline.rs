//! Drive the element shaper over a whole document.

use log::{debug, info};
use serde::Serialize;
use thiserror::Error;

use crate::element::Element;
use crate::schema::{Row, SchemaViolation, Table, validate_record};
use crate::shape::{ElementShaper, ShapeError};
use crate::sink::RowSink;

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError<SourceError, SinkError> {
    /// The element source failed.
    #[error("failed to read the next element")]
    Source(#[source] SourceError),
    /// An element could not be shaped.
    #[error(transparent)]
    Shape(#[from] ShapeError),
    /// A shaped row broke the table schema.
    #[error("row failed validation")]
    Schema(#[source] SchemaViolation),
    /// The row sink rejected a row.
    #[error("failed to write rows")]
    Sink(#[source] SinkError),
}

/// Counts gathered over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineSummary {
    /// Rows written to `nodes`.
    pub nodes: u64,
    /// Rows written to `nodes_tags`.
    pub nodes_tags: u64,
    /// Rows written to `ways`.
    pub ways: u64,
    /// Rows written to `ways_nodes`.
    pub ways_nodes: u64,
    /// Rows written to `ways_tags`.
    pub ways_tags: u64,
    /// Tags the shaper filtered out.
    pub dropped_tags: u64,
}

impl PipelineSummary {
    /// Rows written to `table`.
    #[must_use]
    pub const fn rows(&self, table: Table) -> u64 {
        match table {
            Table::Nodes => self.nodes,
            Table::NodesTags => self.nodes_tags,
            Table::Ways => self.ways,
            Table::WaysNodes => self.ways_nodes,
            Table::WaysTags => self.ways_tags,
        }
    }

    const fn count(&mut self, table: Table) {
        let counter = match table {
            Table::Nodes => &mut self.nodes,
            Table::NodesTags => &mut self.nodes_tags,
            Table::Ways => &mut self.ways,
            Table::WaysNodes => &mut self.ways_nodes,
            Table::WaysTags => &mut self.ways_tags,
        };
        *counter += 1;
    }
}

/// Shapes every element of a source and forwards the rows to a sink.
///
/// # Examples
/// ```
/// use std::convert::Infallible;
/// use wrangle_core::{Element, EntityAttributes, MemorySink, NodeRef, PipelineDriver, Way};
///
/// let way = Way {
///     attributes: EntityAttributes {
///         id: Some("10".into()),
///         user: Some("mapper".into()),
///         uid: Some("1".into()),
///         version: Some("1".into()),
///         changeset: Some("5".into()),
///         timestamp: Some("2016-01-01T00:00:00Z".into()),
///     },
///     tags: Vec::new(),
///     node_refs: vec![NodeRef::new("1"), NodeRef::new("2")],
/// };
///
/// let mut sink = MemorySink::new();
/// let summary = PipelineDriver::new()
///     .with_validation(true)
///     .run([Ok::<_, Infallible>(Element::Way(way))], &mut sink)?;
///
/// assert_eq!(summary.ways_nodes, 2);
/// assert_eq!(sink.ways_nodes[1].position, 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct PipelineDriver {
    shaper: ElementShaper,
    validate: bool,
}

impl PipelineDriver {
    /// Create a driver with the default shaper and validation off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the element shaper.
    #[must_use]
    pub fn with_shaper(mut self, shaper: ElementShaper) -> Self {
        self.shaper = shaper;
        self
    }

    /// Enable or disable schema validation of every shaped record.
    #[must_use]
    pub const fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Report whether records are validated before writing.
    #[must_use]
    pub const fn validates(&self) -> bool {
        self.validate
    }

    /// Run the pipeline to completion.
    ///
    /// Rows of each element are written together: the entity row, then its
    /// way nodes, then its tags. The sink is finished after the last element.
    ///
    /// # Errors
    /// Any source, shaping, validation or sink failure aborts the run. Rows
    /// already written are left in the sink.
    pub fn run<I, E, S>(
        &self,
        elements: I,
        mut sink: S,
    ) -> Result<PipelineSummary, PipelineError<E, S::Error>>
    where
        I: IntoIterator<Item = Result<Element, E>>,
        S: RowSink,
    {
        let mut summary = PipelineSummary::default();
        for element in elements {
            let element = element.map_err(PipelineError::Source)?;
            let record = self.shaper.shape(&element)?;
            if self.validate {
                validate_record(&record).map_err(PipelineError::Schema)?;
            }
            let kept = record.tags().len();
            let dropped = element.tags().len().saturating_sub(kept);
            summary.dropped_tags += u64::try_from(dropped).unwrap_or(u64::MAX);
            for row in Row::from_record(&record) {
                sink.write(row).map_err(PipelineError::Sink)?;
                summary.count(row.table());
            }
            debug!(
                "shaped {} {}",
                element.kind(),
                element.id().unwrap_or_default()
            );
        }
        sink.finish().map_err(PipelineError::Sink)?;
        info!(
            "wrote {} nodes ({} tags) and {} ways ({} node refs, {} tags); dropped {} tags",
            summary.nodes,
            summary.nodes_tags,
            summary.ways,
            summary.ways_nodes,
            summary.ways_tags,
            summary.dropped_tags
        );
        Ok(summary)
    }
}
