//! Destinations for shaped rows.

use std::convert::Infallible;

use crate::schema::{Row, Table};
use crate::shape::{NodeRow, TagRow, WayNodeRow, WayRow};

/// Accepts rows for the five output tables.
///
/// Rows arrive in document order and must be kept in that order within each
/// table. [`RowSink::finish`] is called once after the last row.
pub trait RowSink {
    /// Error raised by the underlying store.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Store one row.
    ///
    /// # Errors
    /// Returns an error when the row cannot be stored.
    fn write(&mut self, row: Row<'_>) -> Result<(), Self::Error>;

    /// Flush buffered rows and commit.
    ///
    /// # Errors
    /// Returns an error when buffered rows cannot be persisted.
    fn finish(&mut self) -> Result<(), Self::Error>;
}

impl<S: RowSink + ?Sized> RowSink for &mut S {
    type Error = S::Error;

    fn write(&mut self, row: Row<'_>) -> Result<(), Self::Error> {
        (**self).write(row)
    }

    fn finish(&mut self) -> Result<(), Self::Error> {
        (**self).finish()
    }
}

/// In-memory sink that keeps owned copies of every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySink {
    /// `nodes` rows.
    pub nodes: Vec<NodeRow>,
    /// `nodes_tags` rows.
    pub nodes_tags: Vec<TagRow>,
    /// `ways` rows.
    pub ways: Vec<WayRow>,
    /// `ways_nodes` rows.
    pub ways_nodes: Vec<WayNodeRow>,
    /// `ways_tags` rows.
    pub ways_tags: Vec<TagRow>,
    finished: bool,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows held for `table`.
    #[must_use]
    pub fn len(&self, table: Table) -> usize {
        match table {
            Table::Nodes => self.nodes.len(),
            Table::NodesTags => self.nodes_tags.len(),
            Table::Ways => self.ways.len(),
            Table::WaysNodes => self.ways_nodes.len(),
            Table::WaysTags => self.ways_tags.len(),
        }
    }

    /// Report whether no rows have been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        Table::ALL.into_iter().all(|table| self.len(table) == 0)
    }

    /// Report whether [`RowSink::finish`] has been called.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }
}

impl RowSink for MemorySink {
    type Error = Infallible;

    fn write(&mut self, row: Row<'_>) -> Result<(), Self::Error> {
        match row {
            Row::Node(node) => self.nodes.push(node.clone()),
            Row::NodeTag(tag) => self.nodes_tags.push(tag.clone()),
            Row::Way(way) => self.ways.push(way.clone()),
            Row::WayNode(way_node) => self.ways_nodes.push(way_node.clone()),
            Row::WayTag(tag) => self.ways_tags.push(tag.clone()),
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Self::Error> {
        self.finished = true;
        Ok(())
    }
}
