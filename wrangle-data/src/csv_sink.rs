//! Row sink writing one CSV file per table.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8::File;
use csv::{Writer, WriterBuilder};
use log::info;
use thiserror::Error;
use wrangle_core::{Row, RowSink, Table};

/// File name of `table` inside an output directory.
#[must_use]
pub fn csv_file_name(table: Table) -> String {
    format!("{}.csv", table.name())
}

/// Errors raised by [`CsvTableSink`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CsvSinkError {
    /// The output directory could not be created.
    #[error("failed to create output directory {path}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A table file could not be created.
    #[error("failed to create {path}")]
    CreateFile {
        /// File that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Writing a header or row failed.
    #[error("failed to write to the {table} table")]
    Write {
        /// Table being written.
        table: Table,
        /// Error reported by the CSV writer.
        #[source]
        source: csv::Error,
    },
    /// Flushing a table file failed.
    #[error("failed to flush the {table} table")]
    Flush {
        /// Table being flushed.
        table: Table,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Writes `nodes.csv`, `nodes_tags.csv`, `ways.csv`, `ways_nodes.csv` and
/// `ways_tags.csv` into one directory.
///
/// Each file gets its header row when the sink is created, so empty tables
/// still produce a file with a header.
#[derive(Debug)]
pub struct CsvTableSink {
    dir: Utf8PathBuf,
    nodes: Writer<File>,
    nodes_tags: Writer<File>,
    ways: Writer<File>,
    ways_nodes: Writer<File>,
    ways_tags: Writer<File>,
}

impl CsvTableSink {
    /// Create the directory if needed and open the five table files,
    /// truncating existing ones.
    ///
    /// # Errors
    /// Returns an error when the directory or a file cannot be created, or a
    /// header cannot be written.
    pub fn create(dir: &Utf8Path) -> Result<Self, CsvSinkError> {
        wrangle_fs::ensure_dir(dir).map_err(|source| CsvSinkError::CreateDirectory {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
            nodes: open_table(dir, Table::Nodes)?,
            nodes_tags: open_table(dir, Table::NodesTags)?,
            ways: open_table(dir, Table::Ways)?,
            ways_nodes: open_table(dir, Table::WaysNodes)?,
            ways_tags: open_table(dir, Table::WaysTags)?,
        })
    }

    /// Output directory.
    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Path of the file holding `table`.
    #[must_use]
    pub fn path(&self, table: Table) -> Utf8PathBuf {
        self.dir.join(csv_file_name(table))
    }

    fn writer(&mut self, table: Table) -> &mut Writer<File> {
        match table {
            Table::Nodes => &mut self.nodes,
            Table::NodesTags => &mut self.nodes_tags,
            Table::Ways => &mut self.ways,
            Table::WaysNodes => &mut self.ways_nodes,
            Table::WaysTags => &mut self.ways_tags,
        }
    }
}

fn open_table(dir: &Utf8Path, table: Table) -> Result<Writer<File>, CsvSinkError> {
    let path = dir.join(csv_file_name(table));
    let file = wrangle_fs::create_file(&path)
        .map_err(|source| CsvSinkError::CreateFile { path, source })?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
    writer
        .write_record(table.fields())
        .map_err(|source| CsvSinkError::Write { table, source })?;
    Ok(writer)
}

impl RowSink for CsvTableSink {
    type Error = CsvSinkError;

    fn write(&mut self, row: Row<'_>) -> Result<(), Self::Error> {
        let table = row.table();
        let writer = self.writer(table);
        let written = match row {
            Row::Node(node) => writer.serialize(node),
            Row::NodeTag(tag) | Row::WayTag(tag) => writer.serialize(tag),
            Row::Way(way) => writer.serialize(way),
            Row::WayNode(way_node) => writer.serialize(way_node),
        };
        written.map_err(|source| CsvSinkError::Write { table, source })
    }

    fn finish(&mut self) -> Result<(), Self::Error> {
        for table in Table::ALL {
            self.writer(table)
                .flush()
                .map_err(|source| CsvSinkError::Flush { table, source })?;
        }
        info!("wrote CSV tables to {}", self.dir);
        Ok(())
    }
}
