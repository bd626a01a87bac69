//! Row sink loading the five tables into a SQLite database.

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use rusqlite::types::Value;
use rusqlite::{Connection, Error as SqliteError, params_from_iter};
use thiserror::Error;
use wrangle_core::detect::{parse_float, parse_int};
use wrangle_core::{FieldRule, Row, RowSink, Table};

/// Errors raised by [`SqliteTableSink`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteSinkError {
    /// Failed to create the parent directory of the database.
    #[error("failed to create parent directory of {path}")]
    CreateDirectory {
        /// Database path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the database failed.
    #[error("failed to open SQLite database at {path}")]
    Open {
        /// Database path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Beginning the load transaction failed.
    #[error("failed to begin the load transaction")]
    BeginTransaction {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Creating a table failed.
    #[error("failed to create the {table} table")]
    CreateSchema {
        /// Table being created.
        table: Table,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Inserting a row failed.
    #[error("failed to insert a row into {table}")]
    Insert {
        /// Destination table.
        table: Table,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Committing the load transaction failed.
    #[error("failed to commit the load transaction")]
    Commit {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
}

/// Loads rows into the tables `nodes`, `nodes_tags`, `ways`, `ways_nodes`
/// and `ways_tags` of one database.
///
/// Existing tables are replaced. All rows are inserted inside a single
/// transaction committed by [`RowSink::finish`]; dropping the sink without
/// finishing discards them.
#[derive(Debug)]
pub struct SqliteTableSink {
    path: Utf8PathBuf,
    connection: Connection,
    committed: bool,
}

impl SqliteTableSink {
    /// Open the database and create fresh tables inside a new transaction.
    ///
    /// # Errors
    /// Returns an error when the database cannot be opened or the tables
    /// cannot be created.
    pub fn create(path: &Utf8Path) -> Result<Self, SqliteSinkError> {
        wrangle_fs::ensure_parent_dir(path).map_err(|source| {
            SqliteSinkError::CreateDirectory {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let connection =
            Connection::open(path.as_std_path()).map_err(|source| SqliteSinkError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        connection
            .execute_batch("BEGIN")
            .map_err(|source| SqliteSinkError::BeginTransaction { source })?;
        for table in Table::ALL {
            connection
                .execute_batch(&create_table_sql(table))
                .map_err(|source| SqliteSinkError::CreateSchema { table, source })?;
        }
        Ok(Self {
            path: path.to_path_buf(),
            connection,
            committed: false,
        })
    }

    /// Database path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

fn column_type(rule: FieldRule) -> &'static str {
    match rule {
        FieldRule::Integer => "INTEGER",
        FieldRule::Float { .. } => "REAL",
        FieldRule::Text => "TEXT",
    }
}

fn create_table_sql(table: Table) -> String {
    let columns: Vec<String> = table
        .fields()
        .iter()
        .map(|field| {
            let rule = table.rule(field).unwrap_or(FieldRule::Text);
            format!("\"{field}\" {} NOT NULL", column_type(rule))
        })
        .collect();
    format!(
        "DROP TABLE IF EXISTS {name};\nCREATE TABLE {name} ({columns});",
        name = table.name(),
        columns = columns.join(", ")
    )
}

fn insert_sql(table: Table) -> String {
    let columns: Vec<String> = table
        .fields()
        .iter()
        .map(|field| format!("\"{field}\""))
        .collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|index| format!("?{index}")).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.name(),
        columns.join(", "),
        placeholders.join(", ")
    )
}

/// Store a value with the column's affinity when it parses, as text
/// otherwise. Non-finite floats stay text since SQLite stores NaN as NULL.
fn sql_value(rule: FieldRule, raw: &str) -> Value {
    let typed = match rule {
        FieldRule::Integer => parse_int(raw).map(Value::Integer),
        FieldRule::Float { .. } => parse_float(raw)
            .filter(|number| number.is_finite())
            .map(Value::Real),
        FieldRule::Text => None,
    };
    typed.unwrap_or_else(|| Value::Text(raw.to_owned()))
}

impl RowSink for SqliteTableSink {
    type Error = SqliteSinkError;

    fn write(&mut self, row: Row<'_>) -> Result<(), Self::Error> {
        let table = row.table();
        let values = table
            .fields()
            .iter()
            .zip(row.values())
            .map(|(field, value)| sql_value(table.rule(field).unwrap_or(FieldRule::Text), &value));
        let mut statement = self
            .connection
            .prepare_cached(&insert_sql(table))
            .map_err(|source| SqliteSinkError::Insert { table, source })?;
        statement
            .execute(params_from_iter(values))
            .map(|_| ())
            .map_err(|source| SqliteSinkError::Insert { table, source })
    }

    fn finish(&mut self) -> Result<(), Self::Error> {
        if self.committed {
            return Ok(());
        }
        self.connection
            .execute_batch("COMMIT")
            .map_err(|source| SqliteSinkError::Commit { source })?;
        self.committed = true;
        info!("loaded tables into {}", self.path);
        Ok(())
    }
}
