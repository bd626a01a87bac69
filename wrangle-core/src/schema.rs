//! Output tables and the constraints their rows must satisfy.

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::detect::{parse_float, parse_int};
use crate::shape::{NodeRow, ShapedRecord, TagRow, WayNodeRow, WayRow};

/// One of the five output tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    /// `nodes`
    Nodes,
    /// `nodes_tags`
    NodesTags,
    /// `ways`
    Ways,
    /// `ways_nodes`
    WaysNodes,
    /// `ways_tags`
    WaysTags,
}

const NODE_COLUMNS: [&str; 8] = [
    "id",
    "lat",
    "lon",
    "user",
    "uid",
    "version",
    "changeset",
    "timestamp",
];
const WAY_COLUMNS: [&str; 6] = ["id", "user", "uid", "version", "changeset", "timestamp"];
const TAG_COLUMNS: [&str; 4] = ["id", "key", "value", "type"];
const WAY_NODE_COLUMNS: [&str; 3] = ["id", "node_id", "position"];

impl Table {
    /// Every table, in output order.
    pub const ALL: [Self; 5] = [
        Self::Nodes,
        Self::NodesTags,
        Self::Ways,
        Self::WaysNodes,
        Self::WaysTags,
    ];

    /// Output name of the table.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nodes => "nodes",
            Self::NodesTags => "nodes_tags",
            Self::Ways => "ways",
            Self::WaysNodes => "ways_nodes",
            Self::WaysTags => "ways_tags",
        }
    }

    /// Column names in output order.
    #[must_use]
    pub const fn fields(self) -> &'static [&'static str] {
        match self {
            Self::Nodes => &NODE_COLUMNS,
            Self::NodesTags | Self::WaysTags => &TAG_COLUMNS,
            Self::Ways => &WAY_COLUMNS,
            Self::WaysNodes => &WAY_NODE_COLUMNS,
        }
    }

    /// Constraint applied to `field`, or `None` for an unknown column.
    #[must_use]
    pub fn rule(self, field: &str) -> Option<FieldRule> {
        if !self.fields().contains(&field) {
            return None;
        }
        Some(match field {
            "id" | "uid" | "changeset" | "node_id" | "position" => FieldRule::Integer,
            "lat" => FieldRule::Float {
                min: -90.0,
                max: 90.0,
            },
            "lon" => FieldRule::Float {
                min: -180.0,
                max: 180.0,
            },
            _ => FieldRule::Text,
        })
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Constraint on a single column. Every column is required.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldRule {
    /// A base-10 integer that fits in 64 bits.
    Integer,
    /// A finite float within inclusive bounds.
    Float {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
    /// Any text, the empty string included.
    Text,
}

/// Why a value failed its [`FieldRule`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ViolationReason {
    /// A typed value is empty.
    #[error("value is required")]
    Empty,
    /// The value is not an integer.
    #[error("expected an integer")]
    NotInteger,
    /// The value is not a number.
    #[error("expected a number")]
    NotFloat,
    /// The value is outside its bounds.
    #[error("expected a value between {min} and {max}")]
    OutOfRange {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
}

/// A row value that failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{table}.{field} = {value:?}: {reason}")]
pub struct SchemaViolation {
    /// Table of the offending row.
    pub table: Table,
    /// Offending column.
    pub field: &'static str,
    /// Offending value.
    pub value: String,
    /// Failed constraint.
    pub reason: ViolationReason,
}

impl FieldRule {
    /// Check one value against the rule.
    ///
    /// # Errors
    /// Returns the reason the value was rejected.
    pub fn check(self, value: &str) -> Result<(), ViolationReason> {
        if value.is_empty() && !matches!(self, Self::Text) {
            return Err(ViolationReason::Empty);
        }
        match self {
            Self::Integer => parse_int(value).map(drop).ok_or(ViolationReason::NotInteger),
            Self::Float { min, max } => {
                let number = parse_float(value)
                    .filter(|number| number.is_finite())
                    .ok_or(ViolationReason::NotFloat)?;
                if (min..=max).contains(&number) {
                    Ok(())
                } else {
                    Err(ViolationReason::OutOfRange { min, max })
                }
            }
            Self::Text => Ok(()),
        }
    }
}

/// A borrowed row addressed to one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row<'a> {
    /// Row of `nodes`.
    Node(&'a NodeRow),
    /// Row of `nodes_tags`.
    NodeTag(&'a TagRow),
    /// Row of `ways`.
    Way(&'a WayRow),
    /// Row of `ways_nodes`.
    WayNode(&'a WayNodeRow),
    /// Row of `ways_tags`.
    WayTag(&'a TagRow),
}

impl<'a> Row<'a> {
    /// Table the row belongs to.
    #[must_use]
    pub const fn table(self) -> Table {
        match self {
            Self::Node(_) => Table::Nodes,
            Self::NodeTag(_) => Table::NodesTags,
            Self::Way(_) => Table::Ways,
            Self::WayNode(_) => Table::WaysNodes,
            Self::WayTag(_) => Table::WaysTags,
        }
    }

    /// Column values as text, aligned with [`Table::fields`].
    #[must_use]
    pub fn values(self) -> Vec<Cow<'a, str>> {
        let borrowed = |value: &'a String| Cow::Borrowed(value.as_str());
        match self {
            Self::Node(row) => vec![
                borrowed(&row.id),
                borrowed(&row.lat),
                borrowed(&row.lon),
                borrowed(&row.user),
                borrowed(&row.uid),
                borrowed(&row.version),
                borrowed(&row.changeset),
                borrowed(&row.timestamp),
            ],
            Self::Way(row) => vec![
                borrowed(&row.id),
                borrowed(&row.user),
                borrowed(&row.uid),
                borrowed(&row.version),
                borrowed(&row.changeset),
                borrowed(&row.timestamp),
            ],
            Self::NodeTag(row) | Self::WayTag(row) => vec![
                borrowed(&row.id),
                borrowed(&row.key),
                borrowed(&row.value),
                borrowed(&row.tag_type),
            ],
            Self::WayNode(row) => vec![
                borrowed(&row.id),
                borrowed(&row.node_id),
                Cow::Owned(row.position.to_string()),
            ],
        }
    }

    /// Rows of a shaped record, in write order: the entity row, then way
    /// nodes, then tags.
    #[must_use]
    pub fn from_record(record: &'a ShapedRecord) -> Vec<Self> {
        match record {
            ShapedRecord::Node { node, tags } => std::iter::once(Self::Node(node))
                .chain(tags.iter().map(Self::NodeTag))
                .collect(),
            ShapedRecord::Way {
                way,
                way_nodes,
                tags,
            } => std::iter::once(Self::Way(way))
                .chain(way_nodes.iter().map(Self::WayNode))
                .chain(tags.iter().map(Self::WayTag))
                .collect(),
        }
    }
}

/// Validate one row against its table's constraints.
///
/// # Errors
/// Returns the first column, in output order, that breaks its rule.
///
/// # Examples
/// ```
/// use wrangle_core::{Row, Table, TagRow, ViolationReason, validate_row};
///
/// let mut tag = TagRow {
///     id: "1".into(),
///     key: "highway".into(),
///     value: "primary".into(),
///     tag_type: "regular".into(),
/// };
/// assert!(validate_row(Row::WayTag(&tag)).is_ok());
///
/// tag.id = "one".into();
/// let violation = validate_row(Row::WayTag(&tag)).unwrap_err();
/// assert_eq!(violation.table, Table::WaysTags);
/// assert_eq!(violation.reason, ViolationReason::NotInteger);
/// ```
pub fn validate_row(row: Row<'_>) -> Result<(), SchemaViolation> {
    let table = row.table();
    for (field, value) in table.fields().iter().zip(row.values()) {
        let rule = table.rule(field).unwrap_or(FieldRule::Text);
        rule.check(&value).map_err(|reason| SchemaViolation {
            table,
            field,
            value: value.into_owned(),
            reason,
        })?;
    }
    Ok(())
}

/// Validate every row of a shaped record.
///
/// # Errors
/// Returns the first violation in write order.
pub fn validate_record(record: &ShapedRecord) -> Result<(), SchemaViolation> {
    Row::from_record(record).into_iter().try_for_each(validate_row)
}
