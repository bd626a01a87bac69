//! Single-pass audit of a map export.
//!
//! The [`AuditEngine`] owns every accumulator touched during the pass: the
//! per-field type sets and the [`ValidityTracker`]. Feed it elements in
//! document order and call [`AuditEngine::finish`] once the source is
//! exhausted. [`audit`] does exactly that for an element iterator.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use log::info;
use serde::Serialize;

use crate::detect::{TypeTag, detect_optional};
use crate::element::{Element, Node, Way};
use crate::validity::{FieldValidity, ValidityTracker};

/// Attribute name of a tag's key.
pub const TAG_KEY_FIELD: &str = "k";
/// Attribute name of a tag's value.
pub const TAG_VALUE_FIELD: &str = "v";
/// Attribute name of a way's node reference.
pub const NODE_REF_FIELD: &str = "ref";

/// Distinct inferred types seen for one field.
pub type TypeSet = BTreeSet<TypeTag>;

/// Groups of fields the audit keeps apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordClass {
    /// Node attributes.
    Node,
    /// Attributes of tags attached to nodes.
    NodeTags,
    /// Way attributes.
    Way,
    /// Attributes of tags attached to ways.
    WayTags,
    /// Attributes of a way's node references.
    WayNodes,
}

impl RecordClass {
    /// Every class, in report order.
    pub const ALL: [Self; 5] = [
        Self::Node,
        Self::NodeTags,
        Self::Way,
        Self::WayTags,
        Self::WayNodes,
    ];

    /// Snake-case name used in reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::NodeTags => "node_tags",
            Self::Way => "way",
            Self::WayTags => "way_tags",
            Self::WayNodes => "way_nodes",
        }
    }
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Type sets per record class and field.
///
/// Every class is present, even when the document held none of its records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldTypes(BTreeMap<RecordClass, BTreeMap<&'static str, TypeSet>>);

impl Default for FieldTypes {
    fn default() -> Self {
        Self(
            RecordClass::ALL
                .into_iter()
                .map(|class| (class, BTreeMap::new()))
                .collect(),
        )
    }
}

impl FieldTypes {
    /// Record the type of one field value.
    pub fn record(&mut self, class: RecordClass, field: &'static str, raw: Option<&str>) {
        self.0
            .entry(class)
            .or_default()
            .entry(field)
            .or_default()
            .insert(detect_optional(raw));
    }

    /// Types observed for `field` in `class`.
    #[must_use]
    pub fn get(&self, class: RecordClass, field: &str) -> Option<&TypeSet> {
        self.0.get(&class).and_then(|fields| fields.get(field))
    }

    /// Fields observed for `class`, with their type sets.
    pub fn fields(&self, class: RecordClass) -> impl Iterator<Item = (&'static str, &TypeSet)> {
        self.0
            .get(&class)
            .into_iter()
            .flatten()
            .map(|(field, types)| (*field, types))
    }
}

/// Outcome of an audit pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditReport {
    /// Number of nodes seen.
    pub nodes: u64,
    /// Number of ways seen.
    pub ways: u64,
    /// Inferred types per class and field.
    pub field_types: FieldTypes,
    /// Ranges and anomalies per class.
    pub field_validity: FieldValidity,
}

/// Accumulates type and validity information over a stream of elements.
///
/// # Examples
/// ```
/// use wrangle_core::{AuditEngine, Element, Node, RecordClass, TypeTag};
///
/// let mut node = Node::default();
/// node.attributes.id = Some("1".into());
/// node.lat = Some("39.9".into());
///
/// let mut engine = AuditEngine::new();
/// engine.observe(&Element::Node(node));
/// let report = engine.finish();
///
/// let lat = report.field_types.get(RecordClass::Node, "lat").unwrap();
/// assert!(lat.contains(&TypeTag::Float));
/// ```
#[derive(Debug, Clone, Default)]
pub struct AuditEngine {
    field_types: FieldTypes,
    validity: ValidityTracker,
    nodes: u64,
    ways: u64,
}

impl AuditEngine {
    /// Create an engine with fresh accumulators.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine around a preconfigured validity tracker.
    #[must_use]
    pub fn with_validity(validity: ValidityTracker) -> Self {
        Self {
            validity,
            ..Self::default()
        }
    }

    /// Fold one element into the accumulators.
    pub fn observe(&mut self, element: &Element) {
        self.record_attributes(element);
        match element {
            Element::Node(node) => self.observe_node(node),
            Element::Way(way) => self.observe_way(way),
        }
    }

    fn record_attributes(&mut self, element: &Element) {
        let class = match element {
            Element::Node(_) => RecordClass::Node,
            Element::Way(_) => RecordClass::Way,
        };
        for field in element.kind().fields() {
            self.field_types
                .record(class, field.name(), element.field(*field));
        }
    }

    fn observe_node(&mut self, node: &Node) {
        self.nodes += 1;
        self.validity.observe_node(node);
        for tag in &node.tags {
            self.field_types
                .record(RecordClass::NodeTags, TAG_KEY_FIELD, tag.key.as_deref());
            self.field_types
                .record(RecordClass::NodeTags, TAG_VALUE_FIELD, tag.value.as_deref());
            self.validity.observe_node_tag(tag);
        }
    }

    fn observe_way(&mut self, way: &Way) {
        self.ways += 1;
        self.validity.observe_way(way);
        for tag in &way.tags {
            self.field_types
                .record(RecordClass::WayTags, TAG_KEY_FIELD, tag.key.as_deref());
            self.field_types
                .record(RecordClass::WayTags, TAG_VALUE_FIELD, tag.value.as_deref());
            self.validity.observe_way_tag(tag);
        }
        for node_ref in &way.node_refs {
            self.field_types
                .record(RecordClass::WayNodes, NODE_REF_FIELD, node_ref.node_id.as_deref());
        }
    }

    /// Close the pass and produce the report.
    #[must_use]
    pub fn finish(self) -> AuditReport {
        AuditReport {
            nodes: self.nodes,
            ways: self.ways,
            field_types: self.field_types,
            field_validity: self.validity.report(),
        }
    }
}

/// Audit every element produced by `elements`.
///
/// Data problems never abort the pass; only an error from the element source
/// does, and it is returned unchanged.
///
/// # Examples
/// ```
/// use std::convert::Infallible;
/// use wrangle_core::{Element, Node, Tag, audit};
///
/// let mut node = Node::default();
/// node.attributes.id = Some("1".into());
/// node.tags.push(Tag::new("addr:postcode", "99999"));
///
/// let report = audit([Ok::<_, Infallible>(Element::Node(node))])?;
/// let anomalies = report.field_validity.node_tags.unwrap().postcode;
/// assert!(anomalies.contains("99999"));
/// # Ok::<(), Infallible>(())
/// ```
pub fn audit<I, E>(elements: I) -> Result<AuditReport, E>
where
    I: IntoIterator<Item = Result<Element, E>>,
{
    let mut engine = AuditEngine::new();
    for element in elements {
        engine.observe(&element?);
    }
    let report = engine.finish();
    info!(
        "audited {} nodes and {} ways",
        report.nodes, report.ways
    );
    Ok(report)
}
