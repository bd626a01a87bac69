//! Reshape elements into rows for the five output tables.
//!
//! Node and way attributes are copied verbatim. Tags are filtered and split:
//! keys containing problem characters are skipped, `namespace:key` keys are
//! split at the first colon, and two well-known tags get their values
//! cleaned (`name:en` is normalised, failing `addr:postcode` values drop the
//! tag).

use log::debug;
use serde::Serialize;
use thiserror::Error;

use crate::element::{Element, ElementKind, EntityField, Node, Tag, Way};
use crate::normalise::{NameRules, check_postcode, normalise_name};
use crate::validity::{NAME_EN_KEY, POSTCODE_KEY};

/// Tag type given to keys without a namespace.
pub const DEFAULT_TAG_TYPE: &str = "regular";

/// Characters that disqualify a tag key.
pub const PROBLEM_CHARS: [char; 19] = [
    '=', '+', '/', '&', '<', '>', ';', '\'', '"', '?', '%', '#', '$', '@', ',', '.', ' ', '\t',
    '\r',
];

const LINE_FEED: char = '\n';

/// Row of the `nodes` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodeRow {
    /// Node id.
    pub id: String,
    /// Latitude.
    pub lat: String,
    /// Longitude.
    pub lon: String,
    /// Last editor.
    pub user: String,
    /// Last editor's id.
    pub uid: String,
    /// Element version.
    pub version: String,
    /// Last changeset.
    pub changeset: String,
    /// Last modification time.
    pub timestamp: String,
}

/// Row of the `ways` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WayRow {
    /// Way id.
    pub id: String,
    /// Last editor.
    pub user: String,
    /// Last editor's id.
    pub uid: String,
    /// Element version.
    pub version: String,
    /// Last changeset.
    pub changeset: String,
    /// Last modification time.
    pub timestamp: String,
}

/// Row of the `nodes_tags` or `ways_tags` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagRow {
    /// Id of the owning element.
    pub id: String,
    /// Key without its namespace.
    pub key: String,
    /// Tag value, possibly cleaned.
    pub value: String,
    /// Namespace of the key, or the default tag type.
    #[serde(rename = "type")]
    pub tag_type: String,
}

/// Row of the `ways_nodes` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WayNodeRow {
    /// Way id.
    pub id: String,
    /// Referenced node id.
    pub node_id: String,
    /// Zero-based position of the reference within the way.
    pub position: usize,
}

/// Rows produced from one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapedRecord {
    /// Rows from a node.
    Node {
        /// The `nodes` row.
        node: NodeRow,
        /// The `nodes_tags` rows.
        tags: Vec<TagRow>,
    },
    /// Rows from a way.
    Way {
        /// The `ways` row.
        way: WayRow,
        /// The `ways_nodes` rows, by position.
        way_nodes: Vec<WayNodeRow>,
        /// The `ways_tags` rows.
        tags: Vec<TagRow>,
    },
}

impl ShapedRecord {
    /// Tag rows of the record.
    #[must_use]
    pub fn tags(&self) -> &[TagRow] {
        match self {
            Self::Node { tags, .. } | Self::Way { tags, .. } => tags,
        }
    }
}

/// Errors raised while shaping an element.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShapeError {
    /// The element has no `id` attribute.
    #[error("{element} element has no id")]
    MissingId {
        /// Kind of the offending element.
        element: ElementKind,
    },
    /// The element, or one of its children, lacks a required attribute.
    #[error("{element} {id} is missing the `{attribute}` attribute")]
    MissingAttribute {
        /// Kind of the offending element.
        element: ElementKind,
        /// Id of the offending element.
        id: String,
        /// Name of the missing attribute.
        attribute: &'static str,
    },
}

/// Turns elements into table rows.
///
/// # Examples
/// ```
/// use wrangle_core::{Element, ElementShaper, EntityAttributes, Node, Tag};
///
/// let node = Node {
///     attributes: EntityAttributes {
///         id: Some("1".into()),
///         user: Some("mapper".into()),
///         uid: Some("7".into()),
///         version: Some("1".into()),
///         changeset: Some("9".into()),
///         timestamp: Some("2015-01-01T00:00:00Z".into()),
///     },
///     lat: Some("39.9".into()),
///     lon: Some("116.4".into()),
///     tags: vec![Tag::new("name:en", "Fucheng Lu")],
/// };
///
/// let record = ElementShaper::default().shape(&Element::Node(node))?;
/// let tag = &record.tags()[0];
/// assert_eq!((tag.tag_type.as_str(), tag.key.as_str()), ("name", "en"));
/// assert_eq!(tag.value, "Fucheng Road");
/// # Ok::<(), wrangle_core::ShapeError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementShaper {
    rules: NameRules,
    default_tag_type: String,
}

impl Default for ElementShaper {
    fn default() -> Self {
        Self::new(NameRules::default())
    }
}

impl ElementShaper {
    /// Create a shaper using `rules` for `name:en` values.
    #[must_use]
    pub fn new(rules: NameRules) -> Self {
        Self {
            rules,
            default_tag_type: DEFAULT_TAG_TYPE.to_owned(),
        }
    }

    /// Replace the tag type given to keys without a namespace.
    #[must_use]
    pub fn with_default_tag_type(mut self, tag_type: impl Into<String>) -> Self {
        self.default_tag_type = tag_type.into();
        self
    }

    /// Name rules in use.
    #[must_use]
    pub const fn rules(&self) -> &NameRules {
        &self.rules
    }

    /// Shape one element.
    ///
    /// # Errors
    /// Returns [`ShapeError::MissingId`] when the element has no id and
    /// [`ShapeError::MissingAttribute`] when a declared attribute, a tag's
    /// `k`/`v`, or a node reference is missing.
    pub fn shape(&self, element: &Element) -> Result<ShapedRecord, ShapeError> {
        let kind = element.kind();
        let id = element.id().ok_or(ShapeError::MissingId { element: kind })?;
        let context = Context { element, kind, id };
        match element {
            Element::Node(node) => self.shape_node(context, node),
            Element::Way(way) => self.shape_way(context, way),
        }
    }

    fn shape_node(&self, context: Context<'_>, node: &Node) -> Result<ShapedRecord, ShapeError> {
        let row = NodeRow {
            id: context.id.to_owned(),
            lat: context.field(EntityField::Lat)?,
            lon: context.field(EntityField::Lon)?,
            user: context.field(EntityField::User)?,
            uid: context.field(EntityField::Uid)?,
            version: context.field(EntityField::Version)?,
            changeset: context.field(EntityField::Changeset)?,
            timestamp: context.field(EntityField::Timestamp)?,
        };
        Ok(ShapedRecord::Node {
            node: row,
            tags: self.shape_tags(context, &node.tags)?,
        })
    }

    fn shape_way(&self, context: Context<'_>, way: &Way) -> Result<ShapedRecord, ShapeError> {
        let row = WayRow {
            id: context.id.to_owned(),
            user: context.field(EntityField::User)?,
            uid: context.field(EntityField::Uid)?,
            version: context.field(EntityField::Version)?,
            changeset: context.field(EntityField::Changeset)?,
            timestamp: context.field(EntityField::Timestamp)?,
        };
        let way_nodes = way
            .node_refs
            .iter()
            .enumerate()
            .map(|(position, node_ref)| {
                Ok(WayNodeRow {
                    id: context.id.to_owned(),
                    node_id: context.require("ref", node_ref.node_id.as_deref())?,
                    position,
                })
            })
            .collect::<Result<Vec<_>, ShapeError>>()?;
        Ok(ShapedRecord::Way {
            way: row,
            way_nodes,
            tags: self.shape_tags(context, &way.tags)?,
        })
    }

    fn shape_tags(&self, context: Context<'_>, tags: &[Tag]) -> Result<Vec<TagRow>, ShapeError> {
        let mut rows = Vec::with_capacity(tags.len());
        for tag in tags {
            if let Some(row) = self.shape_tag(context, tag)? {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    fn shape_tag(&self, context: Context<'_>, tag: &Tag) -> Result<Option<TagRow>, ShapeError> {
        let raw_key = context.require_ref("k", tag.key.as_deref())?;
        if has_problem_chars(raw_key) {
            debug!("skipping tag {raw_key:?} on {} {}", context.kind, context.id);
            return Ok(None);
        }
        let raw_value = context.require_ref("v", tag.value.as_deref())?;
        let Some((namespace, key)) = split_namespace(raw_key) else {
            return Ok(Some(TagRow {
                id: context.id.to_owned(),
                key: raw_key.to_owned(),
                value: raw_value.to_owned(),
                tag_type: self.default_tag_type.clone(),
            }));
        };
        let value = if raw_key == NAME_EN_KEY {
            normalise_name(raw_value, &self.rules)
        } else if raw_key == POSTCODE_KEY && !check_postcode(raw_value) {
            debug!(
                "dropping postcode {raw_value:?} on {} {}",
                context.kind, context.id
            );
            return Ok(None);
        } else {
            raw_value.to_owned()
        };
        Ok(Some(TagRow {
            id: context.id.to_owned(),
            key: key.to_owned(),
            value,
            tag_type: namespace.to_owned(),
        }))
    }
}

/// Shape one element with the default rules.
///
/// # Errors
/// See [`ElementShaper::shape`].
pub fn shape(element: &Element) -> Result<ShapedRecord, ShapeError> {
    ElementShaper::default().shape(element)
}

/// Report whether a tag key contains any character from [`PROBLEM_CHARS`]
/// or a line feed.
#[must_use]
pub fn has_problem_chars(key: &str) -> bool {
    key.contains(PROBLEM_CHARS) || key.contains(LINE_FEED)
}

/// Split a `namespace:key` tag key at its first colon.
///
/// The namespace must be one or more lower-case ASCII letters or
/// underscores, and the key must start with one.
///
/// # Examples
/// ```
/// use wrangle_core::split_namespace;
///
/// assert_eq!(split_namespace("addr:street"), Some(("addr", "street")));
/// assert_eq!(split_namespace("name:zh_pinyin"), Some(("name", "zh_pinyin")));
/// assert_eq!(split_namespace("addr:street:name"), Some(("addr", "street:name")));
/// assert_eq!(split_namespace("Name:en"), None);
/// assert_eq!(split_namespace("highway"), None);
/// ```
#[must_use]
pub fn split_namespace(key: &str) -> Option<(&str, &str)> {
    let (namespace, rest) = key.split_once(':')?;
    let lower = |c: char| c.is_ascii_lowercase() || c == '_';
    (!namespace.is_empty() && namespace.chars().all(lower) && rest.starts_with(lower))
        .then_some((namespace, rest))
}

#[derive(Debug, Clone, Copy)]
struct Context<'a> {
    element: &'a Element,
    kind: ElementKind,
    id: &'a str,
}

impl Context<'_> {
    fn missing(self, attribute: &'static str) -> ShapeError {
        ShapeError::MissingAttribute {
            element: self.kind,
            id: self.id.to_owned(),
            attribute,
        }
    }

    fn require_ref<'v>(
        self,
        attribute: &'static str,
        value: Option<&'v str>,
    ) -> Result<&'v str, ShapeError> {
        value.ok_or_else(|| self.missing(attribute))
    }

    fn require(self, attribute: &'static str, value: Option<&str>) -> Result<String, ShapeError> {
        self.require_ref(attribute, value).map(str::to_owned)
    }

    fn field(self, field: EntityField) -> Result<String, ShapeError> {
        self.require(field.name(), self.element.field(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{EntityAttributes, NodeRef};
    use rstest::{fixture, rstest};

    fn attributes(id: &str) -> EntityAttributes {
        EntityAttributes {
            id: Some(id.into()),
            user: Some("mapper".into()),
            uid: Some("42".into()),
            version: Some("2".into()),
            changeset: Some("777".into()),
            timestamp: Some("2016-01-01T00:00:00Z".into()),
        }
    }

    #[fixture]
    fn shaper() -> ElementShaper {
        ElementShaper::default()
    }

    fn node_with(tags: Vec<Tag>) -> Element {
        Element::Node(Node {
            attributes: attributes("1"),
            lat: Some("39.90".into()),
            lon: Some("116.40".into()),
            tags,
        })
    }

    fn tag_rows(shaper: &ElementShaper, tags: Vec<Tag>) -> Vec<TagRow> {
        shaper
            .shape(&node_with(tags))
            .expect("node shapes")
            .tags()
            .to_vec()
    }

    #[rstest]
    fn copies_node_attributes(shaper: ElementShaper) {
        let record = shaper.shape(&node_with(Vec::new())).expect("node shapes");
        let ShapedRecord::Node { node, tags } = record else {
            panic!("expected a node record");
        };
        assert_eq!(node.id, "1");
        assert_eq!(node.lat, "39.90");
        assert_eq!(node.changeset, "777");
        assert!(tags.is_empty());
    }

    #[rstest]
    #[case("amenity", "cafe", Some(("amenity", "cafe", "regular")))]
    #[case("addr:street", "Wangfujing", Some(("street", "Wangfujing", "addr")))]
    #[case("addr:street:name", "Wangfujing", Some(("street:name", "Wangfujing", "addr")))]
    #[case("Name:en", "X", Some(("Name:en", "X", "regular")))]
    #[case("name:en", "Fucheng Lu", Some(("en", "Fucheng Road", "name")))]
    #[case("addr:postcode", "100101", Some(("postcode", "100101", "addr")))]
    #[case("addr:postcode", "99999", None)]
    #[case("fixme.note", "x", None)]
    #[case("name zh", "x", None)]
    #[case("line\nbreak", "x", None)]
    fn shapes_tags(
        shaper: ElementShaper,
        #[case] key: &str,
        #[case] value: &str,
        #[case] expected: Option<(&str, &str, &str)>,
    ) {
        let rows = tag_rows(&shaper, vec![Tag::new(key, value)]);
        let actual = rows
            .first()
            .map(|row| (row.key.as_str(), row.value.as_str(), row.tag_type.as_str()));
        assert_eq!(actual, expected);
        assert!(rows.iter().all(|row| row.id == "1"));
    }

    #[rstest]
    fn problem_chars_anywhere_in_the_key_skip_the_tag(shaper: ElementShaper) {
        let rows = tag_rows(
            &shaper,
            vec![Tag::new("name", "Ok"), Tag::new("addr:street=old", "X")],
        );
        assert_eq!(rows.len(), 1);
    }

    #[rstest]
    fn way_nodes_follow_document_order(shaper: ElementShaper) {
        let way = Element::Way(Way {
            attributes: attributes("10"),
            tags: vec![Tag::new("highway", "primary")],
            node_refs: vec![NodeRef::new("5"), NodeRef::new("3"), NodeRef::new("5")],
        });
        let ShapedRecord::Way { way, way_nodes, tags } = shaper.shape(&way).expect("way shapes")
        else {
            panic!("expected a way record");
        };
        assert_eq!(way.id, "10");
        assert_eq!(tags.len(), 1);
        let positions: Vec<_> = way_nodes
            .iter()
            .map(|row| (row.node_id.as_str(), row.position))
            .collect();
        assert_eq!(positions, [("5", 0), ("3", 1), ("5", 2)]);
    }

    #[rstest]
    fn missing_id_is_fatal(shaper: ElementShaper) {
        let element = Element::Way(Way::default());
        assert_eq!(
            shaper.shape(&element),
            Err(ShapeError::MissingId {
                element: ElementKind::Way
            })
        );
    }

    #[rstest]
    fn missing_attributes_are_fatal(shaper: ElementShaper) {
        let mut node = Node {
            attributes: attributes("3"),
            lat: Some("1".into()),
            lon: None,
            tags: Vec::new(),
        };
        assert_eq!(
            shaper.shape(&Element::Node(node.clone())),
            Err(ShapeError::MissingAttribute {
                element: ElementKind::Node,
                id: "3".into(),
                attribute: "lon",
            })
        );

        node.lon = Some("2".into());
        node.tags.push(Tag {
            key: Some("note".into()),
            value: None,
        });
        let error = shaper.shape(&Element::Node(node)).expect_err("tag without value");
        assert_eq!(error.to_string(), "node 3 is missing the `v` attribute");
    }

    #[rstest]
    #[case(EntityField::User)]
    #[case(EntityField::Uid)]
    #[case(EntityField::Version)]
    #[case(EntityField::Changeset)]
    #[case(EntityField::Timestamp)]
    fn each_missing_attribute_is_named(shaper: ElementShaper, #[case] field: EntityField) {
        let mut way = Way {
            attributes: attributes("7"),
            ..Way::default()
        };
        if let Some(slot) = way.attributes.slot_mut(field) {
            *slot = None;
        }
        assert_eq!(
            shaper.shape(&Element::Way(way)),
            Err(ShapeError::MissingAttribute {
                element: ElementKind::Way,
                id: "7".into(),
                attribute: field.name(),
            })
        );
    }

    #[rstest]
    fn custom_rules_and_tag_type() {
        let shaper = ElementShaper::new([("Jie", "Street")].into_iter().collect())
            .with_default_tag_type("plain");
        let rows = tag_rows(
            &shaper,
            vec![Tag::new("name:en", "Ping'an Jie"), Tag::new("highway", "x")],
        );
        assert_eq!(rows[0].value, "Ping'an Street");
        assert_eq!(rows[1].tag_type, "plain");
    }
}
