//! Element model for OpenStreetMap map exports.
//!
//! An [`Element`] is either a node (a point with coordinates) or a way (an
//! ordered list of node references). Attribute values are kept exactly as the
//! element source read them: a missing attribute is `None`, an empty one is
//! `Some("")`. Nothing here interprets the values; that is left to the
//! audit and shaping passes.

use std::fmt;

/// Scalar attributes declared on node and way elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityField {
    /// Element identifier.
    Id,
    /// Latitude in decimal degrees (nodes only).
    Lat,
    /// Longitude in decimal degrees (nodes only).
    Lon,
    /// Display name of the last editor.
    User,
    /// Numeric id of the last editor.
    Uid,
    /// Element version.
    Version,
    /// Changeset that last touched the element.
    Changeset,
    /// Last modification time.
    Timestamp,
}

/// Declared attribute list for nodes, in output column order.
pub const NODE_FIELDS: [EntityField; 8] = [
    EntityField::Id,
    EntityField::Lat,
    EntityField::Lon,
    EntityField::User,
    EntityField::Uid,
    EntityField::Version,
    EntityField::Changeset,
    EntityField::Timestamp,
];

/// Declared attribute list for ways, in output column order.
pub const WAY_FIELDS: [EntityField; 6] = [
    EntityField::Id,
    EntityField::User,
    EntityField::Uid,
    EntityField::Version,
    EntityField::Changeset,
    EntityField::Timestamp,
];

impl EntityField {
    /// XML attribute name of the field.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Lat => "lat",
            Self::Lon => "lon",
            Self::User => "user",
            Self::Uid => "uid",
            Self::Version => "version",
            Self::Changeset => "changeset",
            Self::Timestamp => "timestamp",
        }
    }

    /// Look a field up by its XML attribute name.
    ///
    /// # Examples
    /// ```
    /// use wrangle_core::EntityField;
    ///
    /// assert_eq!(EntityField::from_name("uid"), Some(EntityField::Uid));
    /// assert_eq!(EntityField::from_name("visible"), None);
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        NODE_FIELDS.into_iter().find(|field| field.name() == name)
    }
}

impl fmt::Display for EntityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Attributes shared by nodes and ways.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityAttributes {
    /// Raw `id` attribute.
    pub id: Option<String>,
    /// Raw `user` attribute.
    pub user: Option<String>,
    /// Raw `uid` attribute.
    pub uid: Option<String>,
    /// Raw `version` attribute.
    pub version: Option<String>,
    /// Raw `changeset` attribute.
    pub changeset: Option<String>,
    /// Raw `timestamp` attribute.
    pub timestamp: Option<String>,
}

/// A key/value tag attached to a node or way.
///
/// The key may carry a namespace using the `namespace:key` convention.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag {
    /// Raw `k` attribute.
    pub key: Option<String>,
    /// Raw `v` attribute.
    pub value: Option<String>,
}

impl Tag {
    /// Build a tag with both attributes present.
    ///
    /// # Examples
    /// ```
    /// use wrangle_core::Tag;
    ///
    /// let tag = Tag::new("addr:postcode", "100101");
    /// assert_eq!(tag.key.as_deref(), Some("addr:postcode"));
    /// ```
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            value: Some(value.into()),
        }
    }

    /// Report whether the tag's key is exactly `key`.
    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.key.as_deref() == Some(key)
    }
}

/// Reference from a way to one of its nodes (`<nd ref="..."/>`).
///
/// The position within the way is implied by the reference's index in
/// [`Way::node_refs`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeRef {
    /// Raw `ref` attribute.
    pub node_id: Option<String>,
}

impl NodeRef {
    /// Build a reference to the given node id.
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: Some(node_id.into()),
        }
    }
}

/// A point entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    /// Attributes shared with ways.
    pub attributes: EntityAttributes,
    /// Raw `lat` attribute.
    pub lat: Option<String>,
    /// Raw `lon` attribute.
    pub lon: Option<String>,
    /// Child tags in document order.
    pub tags: Vec<Tag>,
}

/// A way entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Way {
    /// Element attributes.
    pub attributes: EntityAttributes,
    /// Child tags in document order.
    pub tags: Vec<Tag>,
    /// Child node references in document order.
    pub node_refs: Vec<NodeRef>,
}

/// Kind of an [`Element`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// A point entity.
    Node,
    /// A way entity.
    Way,
}

impl ElementKind {
    /// XML element name for the kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
        }
    }

    /// Declared attribute list for the kind.
    #[must_use]
    pub const fn fields(self) -> &'static [EntityField] {
        match self {
            Self::Node => &NODE_FIELDS,
            Self::Way => &WAY_FIELDS,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One top-level entity read from the map export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    /// A point entity.
    Node(Node),
    /// A way entity.
    Way(Way),
}

impl Element {
    /// Kind of the element.
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        match self {
            Self::Node(_) => ElementKind::Node,
            Self::Way(_) => ElementKind::Way,
        }
    }

    /// Shared attributes of the element.
    #[must_use]
    pub const fn attributes(&self) -> &EntityAttributes {
        match self {
            Self::Node(node) => &node.attributes,
            Self::Way(way) => &way.attributes,
        }
    }

    /// Raw `id` attribute, if present.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attributes().id.as_deref()
    }

    /// Child tags in document order.
    #[must_use]
    pub fn tags(&self) -> &[Tag] {
        match self {
            Self::Node(node) => &node.tags,
            Self::Way(way) => &way.tags,
        }
    }

    /// Raw value of a declared attribute.
    ///
    /// Returns `None` when the attribute is missing or does not apply to the
    /// element's kind (`lat`/`lon` on a way).
    ///
    /// # Examples
    /// ```
    /// use wrangle_core::{Element, EntityField, Node};
    ///
    /// let mut node = Node::default();
    /// node.lat = Some("39.9".into());
    /// let element = Element::Node(node);
    ///
    /// assert_eq!(element.field(EntityField::Lat), Some("39.9"));
    /// assert_eq!(element.field(EntityField::Id), None);
    /// ```
    #[must_use]
    pub fn field(&self, field: EntityField) -> Option<&str> {
        match (self, field) {
            (Self::Node(node), EntityField::Lat) => node.lat.as_deref(),
            (Self::Node(node), EntityField::Lon) => node.lon.as_deref(),
            _ => self.attributes().get(field),
        }
    }
}

impl EntityAttributes {
    /// Value of a shared attribute; `None` for `lat`/`lon` or when absent.
    #[must_use]
    pub fn get(&self, field: EntityField) -> Option<&str> {
        match field {
            EntityField::Id => self.id.as_deref(),
            EntityField::User => self.user.as_deref(),
            EntityField::Uid => self.uid.as_deref(),
            EntityField::Version => self.version.as_deref(),
            EntityField::Changeset => self.changeset.as_deref(),
            EntityField::Timestamp => self.timestamp.as_deref(),
            EntityField::Lat | EntityField::Lon => None,
        }
    }

    /// Mutable slot for a shared attribute; `None` for `lat`/`lon`.
    pub fn slot_mut(&mut self, field: EntityField) -> Option<&mut Option<String>> {
        match field {
            EntityField::Id => Some(&mut self.id),
            EntityField::User => Some(&mut self.user),
            EntityField::Uid => Some(&mut self.uid),
            EntityField::Version => Some(&mut self.version),
            EntityField::Changeset => Some(&mut self.changeset),
            EntityField::Timestamp => Some(&mut self.timestamp),
            EntityField::Lat | EntityField::Lon => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn way_has_no_coordinates() {
        let way = Element::Way(Way {
            attributes: EntityAttributes {
                id: Some("7".into()),
                ..EntityAttributes::default()
            },
            ..Way::default()
        });
        assert_eq!(way.field(EntityField::Lat), None);
        assert_eq!(way.field(EntityField::Lon), None);
        assert_eq!(way.field(EntityField::Id), Some("7"));
    }

    #[rstest]
    #[case(ElementKind::Node, 8)]
    #[case(ElementKind::Way, 6)]
    fn declared_field_lists(#[case] kind: ElementKind, #[case] expected: usize) {
        assert_eq!(kind.fields().len(), expected);
        assert_eq!(kind.fields().first(), Some(&EntityField::Id));
    }

    #[rstest]
    fn field_names_round_trip() {
        for field in NODE_FIELDS {
            assert_eq!(EntityField::from_name(field.name()), Some(field));
        }
    }

    #[rstest]
    fn coordinate_slots_are_node_only() {
        let mut attributes = EntityAttributes::default();
        assert!(attributes.slot_mut(EntityField::Lat).is_none());
        if let Some(slot) = attributes.slot_mut(EntityField::User) {
            *slot = Some("mapper".into());
        }
        assert_eq!(attributes.user.as_deref(), Some("mapper"));
        assert_eq!(attributes.get(EntityField::User), Some("mapper"));
        assert_eq!(attributes.get(EntityField::Lon), None);
    }
}
