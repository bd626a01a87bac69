//! Element builders shared by unit and behaviour tests.

use crate::element::{Element, EntityAttributes, Node, NodeRef, Tag, Way};

/// Fully populated attributes for an element with the given id.
#[must_use]
pub fn attributes(id: &str) -> EntityAttributes {
    EntityAttributes {
        id: Some(id.to_owned()),
        user: Some("mapper".to_owned()),
        uid: Some("42".to_owned()),
        version: Some("1".to_owned()),
        changeset: Some("1000".to_owned()),
        timestamp: Some("2016-01-01T00:00:00Z".to_owned()),
    }
}

/// Builds a node with every declared attribute set.
#[derive(Debug, Clone)]
pub struct NodeBuilder {
    node: Node,
}

impl NodeBuilder {
    /// Start a node at latitude 39.9, longitude 116.4.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            node: Node {
                attributes: attributes(id),
                lat: Some("39.9".to_owned()),
                lon: Some("116.4".to_owned()),
                tags: Vec::new(),
            },
        }
    }

    /// Set the coordinates.
    #[must_use]
    pub fn at(mut self, lat: &str, lon: &str) -> Self {
        self.node.lat = Some(lat.to_owned());
        self.node.lon = Some(lon.to_owned());
        self
    }

    /// Set the timestamp.
    #[must_use]
    pub fn timestamp(mut self, timestamp: &str) -> Self {
        self.node.attributes.timestamp = Some(timestamp.to_owned());
        self
    }

    /// Append a tag.
    #[must_use]
    pub fn tag(mut self, key: &str, value: &str) -> Self {
        self.node.tags.push(Tag::new(key, value));
        self
    }

    /// Finish the node.
    #[must_use]
    pub fn build(self) -> Element {
        Element::Node(self.node)
    }
}

/// Builds a way with every declared attribute set.
#[derive(Debug, Clone)]
pub struct WayBuilder {
    way: Way,
}

impl WayBuilder {
    /// Start a way without tags or node references.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            way: Way {
                attributes: attributes(id),
                tags: Vec::new(),
                node_refs: Vec::new(),
            },
        }
    }

    /// Set the timestamp.
    #[must_use]
    pub fn timestamp(mut self, timestamp: &str) -> Self {
        self.way.attributes.timestamp = Some(timestamp.to_owned());
        self
    }

    /// Append a tag.
    #[must_use]
    pub fn tag(mut self, key: &str, value: &str) -> Self {
        self.way.tags.push(Tag::new(key, value));
        self
    }

    /// Append node references.
    #[must_use]
    pub fn nodes<'a>(mut self, ids: impl IntoIterator<Item = &'a str>) -> Self {
        self.way.node_refs.extend(ids.into_iter().map(NodeRef::new));
        self
    }

    /// Finish the way.
    #[must_use]
    pub fn build(self) -> Element {
        Element::Way(self.way)
    }
}
