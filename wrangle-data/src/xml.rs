//! Streaming reader for OSM XML exports.
//!
//! Only `node` and `way` elements are assembled. Everything else at the top
//! level (`bounds`, `relation`, `changeset` and friends) is skipped along
//! with its subtree, and unknown children of nodes and ways are ignored.

use std::io::BufRead;

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use quick_xml::Reader;
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use thiserror::Error;
use wrangle_core::{Element, ElementKind, EntityField, Node, NodeRef, Tag, Way};

const NODE: &[u8] = b"node";
const WAY: &[u8] = b"way";
const TAG: &[u8] = b"tag";
const ND: &[u8] = b"nd";
const OSM: &[u8] = b"osm";

/// Errors raised while reading OSM XML.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OsmXmlError {
    /// The input file could not be opened.
    #[error("failed to open OSM XML file {path}")]
    Open {
        /// Path that failed to open.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The document is not well-formed XML.
    #[error("malformed OSM XML near byte {position}")]
    Parse {
        /// Byte offset of the failure.
        position: u64,
        /// Error reported by the XML parser.
        #[source]
        source: quick_xml::Error,
    },
    /// The document ended inside an element.
    #[error("OSM XML ended inside {element} {id:?}")]
    UnexpectedEof {
        /// Kind of the unterminated element.
        element: ElementKind,
        /// Raw id of the unterminated element, when it had one.
        id: Option<String>,
    },
}

/// Iterator over the nodes and ways of an OSM XML document.
///
/// # Examples
/// ```
/// use wrangle_data::OsmXmlReader;
///
/// let xml = r#"<osm>
///   <node id="1" lat="39.9" lon="116.4"><tag k="amenity" v="cafe"/></node>
///   <relation id="5"><member type="node" ref="1"/></relation>
/// </osm>"#;
///
/// let elements: Vec<_> = OsmXmlReader::new(xml.as_bytes()).collect::<Result<_, _>>()?;
/// assert_eq!(elements.len(), 1);
/// assert_eq!(elements[0].tags()[0].value.as_deref(), Some("cafe"));
/// # Ok::<(), wrangle_data::OsmXmlError>(())
/// ```
#[derive(Debug)]
pub struct OsmXmlReader<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    skip_buf: Vec<u8>,
    finished: bool,
}

impl<R: BufRead> OsmXmlReader<R> {
    /// Wrap a buffered source.
    pub fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.config_mut().trim_text(true);
        Self {
            reader,
            buf: Vec::new(),
            skip_buf: Vec::new(),
            finished: false,
        }
    }

    fn next_event(&mut self) -> Result<(Event<'_>, Decoder, u64), OsmXmlError> {
        self.buf.clear();
        let decoder = self.reader.decoder();
        let position = self.reader.buffer_position();
        match self.reader.read_event_into(&mut self.buf) {
            Ok(event) => Ok((event, decoder, position)),
            Err(source) => Err(OsmXmlError::Parse {
                position: self.reader.error_position(),
                source,
            }),
        }
    }

    fn skip_subtree(&mut self, end: &BytesEnd<'_>) -> Result<(), OsmXmlError> {
        self.skip_buf.clear();
        match self.reader.read_to_end_into(end.name(), &mut self.skip_buf) {
            Ok(_) => Ok(()),
            Err(source) => Err(OsmXmlError::Parse {
                position: self.reader.error_position(),
                source,
            }),
        }
    }

    fn read_element(&mut self) -> Result<Option<Element>, OsmXmlError> {
        loop {
            let (event, decoder, position) = self.next_event()?;
            let step = match event {
                Event::Start(start) => match open_element(&start, decoder, position)? {
                    Some(element) => Step::Children(element),
                    None if start.name().as_ref() == OSM => Step::Continue,
                    None => {
                        debug!(
                            "skipping <{}> subtree",
                            String::from_utf8_lossy(start.name().as_ref())
                        );
                        Step::Skip(start.to_end().into_owned())
                    }
                },
                Event::Empty(start) => match open_element(&start, decoder, position)? {
                    Some(element) => Step::Done(element),
                    None => Step::Continue,
                },
                Event::Eof => return Ok(None),
                _ => Step::Continue,
            };
            match step {
                Step::Children(element) => return self.read_children(element).map(Some),
                Step::Done(element) => return Ok(Some(element)),
                Step::Skip(end) => self.skip_subtree(&end)?,
                Step::Continue => {}
            }
        }
    }

    fn read_children(&mut self, mut element: Element) -> Result<Element, OsmXmlError> {
        let kind = element.kind();
        let closing = kind.name().as_bytes();
        loop {
            let (event, decoder, position) = self.next_event()?;
            let skip = match event {
                Event::Empty(child) => {
                    add_child(&mut element, &child, decoder, position)?;
                    None
                }
                Event::Start(child) => {
                    add_child(&mut element, &child, decoder, position)?;
                    Some(child.to_end().into_owned())
                }
                Event::End(end) if end.name().as_ref() == closing => return Ok(element),
                Event::Eof => {
                    return Err(OsmXmlError::UnexpectedEof {
                        element: kind,
                        id: element.id().map(str::to_owned),
                    });
                }
                _ => None,
            };
            if let Some(end) = skip {
                self.skip_subtree(&end)?;
            }
        }
    }
}

/// What to do after a top-level event.
enum Step {
    Children(Element),
    Done(Element),
    Skip(BytesEnd<'static>),
    Continue,
}

impl<R: BufRead> Iterator for OsmXmlReader<R> {
    type Item = Result<Element, OsmXmlError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.read_element();
        if !matches!(result, Ok(Some(_))) {
            self.finished = true;
        }
        result.transpose()
    }
}

/// Open an OSM XML file for streaming.
///
/// # Errors
/// Returns [`OsmXmlError::Open`] when the file cannot be opened.
pub fn open_osm_xml(
    path: &Utf8Path,
) -> Result<OsmXmlReader<std::io::BufReader<cap_std::fs_utf8::File>>, OsmXmlError> {
    let file = wrangle_fs::open_file(path).map_err(|source| OsmXmlError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(OsmXmlReader::new(std::io::BufReader::new(file)))
}

/// Build an element from its opening tag, or `None` when the tag is neither
/// a node nor a way.
fn open_element(
    start: &BytesStart<'_>,
    decoder: Decoder,
    position: u64,
) -> Result<Option<Element>, OsmXmlError> {
    match start.name().as_ref() {
        NODE => {
            let mut node = Node::default();
            for_each_attribute(start, decoder, position, |name, value| match name {
                b"lat" => node.lat = Some(value),
                b"lon" => node.lon = Some(value),
                other => set_attribute(&mut node.attributes, other, value),
            })?;
            Ok(Some(Element::Node(node)))
        }
        WAY => {
            let mut way = Way::default();
            for_each_attribute(start, decoder, position, |name, value| {
                set_attribute(&mut way.attributes, name, value);
            })?;
            Ok(Some(Element::Way(way)))
        }
        _ => Ok(None),
    }
}

fn set_attribute(attributes: &mut wrangle_core::EntityAttributes, name: &[u8], value: String) {
    let slot = std::str::from_utf8(name)
        .ok()
        .and_then(EntityField::from_name)
        .and_then(|field| attributes.slot_mut(field));
    if let Some(slot) = slot {
        *slot = Some(value);
    }
}

fn add_child(
    element: &mut Element,
    child: &BytesStart<'_>,
    decoder: Decoder,
    position: u64,
) -> Result<(), OsmXmlError> {
    match (element, child.name().as_ref()) {
        (Element::Node(Node { tags, .. }) | Element::Way(Way { tags, .. }), TAG) => {
            let mut tag = Tag::default();
            for_each_attribute(child, decoder, position, |name, value| match name {
                b"k" => tag.key = Some(value),
                b"v" => tag.value = Some(value),
                _ => {}
            })?;
            tags.push(tag);
        }
        (Element::Way(way), ND) => {
            let mut node_ref = NodeRef::default();
            for_each_attribute(child, decoder, position, |name, value| {
                if name == b"ref" {
                    node_ref.node_id = Some(value);
                }
            })?;
            way.node_refs.push(node_ref);
        }
        (element, other) => warn!(
            "ignoring <{}> inside {} {:?}",
            String::from_utf8_lossy(other),
            element.kind(),
            element.id()
        ),
    }
    Ok(())
}

fn for_each_attribute(
    start: &BytesStart<'_>,
    decoder: Decoder,
    position: u64,
    mut visit: impl FnMut(&[u8], String),
) -> Result<(), OsmXmlError> {
    for entry in start.attributes() {
        let attribute = entry.map_err(|source| OsmXmlError::Parse {
            position,
            source: source.into(),
        })?;
        let value = attribute
            .decode_and_unescape_value(decoder)
            .map_err(|source| OsmXmlError::Parse {
                position,
                source: source.into(),
            })?;
        visit(attribute.key.as_ref(), value.into_owned());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn read(xml: &str) -> Vec<Result<Element, OsmXmlError>> {
        OsmXmlReader::new(xml.as_bytes()).collect()
    }

    fn read_ok(xml: &str) -> Vec<Element> {
        read(xml)
            .into_iter()
            .collect::<Result<_, _>>()
            .expect("well-formed document")
    }

    #[rstest]
    fn reads_self_closing_and_nested_elements() {
        let elements = read_ok(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <osm version="0.6">
              <bounds minlat="39.8" minlon="116.2" maxlat="40.0" maxlon="116.5"/>
              <node id="1" lat="39.9" lon="116.4" user="a" uid="2" version="3" changeset="4" timestamp="2016-01-01T00:00:00Z" visible="true"/>
              <way id="10" user="a">
                <nd ref="1"/>
                <tag k="highway" v="primary"/>
                <nd ref="2"/>
              </way>
            </osm>"#,
        );
        assert_eq!(elements.len(), 2);
        let Element::Node(node) = &elements[0] else {
            panic!("expected a node");
        };
        assert_eq!(node.lat.as_deref(), Some("39.9"));
        assert_eq!(node.attributes.changeset.as_deref(), Some("4"));
        assert!(node.tags.is_empty());

        let Element::Way(way) = &elements[1] else {
            panic!("expected a way");
        };
        let refs: Vec<_> = way.node_refs.iter().map(|r| r.node_id.as_deref()).collect();
        assert_eq!(refs, [Some("1"), Some("2")]);
        assert_eq!(way.tags, [Tag::new("highway", "primary")]);
        assert_eq!(way.attributes.uid, None);
    }

    #[rstest]
    fn unescapes_attribute_values() {
        let elements = read_ok(
            r#"<osm><node id="1"><tag k="name" v="Tom &amp; Jerry&apos;s"/></node></osm>"#,
        );
        assert_eq!(elements[0].tags()[0].value.as_deref(), Some("Tom & Jerry's"));
    }

    #[rstest]
    fn skips_relations_with_their_members() {
        let elements = read_ok(
            r#"<osm>
              <relation id="7"><member type="way" ref="10" role="outer"/><tag k="type" v="multipolygon"/></relation>
              <node id="1" lat="1" lon="2"/>
            </osm>"#,
        );
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].id(), Some("1"));
    }

    #[rstest]
    fn reports_malformed_xml_and_fuses() {
        let mut reader = OsmXmlReader::new(r#"<osm><node id="1"></way></osm>"#.as_bytes());
        assert!(matches!(reader.next(), Some(Err(OsmXmlError::Parse { .. }))));
        assert!(reader.next().is_none());
    }

    #[rstest]
    fn reports_truncated_elements() {
        let results = read(r#"<osm><way id="3"><nd ref="1"/>"#);
        match results.as_slice() {
            [Err(OsmXmlError::UnexpectedEof { element, id })] => {
                assert_eq!(*element, ElementKind::Way);
                assert_eq!(id.as_deref(), Some("3"));
            }
            // Parsers that track open tags report the truncation themselves.
            [Err(OsmXmlError::Parse { .. })] => {}
            other => panic!("unexpected results {other:?}"),
        }
    }

    #[rstest]
    fn empty_documents_yield_nothing() {
        assert!(read("<osm/>").is_empty());
        assert!(read("").is_empty());
    }
}
