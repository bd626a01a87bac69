//! Test helpers providing a scratch workspace with a small OSM extract.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

/// Two nodes and a way; one malformed postcode and one abbreviated name.
pub(super) const SAMPLE_OSM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6" generator="osmconvert 0.8.5">
  <node id="1" lat="39.9081" lon="116.3975" version="2" timestamp="2014-03-01T10:00:00Z" changeset="20" uid="7" user="Luo Gang">
    <tag k="addr:postcode" v="99999"/>
    <tag k="amenity" v="library"/>
  </node>
  <node id="2" lat="39.9102" lon="116.4081" version="1" timestamp="2015-08-12T22:10:00Z" changeset="21" uid="7" user="Luo Gang"/>
  <way id="10" version="4" timestamp="2016-01-02T03:04:05Z" changeset="22" uid="8" user="R438">
    <nd ref="1"/>
    <tag k="name:en" v="Fucheng Lu"/>
    <nd ref="2"/>
  </way>
</osm>
"#;

/// A node whose latitude is outside [-90, 90].
pub(super) const OUT_OF_RANGE_OSM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <node id="3" lat="95.0" lon="116.4" version="1" timestamp="2016-01-01T00:00:00Z" changeset="5" uid="1" user="mapper"/>
</osm>
"#;

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directories");
    }
    fs::write(path, contents).expect("write file");
}

/// Temporary directory holding the input extract and command outputs.
#[derive(Debug)]
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(super) fn extract(&self) -> Utf8PathBuf {
        self.root.join("beijing.osm")
    }

    pub(super) fn write_extract(&self, contents: &str) -> Utf8PathBuf {
        let path = self.extract();
        write_utf8(&path, contents.as_bytes());
        path
    }

    pub(super) fn output_dir(&self) -> Utf8PathBuf {
        self.root.join("tables")
    }

    pub(super) fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.root.join(relative)).expect("read output file")
    }
}
