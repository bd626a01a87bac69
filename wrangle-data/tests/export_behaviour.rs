//! Behavioural tests for exporting and auditing OSM XML files.

use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use std::fs;
use tempfile::TempDir;
use wrangle_core::{AuditReport, PipelineDriver, Table};
use wrangle_data::{CsvTableSink, OsmXmlError, audit_osm_xml, csv_file_name, open_osm_xml};

#[derive(Debug)]
struct ExportWorld {
    workspace: TempDir,
    input: RefCell<Option<Utf8PathBuf>>,
    audit: RefCell<Option<Result<AuditReport, OsmXmlError>>>,
}

impl ExportWorld {
    fn new() -> Self {
        Self {
            workspace: TempDir::new().expect("create workspace"),
            input: RefCell::new(None),
            audit: RefCell::new(None),
        }
    }

    fn input(&self) -> Utf8PathBuf {
        self.input
            .borrow()
            .clone()
            .expect("input path should be initialised")
    }

    fn output_dir(&self) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.workspace.path().join("tables")).expect("utf-8 path")
    }

    fn table(&self, table: Table) -> String {
        fs::read_to_string(self.output_dir().join(csv_file_name(table))).expect("read table")
    }

    fn report(&self) -> AuditReport {
        self.audit
            .borrow()
            .as_ref()
            .expect("audit was attempted")
            .as_ref()
            .expect("audit should succeed")
            .clone()
    }
}

#[fixture]
fn world() -> ExportWorld {
    ExportWorld::new()
}

#[given("the sample OSM extract")]
fn sample_extract(#[from(world)] world: &ExportWorld) {
    let path = Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample.osm");
    world.input.replace(Some(path));
}

#[given("a path with no OSM extract")]
fn missing_extract(#[from(world)] world: &ExportWorld) {
    let path = Utf8PathBuf::from_path_buf(world.workspace.path().join("missing.osm"))
        .expect("utf-8 path");
    world.input.replace(Some(path));
}

#[when("the extract is exported to CSV")]
fn export_csv(#[from(world)] world: &ExportWorld) {
    let reader = open_osm_xml(&world.input()).expect("open extract");
    let sink = CsvTableSink::create(&world.output_dir()).expect("create sink");
    PipelineDriver::new()
        .with_validation(true)
        .run(reader, sink)
        .expect("export succeeds");
}

#[when("the extract is audited")]
fn audit_extract(#[from(world)] world: &ExportWorld) {
    world.audit.replace(Some(audit_osm_xml(&world.input())));
}

#[then("every table file starts with its header")]
fn headers_present(#[from(world)] world: &ExportWorld) {
    for table in Table::ALL {
        let contents = world.table(table);
        let header = contents.lines().next().expect("header line");
        assert_eq!(header, table.fields().join(","), "header of {table}");
    }
}

#[then("the way nodes keep their document positions")]
fn way_node_positions(#[from(world)] world: &ExportWorld) {
    assert_eq!(
        world.table(Table::WaysNodes),
        "id,node_id,position\n\
         31404591,25716470,0\n\
         31404591,25716471,1\n\
         31404591,25716472,2\n"
    );
    let ways_tags = world.table(Table::WaysTags);
    assert!(ways_tags.contains("31404591,en,Dongdan North Street,name"));
}

#[then("the unexpected postcode is not exported")]
fn postcode_dropped(#[from(world)] world: &ExportWorld) {
    let nodes_tags = world.table(Table::NodesTags);
    assert!(!nodes_tags.contains("99999"));
    assert!(nodes_tags.contains("25716472,postcode,100006,addr"));
    assert!(!nodes_tags.contains("fixme"));
    assert_eq!(nodes_tags.lines().count(), 4);
}

#[then("the audit counts 3 nodes and 1 way")]
fn audit_counts(#[from(world)] world: &ExportWorld) {
    let report = world.report();
    assert_eq!((report.nodes, report.ways), (3, 1));
}

#[then("the audit lists the unexpected postcode")]
fn audit_postcodes(#[from(world)] world: &ExportWorld) {
    let node_tags = world
        .report()
        .field_validity
        .node_tags
        .expect("node tags were checked");
    assert_eq!(node_tags.postcode.len(), 1);
    assert!(node_tags.postcode.contains("99999"));
}

#[then("the audit fails to open the file")]
fn audit_fails(#[from(world)] world: &ExportWorld) {
    let audit = world.audit.borrow();
    let error = audit
        .as_ref()
        .expect("audit was attempted")
        .as_ref()
        .expect_err("audit should fail");
    assert!(matches!(error, OsmXmlError::Open { .. }), "unexpected error {error:?}");
}

#[scenario(path = "tests/features/export.feature", index = 0)]
fn exporting_to_csv(world: ExportWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/export.feature", index = 1)]
fn auditing_the_extract(world: ExportWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/export.feature", index = 2)]
fn missing_extract_is_reported(world: ExportWorld) {
    let _ = world;
}
