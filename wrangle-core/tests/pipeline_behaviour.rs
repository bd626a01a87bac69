use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use std::convert::Infallible;
use wrangle_core::{
    Element, EntityAttributes, MemorySink, Node, NodeRef, PipelineDriver, PipelineError,
    PipelineSummary, Table, Tag, Way,
};

type Outcome = Result<PipelineSummary, PipelineError<Infallible, Infallible>>;

#[derive(Debug, Default)]
struct ExportWorld {
    elements: RefCell<Vec<Element>>,
    sink: RefCell<MemorySink>,
    outcome: RefCell<Option<Outcome>>,
}

fn attributes(id: &str) -> EntityAttributes {
    EntityAttributes {
        id: Some(id.into()),
        user: Some("mapper".into()),
        uid: Some("42".into()),
        version: Some("1".into()),
        changeset: Some("1000".into()),
        timestamp: Some("2016-01-01T00:00:00Z".into()),
    }
}

#[fixture]
fn world() -> ExportWorld {
    ExportWorld::default()
}

#[given("a way referencing three nodes")]
fn three_node_way(#[from(world)] world: &ExportWorld) {
    world.elements.replace(vec![Element::Way(Way {
        attributes: attributes("10"),
        tags: vec![Tag::new("highway", "residential")],
        node_refs: vec![NodeRef::new("7"), NodeRef::new("8"), NodeRef::new("9")],
    })]);
}

#[given("a node with latitude 95")]
fn out_of_range_node(#[from(world)] world: &ExportWorld) {
    world.elements.replace(vec![Element::Node(Node {
        attributes: attributes("1"),
        lat: Some("95".into()),
        lon: Some("116.4".into()),
        tags: Vec::new(),
    })]);
}

#[when("the document is exported with validation")]
fn export(#[from(world)] world: &ExportWorld) {
    let elements = world.elements.borrow().clone();
    let mut sink = world.sink.borrow_mut();
    let outcome = PipelineDriver::new()
        .with_validation(true)
        .run(elements.into_iter().map(Ok), &mut *sink);
    world.outcome.replace(Some(outcome));
}

#[then("the way node positions are 0, 1 and 2")]
fn positions_follow_order(#[from(world)] world: &ExportWorld) {
    let outcome = world.outcome.borrow();
    let summary = outcome
        .as_ref()
        .expect("outcome recorded")
        .as_ref()
        .expect("export succeeds");
    assert_eq!(summary.rows(Table::WaysNodes), 3);
    let sink = world.sink.borrow();
    let rows: Vec<_> = sink
        .ways_nodes
        .iter()
        .map(|row| (row.node_id.as_str(), row.position))
        .collect();
    assert_eq!(rows, [("7", 0), ("8", 1), ("9", 2)]);
}

#[then("the export fails on the nodes latitude column")]
fn fails_on_latitude(#[from(world)] world: &ExportWorld) {
    let outcome = world.outcome.borrow();
    let error = outcome
        .as_ref()
        .expect("outcome recorded")
        .as_ref()
        .expect_err("export should fail");
    match error {
        PipelineError::Schema(violation) => {
            assert_eq!(violation.table, Table::Nodes);
            assert_eq!(violation.field, "lat");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(world.sink.borrow().is_empty());
}

#[scenario(path = "tests/features/pipeline.feature", index = 0)]
fn way_nodes_keep_order(world: ExportWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/pipeline.feature", index = 1)]
fn invalid_latitude_aborts(world: ExportWorld) {
    let _ = world;
}
