//! Integration tests for nxv-validation crate
//!
//! These tests run whole files through a validation context, with
//! definitions read from the repository's testdata directory.

use nxv_schema::InMemorySource;
use nxv_tree::{DataFile, DataType, Node};
use nxv_validation::{
    CollectingSink, LogRecord, Outcome, Severity, Target, ValidationContext, ValidationPolicy,
};
use std::path::PathBuf;

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn nxdl_dir() -> PathBuf {
    repo_root().join("testdata").join("nxdl")
}

fn data_path(name: &str) -> PathBuf {
    repo_root().join("testdata").join("data").join(name)
}

fn context() -> (ValidationContext, CollectingSink) {
    let sink = CollectingSink::new();
    let mut ctx = ValidationContext::new(nxdl_dir());
    ctx.set_logger(sink.clone());
    (ctx, sink)
}

fn codes(records: &[LogRecord], level: Severity) -> Vec<String> {
    let mut codes: Vec<String> = records
        .iter()
        .filter(|r| r.level == level)
        .map(|r| r.code.clone())
        .collect();
    codes.sort();
    codes
}

/// Entry matching the NXscan definition, with the detector data listed
/// before or after the NXdata group
fn scan_entry(x_points: usize, detector_first: bool) -> Node {
    let instrument = Node::group("instrument", "NXinstrument").with_child(
        Node::group("detector", "NXdetector").with_child(
            Node::field("data", vec![1_i64, 2, 3, 4])
                .with_dtype(DataType::Int32),
        ),
    );
    let x: Vec<f64> = (0..x_points).map(|i| i as f64).collect();
    let data = Node::group("data", "NXdata")
        .with_attribute("signal", "data")
        .with_child(Node::link("data", "/entry/instrument/detector/data"))
        .with_child(Node::field("x", x).with_attribute("units", "mm"));

    let mut entry = Node::group("entry", "NXentry")
        .with_child(Node::field("definition", "NXscan"))
        .with_child(Node::field("title", "generated"))
        .with_child(Node::field("start_time", "2024-05-14T09:30:00Z"))
        .with_child(Node::field("notes", "none"));
    if detector_first {
        entry = entry.with_child(instrument).with_child(data);
    } else {
        entry = entry.with_child(data).with_child(instrument);
    }
    entry
}

fn in_memory(entry: Node) -> DataFile {
    DataFile::in_memory(Node::group("", "").with_child(entry))
}

#[test]
fn test_valid_scan_file() {
    let (mut ctx, sink) = context();
    let outcome = ctx.validate(data_path("scan_valid.json"), &Target::default());

    assert_eq!(outcome, Outcome::Valid, "{:#?}", sink.records());
    assert_eq!(outcome.code(), 0);
    assert_eq!(ctx.counters().errors, 0);
    assert_eq!(ctx.counters().warnings, 0);
}

#[test]
fn test_invalid_scan_file() {
    let (mut ctx, sink) = context();
    let outcome = ctx.validate(data_path("scan_invalid.json"), &Target::default());
    let records = sink.records();

    assert_eq!(outcome, Outcome::Invalid);
    assert_eq!(
        codes(&records, Severity::Error),
        vec!["DIMENSION_SYMBOL_MISMATCH", "MISSING_REQUIRED", "UNITS_MISMATCH"]
    );
    assert_eq!(
        codes(&records, Severity::Warning),
        vec!["MISSING_RECOMMENDED", "UNDOCUMENTED"]
    );

    let missing = sink.with_code("MISSING_REQUIRED");
    assert_eq!(missing[0].path, "/entry/title");
    assert_eq!(missing[0].get("nxdl"), Some("/NXscan/NXentry/title"));
}

#[test]
fn test_counters_match_emitted_records() {
    let (mut ctx, sink) = context();
    ctx.validate(data_path("scan_invalid.json"), &Target::default());

    let counters = ctx.counters();
    assert_eq!(counters.errors, sink.count(Severity::Error));
    assert_eq!(counters.warnings, sink.count(Severity::Warning));
}

#[test]
fn test_derived_definition_inherits_base_rules() {
    let (mut ctx, sink) = context();
    let outcome = ctx.validate(data_path("scan_tof.json"), &Target::default());
    assert_eq!(outcome, Outcome::Valid, "{:#?}", sink.records());

    // A base-defined requirement still applies through the derived definition
    let mut entry = scan_entry(4, true);
    entry.children.retain(|c| c.name != "title");
    entry.children[0] = Node::field("definition", "NXscan_tof");
    let (mut ctx, sink) = context();
    ctx.validate_file(&in_memory(entry), &Target::default());

    let paths: Vec<String> = sink
        .with_code("MISSING_REQUIRED")
        .into_iter()
        .map(|r| r.path)
        .collect();
    assert!(paths.contains(&"/entry/title".to_string()), "{paths:?}");
    assert!(paths.contains(&"/entry/data/time_of_flight".to_string()), "{paths:?}");
}

#[test]
fn test_validation_is_idempotent() {
    let run = || {
        let (mut ctx, sink) = context();
        let outcome = ctx.validate(data_path("scan_invalid.json"), &Target::default());
        (outcome, ctx.counters(), sink.records())
    };
    assert_eq!(run(), run());
}

#[test]
fn test_dimension_binding_is_order_independent() {
    for detector_first in [true, false] {
        let (mut ctx, sink) = context();
        let outcome = ctx.validate_file(&in_memory(scan_entry(4, detector_first)), &Target::default());
        assert_eq!(outcome, Outcome::Valid, "{:#?}", sink.records());

        let (mut ctx, sink) = context();
        let outcome = ctx.validate_file(&in_memory(scan_entry(3, detector_first)), &Target::default());
        assert_eq!(outcome, Outcome::Invalid);
        assert_eq!(sink.with_code("DIMENSION_SYMBOL_MISMATCH").len(), 1);
    }
}

#[test]
fn test_required_and_repeated_fields() {
    let (mut ctx, sink) = context();
    let mut entry = scan_entry(4, true);
    entry.children.push(Node::field("title", "second title"));
    ctx.validate_file(&in_memory(entry), &Target::default());
    assert_eq!(sink.with_code("TOO_MANY").len(), 1);

    let (mut ctx, sink) = context();
    let mut entry = scan_entry(4, true);
    entry.children.retain(|c| c.name != "start_time");
    ctx.validate_file(&in_memory(entry), &Target::default());
    assert_eq!(sink.with_code("MISSING_REQUIRED")[0].path, "/entry/start_time");
}

#[test]
fn test_extra_field_is_only_a_warning() {
    let (mut ctx, sink) = context();
    let mut entry = scan_entry(4, true);
    entry.children.push(Node::field("operator", "someone"));
    let outcome = ctx.validate_file(&in_memory(entry), &Target::default());

    assert_eq!(outcome, Outcome::Valid);
    assert_eq!(ctx.counters().warnings, 1);
    assert_eq!(sink.with_code("UNDOCUMENTED")[0].path, "/entry/operator");
}

#[test]
fn test_policy_can_escalate_undocumented() {
    let (mut ctx, _sink) = context();
    ctx.set_policy(ValidationPolicy {
        undocumented: Severity::Error,
        ..ValidationPolicy::default()
    });
    let mut entry = scan_entry(4, true);
    entry.children.push(Node::field("operator", "someone"));
    assert_eq!(ctx.validate_file(&in_memory(entry), &Target::default()), Outcome::Invalid);
}

#[test]
fn test_unresolvable_start_path_short_circuits() {
    let (mut ctx, sink) = context();
    let target = Target {
        start_path: Some("/entry/missing"),
        ..Target::default()
    };
    let outcome = ctx.validate(data_path("scan_valid.json"), &target);

    assert_eq!(outcome, Outcome::Invalid);
    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].code, "PATH_NOT_FOUND");
    assert_eq!(records[0].get("fatal"), Some("true"));
}

#[test]
fn test_explicit_start_path_and_definition() {
    let (mut ctx, sink) = context();
    let target = Target {
        definition: Some("NXscan"),
        start_path: Some("/entry"),
        check_root: true,
    };
    let outcome = ctx.validate(data_path("scan_valid.json"), &target);
    assert_eq!(outcome, Outcome::Valid, "{:#?}", sink.records());
}

#[test]
fn test_circular_extends_is_fatal() {
    let (mut ctx, sink) = context();
    let outcome = ctx.validate(data_path("loop.json"), &Target::default());

    assert_eq!(outcome, Outcome::Invalid);
    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].code, "INHERITANCE_CYCLE");
    assert!(records[0].message.contains("NXloop_a"));
}

#[test]
fn test_malformed_definition_is_fatal() {
    let (mut ctx, sink) = context();
    let target = Target {
        definition: Some("NXbroken"),
        ..Target::default()
    };
    let outcome = ctx.validate(data_path("scan_valid.json"), &target);
    assert_eq!(outcome, Outcome::Invalid);
    assert_eq!(sink.records()[0].code, "SCHEMA_INVALID");
}

#[test]
fn test_file_without_entry() {
    let (mut ctx, sink) = context();
    let outcome = ctx.validate(data_path("no_entry.json"), &Target::default());
    assert_eq!(outcome, Outcome::Invalid);
    assert_eq!(sink.with_code("NO_ENTRY").len(), 1);
}

#[test]
fn test_retriever_takes_precedence_over_directory() {
    let (mut ctx, sink) = context();
    ctx.set_retriever(InMemorySource::new().with(
        "NXscan",
        r#"<definition name="NXscan"><group type="NXentry"><field name="sample_id"/></group></definition>"#,
    ));
    let outcome = ctx.validate(data_path("scan_valid.json"), &Target::default());

    assert_eq!(outcome, Outcome::Invalid);
    assert_eq!(sink.with_code("MISSING_REQUIRED")[0].path, "/entry/sample_id");
}

#[test]
fn test_closure_logger() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut ctx = ValidationContext::new(nxdl_dir());
    let handle = Rc::clone(&seen);
    ctx.set_logger(move |record: &LogRecord| handle.borrow_mut().push(record.level));
    ctx.validate(data_path("scan_invalid.json"), &Target::default());

    let errors = seen.borrow().iter().filter(|l| **l == Severity::Error).count();
    assert_eq!(errors, ctx.counters().errors);
}

#[test]
fn test_definitions_from_scratch_directory() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::create_dir(dir.path().join("applications"))?;
    std::fs::write(
        dir.path().join("applications").join("NXtiny.nxdl.xml"),
        r#"<definition name="NXtiny" category="application">
  <group type="NXentry">
    <field name="definition"/>
    <field name="count" type="NX_POSINT"/>
  </group>
</definition>"#,
    )?;

    let entry = Node::group("entry", "NXentry")
        .with_child(Node::field("definition", "NXtiny"))
        .with_child(Node::field("count", 0_i64));
    let sink = CollectingSink::new();
    let mut ctx = ValidationContext::new(dir.path());
    ctx.set_logger(sink.clone());

    let outcome = ctx.validate_file(&in_memory(entry), &Target::default());
    assert_eq!(outcome, Outcome::Invalid);
    assert_eq!(sink.with_code("INVALID_VALUE")[0].path, "/entry/count");

    ctx.set_policy(ValidationPolicy::strict());
    let entry = Node::group("entry", "NXentry")
        .with_child(Node::field("definition", "NXtiny"))
        .with_child(Node::field("count", 5_i64));
    assert_eq!(ctx.validate_file(&in_memory(entry), &Target::default()), Outcome::Valid);
    assert_eq!(ctx.counters().errors, 0);
    Ok(())
}
