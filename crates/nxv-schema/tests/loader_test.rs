//! Integration tests for loading definitions from an NXDL directory tree

use nxv_schema::{DirectorySource, Error, NodeKind, SchemaLoader, SchemaSource};
use std::path::PathBuf;

fn nxdl_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("testdata")
        .join("nxdl")
}

#[test]
fn test_directory_source_searches_layout_dirs() {
    let source = DirectorySource::new(nxdl_dir());
    assert!(source.retrieve("NXscan").is_some());
    assert!(source.retrieve("NXloop_a").is_some());
    assert!(source.retrieve("NXmissing").is_none());
}

#[test]
fn test_load_single_definition() {
    let source = DirectorySource::new(nxdl_dir());
    let loader = SchemaLoader::new(vec![&source]);
    let schema = loader.load("NXscan").unwrap();

    assert_eq!(schema.name, "NXscan");
    assert_eq!(schema.base, None);
    assert!(schema.symbols.is_declared("n"));

    let entry = schema.entry_rule(Some("NXentry"));
    let definition = entry.find_child(NodeKind::Field, "definition").unwrap();
    assert_eq!(
        definition.enumeration.as_deref(),
        Some(&["NXscan".to_string(), "NXscan_tof".to_string()][..])
    );
    let notes = entry.find_child(NodeKind::Field, "notes").unwrap();
    assert!(notes.recommended);
    assert_eq!(notes.occurrence().min, 0);
}

#[test]
fn test_load_with_inheritance() -> anyhow::Result<()> {
    let source = DirectorySource::new(nxdl_dir());
    let loader = SchemaLoader::new(vec![&source]);
    let schema = loader.load_with_inheritance("NXscan_tof")?;

    assert_eq!(schema.name, "NXscan_tof");
    assert_eq!(schema.inheritance_chain, vec!["NXscan", "NXscan_tof"]);
    assert!(schema.symbols.is_declared("n"));
    assert!(schema.symbols.is_declared("t"));

    let entry = schema.entry_rule(Some("NXentry"));
    // Inherited from the base
    let title = entry.find_child(NodeKind::Field, "title").unwrap();
    assert_eq!(title.type_constraint.as_deref(), Some("NX_CHAR"));
    // Overridden by the derived definition
    let notes = entry.find_child(NodeKind::Field, "notes").unwrap();
    assert_eq!(notes.type_constraint.as_deref(), Some("NX_CHAR"));
    assert!(!notes.occurrence().is_required());

    let data = entry
        .children
        .iter()
        .find(|c| c.kind == NodeKind::Group && c.type_constraint.as_deref() == Some("NXdata"))
        .unwrap();
    assert!(data.find_child(NodeKind::Field, "x").is_some());
    assert!(data.find_child(NodeKind::Field, "time_of_flight").is_some());
    assert!(data.find_child(NodeKind::Link, "data").is_some());
    Ok(())
}

#[test]
fn test_circular_extends() {
    let source = DirectorySource::new(nxdl_dir());
    let loader = SchemaLoader::new(vec![&source]);
    let err = loader.load_with_inheritance("NXloop_a").unwrap_err();

    assert!(matches!(err, Error::Inheritance(_)));
    let message = err.to_string();
    assert!(message.contains("NXloop_a"));
    assert!(message.contains("NXloop_b"));
}

#[test]
fn test_malformed_definition() {
    let source = DirectorySource::new(nxdl_dir());
    let loader = SchemaLoader::new(vec![&source]);
    let err = loader.load("NXbroken").unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
}

#[test]
fn test_missing_definition() {
    let source = DirectorySource::new(nxdl_dir());
    let loader = SchemaLoader::new(vec![&source]);
    assert!(matches!(
        loader.load_with_inheritance("NXmissing"),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_earlier_source_wins() {
    let directory = DirectorySource::new(nxdl_dir());
    let override_source = |name: &str| {
        (name == "NXscan").then(|| r#"<definition name="NXscan"><group type="NXentry"/></definition>"#.to_string())
    };
    let sources: Vec<&dyn SchemaSource> = vec![&override_source, &directory];
    let loader = SchemaLoader::new(sources);
    let schema = loader.load_with_inheritance("NXscan").unwrap();

    let entry = schema.entry_rule(Some("NXentry"));
    assert!(entry.children.is_empty());
}
