//! Integration tests for opening data files through the JSON backend

use nxv_tree::{DataType, Error, FileBackend, JsonBackend, NodeKind};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn data_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("testdata")
        .join("data")
        .join(name)
}

#[test]
fn test_open_fixture() -> anyhow::Result<()> {
    let file = JsonBackend::new().open(&data_path("scan_valid.json"))?;

    let entry = file.resolve("/entry")?;
    assert_eq!(entry.nx_class(), Some("NXentry"));

    let data = file.resolve("/entry/instrument/detector/data")?;
    assert_eq!(data.kind, NodeKind::Field);
    assert_eq!(data.data_type(), Some(DataType::Int32));
    assert_eq!(data.data_shape(), vec![4]);

    let distance = file.resolve("/entry/instrument/detector/distance")?;
    assert_eq!(distance.units(), Some("m"));
    Ok(())
}

#[test]
fn test_link_in_fixture_resolves() -> anyhow::Result<()> {
    let file = JsonBackend::new().open(&data_path("scan_valid.json"))?;

    let link = file.resolve("/entry/data/data")?;
    assert_eq!(link.kind, NodeKind::Link);
    let target = file.resolve_link(link, "/entry/data/data")?;
    assert_eq!(target.kind, NodeKind::Field);
    assert_eq!(target.data_shape(), vec![4]);
    Ok(())
}

#[test]
fn test_walk_excludes_root() -> anyhow::Result<()> {
    let file = JsonBackend::new().open(&data_path("scan_valid.json"))?;
    let names: Vec<&str> = file
        .walk("/entry/instrument/detector")?
        .into_iter()
        .map(|n| n.name.as_str())
        .collect();
    assert_eq!(names, vec!["entry", "instrument", "detector"]);
    Ok(())
}

#[test]
fn test_open_missing_file() {
    let err = JsonBackend::new()
        .open(&data_path("does_not_exist.json"))
        .unwrap_err();
    assert!(matches!(err, Error::Open { .. }));
}

#[test]
fn test_open_malformed_file() -> anyhow::Result<()> {
    let mut temp = NamedTempFile::new()?;
    write!(temp, "{{\"kind\": \"group\", \"children\": [")?;

    let err = JsonBackend::new().open(temp.path()).unwrap_err();
    assert!(matches!(err, Error::Open { .. }));
    assert!(err.to_string().contains("JSON parse error"));
    Ok(())
}

#[test]
fn test_root_must_be_group() -> anyhow::Result<()> {
    let mut temp = NamedTempFile::new()?;
    write!(temp, "{{\"name\": \"x\", \"kind\": \"field\", \"value\": 1}}")?;

    let err = JsonBackend::new().open(temp.path()).unwrap_err();
    assert!(err.to_string().contains("must be a group"));
    Ok(())
}
