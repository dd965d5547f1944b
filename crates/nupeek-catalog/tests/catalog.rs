use std::fs;
use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use nupeek_catalog::{Catalog, Error, ManifestEntry, output_path};
use tempfile::tempdir;

fn entry(type_name: &str, second: u32) -> ManifestEntry {
    ManifestEntry {
        package_id: "Polly".into(),
        version: "8.4.1".into(),
        tfm: "net8.0".into(),
        type_name: type_name.into(),
        assembly_path: PathBuf::from("/cache/polly/lib/net8.0/Polly.dll"),
        output_path: PathBuf::from(format!("/out/{type_name}.decompiled.cs")),
        decompiled_at_utc: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, second).unwrap(),
    }
}

#[test]
fn index_last_write_wins_and_creates_root() {
    let dir = tempdir().unwrap();
    let catalog = Catalog::new(dir.path().join("out"));

    let path = catalog.upsert_index("Polly.Policy", Path::new("a.cs")).unwrap();
    catalog.upsert_index("Polly.Policy", Path::new("b.cs")).unwrap();
    catalog.upsert_index("Polly.Context", Path::new("c.cs")).unwrap();

    assert_eq!(path, dir.path().join("out/index.json"));
    let index = catalog.read_index().unwrap();
    assert_eq!(index.len(), 2);
    assert_eq!(index["Polly.Policy"], "b.cs");

    let raw: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    assert!(raw.is_object());
}

#[test]
fn manifest_upsert_replaces_same_key() {
    let dir = tempdir().unwrap();
    let catalog = Catalog::new(dir.path());

    catalog.upsert_manifest(entry("Polly.Policy", 1)).unwrap();
    catalog.upsert_manifest(entry("Polly.Context", 2)).unwrap();
    let mut again = entry("Polly.Policy", 9);
    again.package_id = "POLLY".into();
    again.tfm = "NET8.0".into();
    catalog.upsert_manifest(again.clone()).unwrap();

    let manifest = catalog.read_manifest().unwrap();
    assert_eq!(manifest.len(), 2);
    assert_eq!(manifest[0], again);
    assert_eq!(manifest[1].type_name, "Polly.Context");
}

#[test]
fn manifest_distinguishes_version_and_type_case() {
    let dir = tempdir().unwrap();
    let catalog = Catalog::new(dir.path());

    catalog.upsert_manifest(entry("Polly.Policy", 1)).unwrap();
    catalog.upsert_manifest(entry("polly.policy", 1)).unwrap();
    let mut other_version = entry("Polly.Policy", 1);
    other_version.version = "8.4.2".into();
    catalog.upsert_manifest(other_version).unwrap();

    assert_eq!(catalog.read_manifest().unwrap().len(), 3);
}

#[test]
fn manifest_file_is_camel_case_array() {
    let dir = tempdir().unwrap();
    let catalog = Catalog::new(dir.path());
    let path = catalog.upsert_manifest(entry("Polly.Policy", 5)).unwrap();

    let raw: serde_json::Value = serde_json::from_slice(&fs::read(path).unwrap()).unwrap();
    let first = &raw.as_array().unwrap()[0];
    assert_eq!(first["packageId"], "Polly");
    assert_eq!(first["tfm"], "net8.0");
    assert_eq!(first["decompiledAtUtc"], "2026-01-02T03:04:05Z");
}

#[test]
fn blank_files_read_as_empty() {
    let dir = tempdir().unwrap();
    let catalog = Catalog::new(dir.path());
    fs::write(catalog.index_path(), "  \n").unwrap();
    fs::write(catalog.manifest_path(), "").unwrap();

    assert!(catalog.read_index().unwrap().is_empty());
    assert!(catalog.read_manifest().unwrap().is_empty());
    catalog.upsert_manifest(entry("Polly.Policy", 1)).unwrap();
    assert_eq!(catalog.read_manifest().unwrap().len(), 1);
}

#[test]
fn corrupt_catalog_is_reported() {
    let dir = tempdir().unwrap();
    let catalog = Catalog::new(dir.path());
    fs::write(catalog.index_path(), "{not json").unwrap();

    let err = catalog.upsert_index("A", Path::new("a.cs")).unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
    assert_eq!(fs::read_to_string(catalog.index_path()).unwrap(), "{not json");
}

#[test]
fn output_path_lives_under_packages() {
    let root = Path::new("/out");
    let path = output_path(root, "Polly", "8.4.1", "net8.0", "Polly.AsyncPolicy`1");
    assert_eq!(path, Path::new("/out/packages/polly/8.4.1/net8.0/Polly_AsyncPolicy_1.decompiled.cs"));
}
