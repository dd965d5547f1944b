use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use nupeek_archive::{Error, ExtractOptions, Progress, extract_file};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

fn write_zip(dir: &Path, name: &str, entries: &[(&str, Option<&[u8]>)]) -> std::path::PathBuf {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (entry, data) in entries {
        match data {
            Some(bytes) => {
                writer.start_file(*entry, SimpleFileOptions::default()).unwrap();
                writer.write_all(bytes).unwrap();
            }
            None => writer.add_directory(*entry, SimpleFileOptions::default()).unwrap(),
        }
    }
    let path = dir.join(name);
    fs::write(&path, writer.finish().unwrap().into_inner()).unwrap();
    path
}

fn files_under(root: &Path) -> Vec<String> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let rel = path.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/");
                out.push(rel);
            }
        }
    }
    let mut out = Vec::new();
    walk(root, root, &mut out);
    out.sort();
    out
}

#[test]
fn extracts_package_layout() {
    let dir = TempDir::new().unwrap();
    let archive = write_zip(
        dir.path(),
        "pkg.nupkg",
        &[
            ("lib/", None),
            ("lib/net8.0/Pkg.dll", Some(b"MZ-net8")),
            ("lib/netstandard2.0/Pkg.dll", Some(b"MZ-ns20")),
            ("Pkg.nuspec", Some(b"<package/>")),
        ],
    );
    let destination = dir.path().join("extracted");

    let report = extract_file(&archive, &destination, &ExtractOptions::default()).unwrap();

    assert_eq!(report.entry_count, 4);
    assert_eq!(report.files().count(), 3);
    assert_eq!(
        files_under(&destination),
        ["Pkg.nuspec", "lib/net8.0/Pkg.dll", "lib/netstandard2.0/Pkg.dll"]
    );
    assert_eq!(fs::read(destination.join("lib/net8.0/Pkg.dll")).unwrap(), b"MZ-net8");
}

#[test]
fn overwrites_existing_destination() {
    let dir = TempDir::new().unwrap();
    let destination = dir.path().join("extracted");
    fs::create_dir_all(&destination).unwrap();
    fs::write(destination.join("stale.txt"), "old").unwrap();

    let archive = write_zip(dir.path(), "pkg.zip", &[("fresh.txt", Some(b"new"))]);
    extract_file(&archive, &destination, &ExtractOptions::default()).unwrap();

    assert_eq!(files_under(&destination), ["fresh.txt"]);
}

#[test]
fn traversal_entry_fails_and_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let archive = write_zip(
        dir.path(),
        "evil.zip",
        &[("good.txt", Some(b"fine")), ("../../escape.txt", Some(b"gotcha"))],
    );
    let destination = dir.path().join("out").join("extracted");
    fs::create_dir_all(destination.parent().unwrap()).unwrap();

    let result = extract_file(&archive, &destination, &ExtractOptions::default());

    let err = result.unwrap_err();
    assert!(err.is_safety_violation());
    assert!(matches!(err, Error::ZipSlip { .. }));
    assert!(!destination.exists());
    assert!(!dir.path().join("escape.txt").exists());
    assert_eq!(fs::read_dir(destination.parent().unwrap()).unwrap().count(), 0);
}

#[test]
fn too_many_entries_rejected() {
    let dir = TempDir::new().unwrap();
    let archive = write_zip(
        dir.path(),
        "many.zip",
        &[("a", Some(b"1")), ("b", Some(b"2")), ("c", Some(b"3"))],
    );
    let destination = dir.path().join("extracted");

    let result = extract_file(&archive, &destination, &ExtractOptions::default().max_entries(2));

    assert!(matches!(result, Err(Error::TooManyEntries { count: 3, limit: 2 })));
    assert!(!destination.exists());
}

#[test]
fn size_limit_rejected_without_materializing() {
    let dir = TempDir::new().unwrap();
    let payload = vec![b'x'; 4096];
    let archive = write_zip(dir.path(), "big.zip", &[("big.bin", Some(&payload))]);
    let destination = dir.path().join("extracted");

    let result = extract_file(&archive, &destination, &ExtractOptions::default().max_total_bytes(1024));

    assert!(matches!(result, Err(Error::SizeLimitExceeded { limit: 1024 })));
    assert!(!destination.join("big.bin").exists());
}

#[test]
fn corrupted_archive_is_not_a_safety_violation() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("broken.zip");
    fs::write(&archive, b"definitely not a zip").unwrap();

    let err = extract_file(&archive, &dir.path().join("extracted"), &ExtractOptions::default())
        .unwrap_err();

    assert!(matches!(err, Error::Corrupted(_)));
    assert!(!err.is_safety_violation());
}

#[test]
fn progress_reports_each_entry() {
    let dir = TempDir::new().unwrap();
    let archive = write_zip(dir.path(), "p.zip", &[("a", Some(b"1")), ("b", Some(b"22"))]);
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();
    let options = ExtractOptions::default().on_progress(Arc::new(move |p: Progress| {
        assert_eq!(p.entry_count, 2);
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    let report = extract_file(&archive, &dir.path().join("extracted"), &options).unwrap();

    assert_eq!(seen.load(Ordering::SeqCst), 2);
    assert_eq!(report.total_bytes, 3);
}
