use std::path::{Path, PathBuf};

/// Suffix of every generated source file.
pub const OUTPUT_EXTENSION: &str = ".decompiled.cs";

/// `<root>/packages/<id-lower>/<version>/<tfm>/<sanitized type>.decompiled.cs`.
pub fn output_path(root: &Path, package_id: &str, version: &str, tfm: &str, type_name: &str) -> PathBuf {
    root.join("packages")
        .join(package_id.to_lowercase())
        .join(version)
        .join(folder_segment(tfm))
        .join(format!("{}{OUTPUT_EXTENSION}", sanitize_type_name(type_name)))
}

/// File stem for a type: letters, digits, `_` and `-` are kept, everything else becomes `_`.
pub fn sanitize_type_name(type_name: &str) -> String {
    type_name
        .chars()
        .map(|c| match c {
            c if c.is_alphanumeric() || matches!(c, '_' | '-') => c,
            _ => '_',
        })
        .collect()
}

/// Keeps a framework name to one directory level below the version.
fn folder_segment(name: &str) -> String {
    match name {
        "" | "." | ".." => "_".to_string(),
        _ => name.replace(['/', '\\', ':'], "_"),
    }
}
