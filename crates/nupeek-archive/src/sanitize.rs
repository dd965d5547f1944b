use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Result of sanitizing an archive entry name.
#[derive(Clone, Debug)]
pub struct SanitizedPath {
    pub original: String,
    /// Normalized path relative to the destination. Empty when the entry names the root itself.
    pub relative: PathBuf,
    pub resolved: PathBuf,
}

/// Resolve an entry name against `base`, rejecting anything that would land outside it.
///
/// Both `/` and `\` are treated as separators. Absolute names, drive prefixes and `..`
/// segments that climb above the root are rejected; `..` inside the tree is folded.
pub fn sanitize_entry_path<B: AsRef<Path>>(entry_name: &str, base: B) -> Result<SanitizedPath> {
    let base = base.as_ref();
    let relative = normalize_entry_name(entry_name)?;
    let resolved = base.join(&relative);

    if !resolved.starts_with(base) {
        return Err(Error::ZipSlip {
            entry: entry_name.to_string(),
        });
    }

    Ok(SanitizedPath {
        original: entry_name.to_string(),
        relative,
        resolved,
    })
}

fn normalize_entry_name(entry_name: &str) -> Result<PathBuf> {
    if entry_name.contains('\0') {
        return Err(Error::InvalidPath(entry_name.to_string()));
    }

    let unified = entry_name.replace('\\', "/");
    let slip = || Error::ZipSlip {
        entry: entry_name.to_string(),
    };

    let mut parts: Vec<&OsStr> = Vec::new();
    for component in Path::new(&unified).components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop().ok_or_else(slip)?;
            }
            Component::RootDir | Component::Prefix(_) => return Err(slip()),
        }
    }

    Ok(parts.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> &'static Path {
        if cfg!(windows) {
            Path::new("C:/cache/extracted")
        } else {
            Path::new("/cache/extracted")
        }
    }

    #[test]
    fn plain_entry_resolves_under_base() {
        let result = sanitize_entry_path("lib/net8.0/Foo.dll", base()).unwrap();
        assert_eq!(result.relative, Path::new("lib/net8.0/Foo.dll"));
        assert!(result.resolved.starts_with(base()));
    }

    #[test]
    fn backslash_separators_are_normalized() {
        let result = sanitize_entry_path("lib\\net8.0\\Foo.dll", base()).unwrap();
        assert_eq!(result.relative, Path::new("lib/net8.0/Foo.dll"));
    }

    #[test]
    fn inner_parent_segments_fold() {
        let result = sanitize_entry_path("lib/x/../Foo.dll", base()).unwrap();
        assert_eq!(result.relative, Path::new("lib/Foo.dll"));
    }

    #[test]
    fn leading_parent_segment_is_rejected() {
        for name in ["../evil.txt", "lib/../../evil.txt", "..\\evil.txt", "./../evil"] {
            let result = sanitize_entry_path(name, base());
            assert!(matches!(result, Err(Error::ZipSlip { .. })), "{name}");
        }
    }

    #[test]
    fn absolute_entry_is_rejected() {
        let result = sanitize_entry_path("/etc/passwd", base());
        assert!(matches!(result, Err(Error::ZipSlip { .. })));
    }

    #[test]
    fn null_byte_is_rejected() {
        let result = sanitize_entry_path("lib/a\0.dll", base());
        assert!(matches!(result, Err(Error::InvalidPath(_))));
    }

    #[test]
    fn root_reference_is_empty_relative() {
        let result = sanitize_entry_path("lib/..", base()).unwrap();
        assert!(result.relative.as_os_str().is_empty());
    }
}
