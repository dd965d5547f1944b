//! Version type and ordering.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

static VERSION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?<major>[0-9]+)(?:\.(?<minor>[0-9]+))?(?:\.(?<patch>[0-9]+))?(?:\.(?<revision>[0-9]+))?(?:-(?<pre>[0-9A-Za-z.-]+))?(?:\+(?<meta>[0-9A-Za-z.-]+))?$").unwrap()
});

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("version string is empty")]
    Empty,
    #[error("invalid version format: '{0}'")]
    InvalidFormat(String),
    #[error("version component out of range in '{0}'")]
    Overflow(String),
    #[error("invalid prerelease label '{label}': {reason}")]
    InvalidPrerelease { label: String, reason: String },
    #[error("invalid build metadata '{metadata}': {reason}")]
    InvalidMetadata { metadata: String, reason: String },
}

/// A parsed package version.
///
/// Equality and ordering ignore build metadata and compare prerelease labels
/// case-insensitively, so `1.0.0-Beta` and `1.0.0-beta+abc` are the same version.
#[derive(Debug, Clone)]
pub struct PackageVersion {
    major: u64,
    minor: u64,
    patch: u64,
    revision: u64,
    pre_release: Option<String>,
    metadata: Option<String>,
    original: String,
}

impl PackageVersion {
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(VersionError::Empty);
        }

        let caps = VERSION_REGEX
            .captures(trimmed)
            .ok_or_else(|| VersionError::InvalidFormat(trimmed.to_string()))?;

        let component = |name: &str| -> Result<u64, VersionError> {
            match caps.name(name) {
                Some(m) => m
                    .as_str()
                    .parse::<u64>()
                    .map_err(|_| VersionError::Overflow(trimmed.to_string())),
                None => Ok(0),
            }
        };

        let pre_release = match caps.name("pre") {
            Some(m) => {
                semver::Prerelease::new(m.as_str()).map_err(|e| {
                    VersionError::InvalidPrerelease {
                        label: m.as_str().to_string(),
                        reason: e.to_string(),
                    }
                })?;
                Some(m.as_str().to_string())
            }
            None => None,
        };

        let metadata = match caps.name("meta") {
            Some(m) => {
                semver::BuildMetadata::new(m.as_str()).map_err(|e| {
                    VersionError::InvalidMetadata {
                        metadata: m.as_str().to_string(),
                        reason: e.to_string(),
                    }
                })?;
                Some(m.as_str().to_string())
            }
            None => None,
        };

        Ok(Self {
            major: component("major")?,
            minor: component("minor")?,
            patch: component("patch")?,
            revision: component("revision")?,
            pre_release,
            metadata,
            original: trimmed.to_string(),
        })
    }

    pub fn major(&self) -> u64 { self.major }
    pub fn minor(&self) -> u64 { self.minor }
    pub fn patch(&self) -> u64 { self.patch }
    pub fn revision(&self) -> u64 { self.revision }

    pub fn pre_release(&self) -> Option<&str> {
        self.pre_release.as_deref()
    }

    pub fn metadata(&self) -> Option<&str> {
        self.metadata.as_deref()
    }

    /// The trimmed input this version was parsed from.
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn is_prerelease(&self) -> bool {
        self.pre_release.is_some()
    }

    /// Canonical form: three components (four when the revision is non-zero),
    /// prerelease kept, build metadata dropped.
    pub fn normalized(&self) -> String {
        let mut out = format!("{}.{}.{}", self.major, self.minor, self.patch);
        if self.revision > 0 {
            out.push_str(&format!(".{}", self.revision));
        }
        if let Some(pre) = &self.pre_release {
            out.push('-');
            out.push_str(pre);
        }
        out
    }

    /// View as a SemVer version when the revision component is unused.
    pub fn as_semver(&self) -> Option<semver::Version> {
        if self.revision != 0 {
            return None;
        }
        let mut version = semver::Version::new(self.major, self.minor, self.patch);
        if let Some(pre) = &self.pre_release {
            version.pre = semver::Prerelease::new(pre).ok()?;
        }
        if let Some(meta) = &self.metadata {
            version.build = semver::BuildMetadata::new(meta).ok()?;
        }
        Some(version)
    }

    fn release_key(&self) -> (u64, u64, u64, u64) {
        (self.major, self.minor, self.patch, self.revision)
    }
}

fn compare_labels(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(ln), Ok(rn)) => ln.cmp(&rn),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => l.to_ascii_lowercase().cmp(&r.to_ascii_lowercase()),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.release_key()
            .cmp(&other.release_key())
            .then_with(|| match (&self.pre_release, &other.pre_release) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => compare_labels(a, b),
            })
    }
}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PackageVersion {}

impl Hash for PackageVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.release_key().hash(state);
        self.pre_release
            .as_ref()
            .map(|p| p.to_ascii_lowercase())
            .hash(state);
    }
}

impl FromStr for PackageVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { PackageVersion::parse(s) }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized())
    }
}

impl Serialize for PackageVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.normalized())
    }
}

impl<'de> Deserialize<'de> for PackageVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        PackageVersion::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Highest version in `versions`, duplicates collapsed.
///
/// The result does not depend on the order of the input.
pub fn select_latest<I>(versions: I) -> Option<PackageVersion>
where
    I: IntoIterator<Item = PackageVersion>,
{
    versions.into_iter().max()
}
