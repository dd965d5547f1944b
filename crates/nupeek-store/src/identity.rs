use std::fmt;

use nupeek_version::PackageVersion;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A validated package id.
///
/// Ids are compared case-insensitively everywhere they act as a key; the original
/// casing is kept for display and for catalog records.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageId(String);

impl PackageId {
    /// Trim and validate `raw`.
    ///
    /// Accepts ASCII or Unicode alphanumerics plus `.`, `-` and `_`; rejects `..`
    /// anywhere, a leading or trailing `.` and any path separator.
    pub fn parse(raw: &str) -> Result<Self> {
        let id = raw.trim();
        let valid = !id.is_empty()
            && !id.contains("..")
            && !id.starts_with('.')
            && !id.ends_with('.')
            && id
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_'));
        if !valid {
            return Err(Error::InvalidPackageId(raw.to_string()));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-cased form used for paths and feed URLs.
    pub fn lower(&self) -> String {
        self.0.to_lowercase()
    }

    pub fn eq_ignore_case(&self, other: &str) -> bool {
        self.0.to_lowercase() == other.to_lowercase()
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PackageId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<PackageId> for String {
    fn from(id: PackageId) -> Self {
        id.0
    }
}

/// Validate an optional requested version. Blank means "not requested".
///
/// Returns the trimmed version string when one was given.
pub fn validate_version(raw: Option<&str>) -> Result<Option<String>> {
    let Some(version) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    PackageVersion::parse(version).map_err(|source| Error::InvalidVersion {
        version: version.to_string(),
        source,
    })?;
    Ok(Some(version.to_string()))
}
