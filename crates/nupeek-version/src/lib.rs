//! Package version parsing, comparison, and selection.
//!
//! Versions follow the package-manager dialect of SemVer: one to four numeric
//! components, optional prerelease labels, optional build metadata.
//!
//! - `1.2.3`, `1.2.3.4`, `1.0.0-beta.2`, `2.0.0+sha.abc`

pub use self::version::{PackageVersion, VersionError, select_latest};

mod version;
