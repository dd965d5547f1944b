pub use acquire::{AcquiredPackage, Acquirer};
pub use error::{Error, Result};
pub use identity::{PackageId, validate_version};
pub use layout::CacheLayout;

mod acquire;
mod error;
mod identity;
mod layout;
