//! Pick a target framework folder inside an extracted package and find the
//! type a symbol refers to.

pub use error::{Error, Result};
pub use locator::{Locator, MAX_SUGGESTIONS, MatchKind, ResolvedSymbol};
pub use normalize::normalize_type_name;
pub use symbol::{TargetSpec, member_name};
pub use tfm::{PREFERRED_TFMS, select_best_tfm};

mod error;
mod locator;
mod normalize;
mod symbol;
mod tfm;
