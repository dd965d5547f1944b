//! The full run for one request: acquire the package, locate the type, hand it to
//! the decompiler and record the output in the catalogs.
//!
//! Failures are classified into [`ErrorKind`]s with stable status codes so callers
//! can branch on the outcome without inspecting messages.

mod config;
mod decompile;
mod error;
mod inline;
mod pipeline;
mod progress;
mod request;

pub use config::{CACHE_ROOT_ENV, DECOMPILER_ENV, DecompilerCommand, PeekConfig};
pub use decompile::{CommandDecompiler, DecompileError, Decompiler};
pub use error::{ConfigError, ErrorKind, PipelineError, Result, STATUS_SUCCESS};
pub use inline::{InlineSource, MIN_INLINE_CHARS, read_inline_source};
pub use nupeek_locate::TargetSpec;
pub use pipeline::{CACHE_DIR_NAME, Pipeline};
pub use progress::{NoProgress, Phase, ProgressSink};
pub use request::{AUTO_TFM, LATEST_VERSION, RunPlan, RunRequest, RunResult};
