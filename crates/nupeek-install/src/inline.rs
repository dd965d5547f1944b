use std::path::Path;

use serde::Serialize;

use crate::error::{PipelineError, Result};

/// Smallest accepted character budget for inline source.
pub const MIN_INLINE_CHARS: usize = 200;

/// Generated source, possibly cut short, for embedding in a response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineSource {
    pub content: String,
    /// Length of the full file in characters.
    pub original_chars: usize,
    pub truncated: bool,
}

pub fn read_inline_source(path: &Path, max_chars: usize) -> Result<InlineSource> {
    if max_chars < MIN_INLINE_CHARS {
        return Err(PipelineError::InvalidInput(format!(
            "max chars must be at least {MIN_INLINE_CHARS}, got {max_chars}"
        )));
    }

    let text = std::fs::read_to_string(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let original_chars = text.chars().count();
    if original_chars <= max_chars {
        return Ok(InlineSource {
            content: text,
            original_chars,
            truncated: false,
        });
    }

    Ok(InlineSource {
        content: text.chars().take(max_chars).collect(),
        original_chars,
        truncated: true,
    })
}
