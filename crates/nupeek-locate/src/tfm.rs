use crate::error::{Error, Result};

/// Preferred target frameworks, best first.
pub const PREFERRED_TFMS: [&str; 7] = [
    "net10.0",
    "net9.0",
    "net8.0",
    "net7.0",
    "net6.0",
    "netstandard2.1",
    "netstandard2.0",
];

/// Choose the target framework folder to read from.
///
/// An explicit choice is returned trimmed and is not checked against `candidates`.
/// Otherwise the first entry of [`PREFERRED_TFMS`] present (case-insensitively) wins,
/// falling back to the case-insensitively smallest candidate. The fallback is only
/// deterministic, not "newest".
pub fn select_best_tfm<S: AsRef<str>>(candidates: &[S], explicit: Option<&str>) -> Result<String> {
    if let Some(tfm) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(tfm.to_string());
    }

    if candidates.is_empty() {
        return Err(Error::NoCandidates);
    }

    for preferred in PREFERRED_TFMS {
        if let Some(found) = candidates
            .iter()
            .map(AsRef::as_ref)
            .find(|c| c.eq_ignore_ascii_case(preferred))
        {
            return Ok(found.to_string());
        }
    }

    candidates
        .iter()
        .map(AsRef::as_ref)
        .min_by(|a, b| {
            a.to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b))
        })
        .map(str::to_string)
        .ok_or(Error::NoCandidates)
}
