use std::collections::BTreeSet;

use nupeek_version::PackageVersion;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::source::PackageSource;

/// Pick the version to acquire.
///
/// An explicit (non-blank) version is validated and returned trimmed without touching
/// the network. Otherwise every source is asked for its stable, listed versions and
/// the highest of the pooled set wins, so source order never changes the answer.
/// A source that fails is logged and skipped.
#[tracing::instrument(skip(sources, cancel), fields(sources = sources.len()))]
pub async fn resolve_version<S: PackageSource>(
    sources: &[S],
    id: &str,
    explicit: Option<&str>,
    cancel: &CancellationToken,
) -> Result<String> {
    if let Some(requested) = explicit.map(str::trim).filter(|v| !v.is_empty()) {
        PackageVersion::parse(requested).map_err(|source| Error::InvalidVersion {
            version: requested.to_string(),
            source,
        })?;
        return Ok(requested.to_string());
    }

    let mut pooled = BTreeSet::new();
    for source in sources {
        let listed = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Canceled),
            listed = source.list_versions(id) => listed,
        };
        match listed {
            Ok(versions) => pooled.extend(versions),
            Err(e) => tracing::warn!(source = source.name(), error = %e, "version query failed"),
        }
    }

    let latest = pooled
        .pop_last()
        .ok_or_else(|| Error::NotFound { id: id.to_string() })?;
    tracing::info!(id, version = %latest, "resolved latest version");
    Ok(latest.normalized())
}
