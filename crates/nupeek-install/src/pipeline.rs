//! Pipeline orchestrator.
//!
//! Stages run strictly in order: validate, acquire (resolve, download, extract),
//! locate, decompile, record in the index, record in the manifest. The first failure
//! stops the run. Nothing is rolled back: a package that was cached stays cached
//! even when a later stage fails.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use nupeek_archive::ExtractLimits;
use nupeek_catalog::{Catalog, ManifestEntry, output_path};
use nupeek_fetch::PackageSource;
use nupeek_locate::{Locator, TargetSpec};
use nupeek_metadata::MetadataReader;
use nupeek_store::{Acquirer, CacheLayout, PackageId, validate_version};
use tokio_util::sync::CancellationToken;

use crate::decompile::Decompiler;
use crate::error::{PipelineError, Result};
use crate::progress::{NoProgress, Phase, ProgressSink};
use crate::request::{AUTO_TFM, LATEST_VERSION, RunPlan, RunRequest, RunResult};

/// Cache directory created under the output root when no cache root is configured.
pub const CACHE_DIR_NAME: &str = ".cache";

pub struct Pipeline<S, R, D> {
    sources: Vec<Arc<S>>,
    locator: Arc<Locator<R>>,
    decompiler: D,
    cache_root: Option<PathBuf>,
    limits: ExtractLimits,
    progress: Arc<dyn ProgressSink>,
}

/// A request that passed validation.
struct Validated {
    id: PackageId,
    version: Option<String>,
    tfm: Option<String>,
    target: TargetSpec,
    output_root: PathBuf,
    cache_root: PathBuf,
}

impl<S, R, D> Pipeline<S, R, D>
where
    S: PackageSource,
    R: MetadataReader + 'static,
    D: Decompiler,
{
    pub fn new(sources: Vec<S>, reader: R, decompiler: D) -> Self {
        Self {
            sources: sources.into_iter().map(Arc::new).collect(),
            locator: Arc::new(Locator::new(reader)),
            decompiler,
            cache_root: None,
            limits: ExtractLimits::default(),
            progress: Arc::new(NoProgress),
        }
    }

    /// Use a fixed cache root instead of `<output_root>/.cache`.
    pub fn with_cache_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cache_root = Some(root.into());
        self
    }

    pub fn with_limits(mut self, limits: ExtractLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_progress(mut self, progress: impl ProgressSink + 'static) -> Self {
        self.progress = Arc::new(progress);
        self
    }

    pub fn sources(&self) -> &[Arc<S>] {
        &self.sources
    }

    pub fn cache_root_for(&self, output_root: &Path) -> PathBuf {
        self.cache_root
            .clone()
            .unwrap_or_else(|| output_root.join(CACHE_DIR_NAME))
    }

    /// Validate `request` and describe the run without performing it.
    pub fn plan(&self, request: &RunRequest) -> Result<RunPlan> {
        let valid = self.validate(request)?;
        Ok(RunPlan {
            package_id: valid.id.to_string(),
            version: valid.version.unwrap_or_else(|| LATEST_VERSION.to_string()),
            tfm: valid.tfm.unwrap_or_else(|| AUTO_TFM.to_string()),
            target: valid.target,
            output_root: valid.output_root,
            cache_root: valid.cache_root,
            steps: Phase::ALL.to_vec(),
        })
    }

    #[tracing::instrument(skip_all, fields(package = %request.package_id, target = %request.target))]
    pub async fn run(&self, request: &RunRequest, cancel: &CancellationToken) -> Result<RunResult> {
        let valid = self.validate(request)?;
        check(cancel)?;

        let acquirer = Acquirer::new(self.sources.clone(), CacheLayout::new(&valid.cache_root))
            .with_limits(self.limits);

        self.progress.on_phase(Phase::Resolving);
        let version = acquirer
            .resolve(&valid.id, valid.version.as_deref(), cancel)
            .await?;
        let package = acquirer.prepare(&valid.id, &version)?;
        tracing::info!(%version, "resolved package version");

        self.progress.on_phase(Phase::Downloading);
        acquirer.ensure_archive(&package, cancel).await?;

        self.progress.on_phase(Phase::Extracting);
        acquirer.ensure_extracted(&package, cancel).await?;
        check(cancel)?;

        self.progress.on_phase(Phase::Locating);
        let resolved = {
            let locator = Arc::clone(&self.locator);
            let extracted = package.extracted_path.clone();
            let target = valid.target.clone();
            let tfm = valid.tfm.clone();
            tokio::task::spawn_blocking(move || locator.locate(&extracted, &target, tfm.as_deref())).await??
        };
        check(cancel)?;

        let output = output_path(
            &valid.output_root,
            package.id.as_str(),
            &package.version,
            &resolved.tfm,
            &resolved.type_name,
        );

        self.progress.on_phase(Phase::Decompiling);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::Canceled),
            result = self.decompiler.decompile(&resolved.assembly_path, &resolved.type_name, &output) => result?,
        }
        check(cancel)?;

        self.progress.on_phase(Phase::Cataloging);
        let catalog = Catalog::new(&valid.output_root);
        let entry = ManifestEntry {
            package_id: package.id.to_string(),
            version: package.version.clone(),
            tfm: resolved.tfm.clone(),
            type_name: resolved.type_name.clone(),
            assembly_path: resolved.assembly_path.clone(),
            output_path: output.clone(),
            decompiled_at_utc: Utc::now(),
        };
        let (index_path, manifest_path) = {
            let type_name = resolved.type_name.clone();
            let output = output.clone();
            tokio::task::spawn_blocking(move || -> nupeek_catalog::Result<(PathBuf, PathBuf)> {
                let index = catalog.upsert_index(&type_name, &output)?;
                let manifest = catalog.upsert_manifest(entry)?;
                Ok((index, manifest))
            })
            .await??
        };

        self.progress.on_phase(Phase::Completed);
        tracing::info!(type_name = %resolved.type_name, output = %output.display(), "run completed");

        Ok(RunResult {
            package_id: package.id.to_string(),
            version: package.version,
            tfm: resolved.tfm,
            type_name: resolved.type_name,
            match_kind: resolved.match_kind,
            assembly_path: resolved.assembly_path,
            output_path: output,
            index_path,
            manifest_path,
        })
    }

    fn validate(&self, request: &RunRequest) -> Result<Validated> {
        let id = PackageId::parse(&request.package_id)?;
        let version = validate_version(request.explicit_version())?;

        let target = match &request.target {
            TargetSpec::Type(text) => TargetSpec::Type(text.trim().to_string()),
            TargetSpec::Symbol(text) => TargetSpec::Symbol(text.trim().to_string()),
        };
        if target.text().is_empty() {
            return Err(PipelineError::InvalidInput("type or symbol is required".into()));
        }
        if request.output_root.as_os_str().is_empty() {
            return Err(PipelineError::InvalidInput("output root is required".into()));
        }

        let tfm = request.explicit_tfm().map(str::to_string);
        if let Some(tfm) = &tfm {
            if !is_single_segment(tfm) {
                return Err(PipelineError::InvalidInput(format!(
                    "target framework {tfm:?} must be a single folder name"
                )));
            }
        }

        Ok(Validated {
            id,
            version,
            tfm,
            target,
            cache_root: self.cache_root_for(&request.output_root),
            output_root: request.output_root.clone(),
        })
    }
}

/// A TFM becomes one path segment under `lib/` and under the output tree.
fn is_single_segment(tfm: &str) -> bool {
    let mut components = Path::new(tfm).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn check(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(PipelineError::Canceled);
    }
    Ok(())
}
