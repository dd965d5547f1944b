use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use nupeek_metadata::{MetadataReader, ModuleMetadata};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::normalize::normalize_type_name;
use crate::symbol::{TargetSpec, member_name};
use crate::tfm::select_best_tfm;

/// Upper bound on the candidate type names reported for an ambiguous symbol.
pub const MAX_SUGGESTIONS: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// The request named the type itself.
    Exact,
    /// The request named a member; the type is its only declarer.
    Member,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedSymbol {
    pub tfm: String,
    pub tfm_dir: PathBuf,
    pub assembly_path: PathBuf,
    /// Normalized metadata name of the resolved type.
    pub type_name: String,
    pub match_kind: MatchKind,
}

/// Finds which module under `lib/<tfm>/` defines a requested type.
#[derive(Clone, Debug)]
pub struct Locator<R> {
    reader: R,
}

impl<R: MetadataReader> Locator<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    #[tracing::instrument(skip(self, extracted), fields(extracted = %extracted.display()))]
    pub fn locate(&self, extracted: &Path, target: &TargetSpec, tfm: Option<&str>) -> Result<ResolvedSymbol> {
        let text = target.text().trim();
        if text.is_empty() {
            return Err(Error::EmptySymbol);
        }

        let lib_dir = extracted.join("lib");
        if !lib_dir.is_dir() {
            return Err(Error::NoLibFolder(lib_dir));
        }

        let candidates = list_tfms(&lib_dir)?;
        if candidates.is_empty() {
            return Err(Error::NoTargetFrameworks(lib_dir));
        }

        let tfm = select_best_tfm(&candidates, tfm)?;
        let tfm_dir = lib_dir.join(&tfm);
        if !is_folder_name(&tfm) || !tfm_dir.is_dir() {
            return Err(Error::TfmNotFound { tfm });
        }
        tracing::debug!(%tfm, candidates = candidates.len(), "selected target framework");

        let wanted = normalize_type_name(text);
        let mut scanned = Vec::new();
        for path in list_modules(&tfm_dir)? {
            let Some(module) = self.read(&path) else {
                continue;
            };

            let hit = module
                .types
                .iter()
                .find(|ty| normalize_type_name(&ty.full_name()) == wanted)
                .map(|ty| ty.full_name());
            if let Some(type_name) = hit {
                tracing::info!(%type_name, assembly = %path.display(), "exact type match");
                return Ok(ResolvedSymbol {
                    tfm,
                    tfm_dir,
                    assembly_path: path,
                    type_name: normalize_type_name(&type_name),
                    match_kind: MatchKind::Exact,
                });
            }
            scanned.push((path, module));
        }

        let not_found = || Error::SymbolNotFound {
            symbol: text.to_string(),
            lib_dir: tfm_dir.clone(),
        };

        if !target.allows_member_fallback() {
            return Err(not_found());
        }
        let Some(member) = member_name(text) else {
            return Err(not_found());
        };

        let matches = declaring_types(&scanned, member);
        match matches.as_slice() {
            [] => Err(not_found()),
            [(path, type_name)] => {
                tracing::info!(%type_name, %member, assembly = %path.display(), "member match");
                Ok(ResolvedSymbol {
                    tfm,
                    tfm_dir: tfm_dir.clone(),
                    assembly_path: path.clone(),
                    type_name: type_name.clone(),
                    match_kind: MatchKind::Member,
                })
            }
            _ => {
                let candidates: BTreeSet<&str> = matches.iter().map(|(_, name)| name.as_str()).collect();
                tracing::warn!(%member, matches = matches.len(), "ambiguous member match");
                Err(Error::AmbiguousSymbol {
                    symbol: text.to_string(),
                    member: member.to_string(),
                    candidates: candidates
                        .into_iter()
                        .take(MAX_SUGGESTIONS)
                        .map(str::to_string)
                        .collect(),
                })
            }
        }
    }

    fn read(&self, path: &Path) -> Option<ModuleMetadata> {
        match self.reader.read_module(path) {
            Ok(module) => Some(module),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "skipping unreadable module");
                None
            }
        }
    }
}

/// Distinct `(module, type)` pairs whose type declares `member`, in scan order.
fn declaring_types(modules: &[(PathBuf, ModuleMetadata)], member: &str) -> Vec<(PathBuf, String)> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for (path, module) in modules {
        for ty in module.types.iter().filter(|ty| ty.declares_member(member)) {
            let pair = (path.clone(), normalize_type_name(&ty.full_name()));
            if seen.insert(pair.clone()) {
                out.push(pair);
            }
        }
    }
    out
}

fn list_tfms(lib_dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in read_dir(lib_dir)? {
        if entry.path().is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}

/// `*.dll` files directly under `dir`, sorted by path.
fn list_modules(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut modules: Vec<PathBuf> = read_dir(dir)?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("dll"))
        })
        .collect();
    modules.sort();
    Ok(modules)
}

fn read_dir(dir: &Path) -> Result<Vec<std::fs::DirEntry>> {
    let io = |source| Error::Io {
        path: dir.to_path_buf(),
        source,
    };
    std::fs::read_dir(dir)
        .map_err(io)?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(io)
}

fn is_folder_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
