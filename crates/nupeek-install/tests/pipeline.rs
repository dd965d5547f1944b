use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use nupeek_fetch::PackageSource;
use nupeek_install::{
    DecompileError, Decompiler, ErrorKind, Phase, Pipeline, PipelineError, RunRequest, TargetSpec,
};
use nupeek_metadata::{InMemoryReader, MemberKind, ModuleMetadata, TypeDefinition};
use nupeek_version::PackageVersion;
use tempfile::TempDir;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use zip::write::SimpleFileOptions;

struct Feed {
    versions: Vec<&'static str>,
    archives: HashMap<String, Vec<u8>>,
    copy_calls: AtomicUsize,
    stall: Option<Arc<Notify>>,
}

impl Feed {
    fn new(versions: &[&'static str], archives: &[(&str, Vec<u8>)]) -> Self {
        Self {
            versions: versions.to_vec(),
            archives: archives.iter().map(|(v, b)| (v.to_string(), b.clone())).collect(),
            copy_calls: AtomicUsize::new(0),
            stall: None,
        }
    }

    /// Downloads signal `started` and then never finish.
    fn stalled(mut self, started: Arc<Notify>) -> Self {
        self.stall = Some(started);
        self
    }
}

impl PackageSource for Feed {
    fn name(&self) -> &str {
        "feed"
    }

    async fn list_versions(&self, _id: &str) -> nupeek_fetch::Result<Vec<PackageVersion>> {
        Ok(self.versions.iter().map(|v| PackageVersion::parse(v).unwrap()).collect())
    }

    async fn copy_archive(
        &self,
        _id: &str,
        version: &PackageVersion,
        sink: &mut Vec<u8>,
    ) -> nupeek_fetch::Result<bool> {
        self.copy_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(started) = &self.stall {
            started.notify_one();
            std::future::pending::<()>().await;
        }
        match self.archives.get(&version.normalized()) {
            Some(bytes) => {
                sink.extend_from_slice(bytes);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Clone, Default)]
struct FakeDecompiler {
    calls: Arc<AtomicUsize>,
    fail: bool,
    stall: Option<Arc<Notify>>,
}

impl Decompiler for FakeDecompiler {
    async fn decompile(&self, assembly: &Path, type_name: &str, output: &Path) -> Result<(), DecompileError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(started) = &self.stall {
            started.notify_one();
            std::future::pending::<()>().await;
        }
        if self.fail {
            return Err(DecompileError::Other(format!("cannot decompile {type_name}")));
        }
        fs::create_dir_all(output.parent().unwrap()).unwrap();
        fs::write(output, format!("// {type_name} from {}\n", assembly.display())).unwrap();
        Ok(())
    }
}

fn package_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn polly_zip() -> Vec<u8> {
    package_zip(&[
        ("Polly.nuspec", b"<package/>"),
        ("lib/netstandard2.0/Polly.dll", b"MZ"),
        ("lib/net8.0/Polly.dll", b"MZ"),
        ("lib/net8.0/Polly.Extra.dll", b"MZ"),
    ])
}

fn polly_types() -> ModuleMetadata {
    ModuleMetadata::new(vec![
        TypeDefinition::new("Polly", "Policy").with_member(MemberKind::Method, "Handle"),
        TypeDefinition::new("Polly", "AsyncPolicy`1").with_member(MemberKind::Method, "ExecuteAsync"),
    ])
}

fn extra_types() -> ModuleMetadata {
    ModuleMetadata::new(vec![
        TypeDefinition::new("Polly.Extra", "Runner").with_member(MemberKind::Method, "ExecuteAsync"),
    ])
}

struct Env {
    out: TempDir,
}

impl Env {
    fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
        Self { out: TempDir::new().unwrap() }
    }

    fn root(&self) -> &Path {
        self.out.path()
    }

    fn lib(&self, version: &str, tfm: &str, file: &str) -> PathBuf {
        self.root()
            .join(".cache/packages/polly")
            .join(version)
            .join("extracted/lib")
            .join(tfm)
            .join(file)
    }

    fn reader(&self) -> InMemoryReader {
        InMemoryReader::new()
            .with_module(self.lib("8.4.1", "net8.0", "Polly.dll"), polly_types())
            .with_module(self.lib("8.4.1", "net8.0", "Polly.Extra.dll"), extra_types())
            .with_module(self.lib("8.4.1", "netstandard2.0", "Polly.dll"), polly_types())
    }

    fn pipeline(&self, decompiler: FakeDecompiler) -> Pipeline<Feed, InMemoryReader, FakeDecompiler> {
        let feed = Feed::new(&["8.3.0", "8.4.1"], &[("8.4.1", polly_zip())]);
        Pipeline::new(vec![feed], self.reader(), decompiler)
    }

    fn request(&self, target: TargetSpec) -> RunRequest {
        RunRequest::new("Polly", target, self.root())
    }
}

#[tokio::test]
async fn repeated_runs_are_idempotent() {
    let env = Env::new();
    let decompiler = FakeDecompiler::default();
    let pipeline = env.pipeline(decompiler.clone());
    let request = env.request(TargetSpec::Type("Polly.Policy".into()));
    let cancel = CancellationToken::new();

    let first = pipeline.run(&request, &cancel).await.unwrap();
    let second = pipeline.run(&request, &cancel).await.unwrap();

    assert_eq!(first.version, "8.4.1");
    assert_eq!(first.tfm, "net8.0");
    assert_eq!(first.type_name, "Polly.Policy");
    assert_eq!(first.assembly_path, env.lib("8.4.1", "net8.0", "Polly.dll"));
    assert_eq!(
        first.output_path,
        env.root().join("packages/polly/8.4.1/net8.0/Polly_Policy.decompiled.cs")
    );
    assert_eq!(first.index_path, env.root().join("index.json"));
    assert_eq!(first.manifest_path, env.root().join("manifest.json"));

    assert_eq!(first.output_path, second.output_path);
    assert_eq!(first.index_path, second.index_path);
    assert_eq!(first.manifest_path, second.manifest_path);
    assert_eq!(decompiler.calls.load(Ordering::SeqCst), 2);
    assert_eq!(pipeline.sources()[0].copy_calls.load(Ordering::SeqCst), 1);

    let manifest: serde_json::Value =
        serde_json::from_slice(&fs::read(&first.manifest_path).unwrap()).unwrap();
    let entries = manifest.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["packageId"], "Polly");
    assert_eq!(entries[0]["typeName"], "Polly.Policy");

    let index: serde_json::Value = serde_json::from_slice(&fs::read(&first.index_path).unwrap()).unwrap();
    assert_eq!(index.as_object().unwrap().len(), 1);
    assert!(fs::read_to_string(&first.output_path).unwrap().starts_with("// Polly.Policy"));
}

#[tokio::test]
async fn member_symbol_records_declaring_type() {
    let env = Env::new();
    let pipeline = env.pipeline(FakeDecompiler::default());

    let result = pipeline
        .run(
            &env.request(TargetSpec::Symbol("Polly.Policy.Handle".into())).version("8.4.1"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.type_name, "Polly.Policy");
    let index: serde_json::Value = serde_json::from_slice(&fs::read(&result.index_path).unwrap()).unwrap();
    assert!(index.get("Polly.Policy").is_some());
}

#[tokio::test]
async fn explicit_tfm_and_generic_type() {
    let env = Env::new();
    let pipeline = env.pipeline(FakeDecompiler::default());

    let result = pipeline
        .run(
            &env.request(TargetSpec::Type("Polly.AsyncPolicy<TResult>".into()))
                .version("latest")
                .tfm("netstandard2.0"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.tfm, "netstandard2.0");
    assert_eq!(result.type_name, "Polly.AsyncPolicy`1");
    assert!(result.output_path.ends_with("netstandard2.0/Polly_AsyncPolicy_1.decompiled.cs"));
}

#[tokio::test]
async fn reports_every_phase_in_order() {
    let env = Env::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = {
        let seen = Arc::clone(&seen);
        move |phase: Phase| seen.lock().unwrap().push(phase)
    };
    let pipeline = env.pipeline(FakeDecompiler::default()).with_progress(sink);

    pipeline
        .run(&env.request(TargetSpec::Type("Polly.Policy".into())), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), Phase::ALL.to_vec());
}

#[tokio::test]
async fn ambiguous_member_maps_to_not_found_status() {
    let env = Env::new();
    let pipeline = env.pipeline(FakeDecompiler::default());

    let err = pipeline
        .run(
            &env.request(TargetSpec::Symbol("Whatever.ExecuteAsync".into())),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AmbiguousSymbol);
    assert_eq!(err.status_code(), 4);
    match err {
        PipelineError::AmbiguousSymbol { candidates, .. } => {
            assert_eq!(candidates, ["Polly.AsyncPolicy`1", "Polly.Extra.Runner"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn missing_type_keeps_package_cached() {
    let env = Env::new();
    let decompiler = FakeDecompiler::default();
    let pipeline = env.pipeline(decompiler.clone());

    let err = pipeline
        .run(&env.request(TargetSpec::Type("Polly.Missing".into())), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SymbolNotFound);
    assert_eq!(decompiler.calls.load(Ordering::SeqCst), 0);
    assert!(env.lib("8.4.1", "net8.0", "Polly.dll").is_file());
    assert!(!env.root().join("index.json").exists());
}

#[tokio::test]
async fn invalid_input_touches_nothing() {
    let env = Env::new();
    let pipeline = env.pipeline(FakeDecompiler::default());
    let cancel = CancellationToken::new();

    let bad_id = RunRequest::new("../evil", TargetSpec::Type("A".into()), env.root());
    let err = pipeline.run(&bad_id, &cancel).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(err.status_code(), 2);

    let bad_version = env.request(TargetSpec::Type("A".into())).version("not-a-version");
    assert_eq!(pipeline.run(&bad_version, &cancel).await.unwrap_err().kind(), ErrorKind::InvalidInput);

    let blank_target = env.request(TargetSpec::Symbol("   ".into()));
    assert_eq!(pipeline.run(&blank_target, &cancel).await.unwrap_err().kind(), ErrorKind::InvalidInput);

    assert!(!env.root().join(".cache").exists());
}

#[tokio::test]
async fn unknown_package_is_resolution_failure() {
    let env = Env::new();
    let pipeline = Pipeline::new(vec![Feed::new(&[], &[])], env.reader(), FakeDecompiler::default());

    let err = pipeline
        .run(&env.request(TargetSpec::Type("Polly.Policy".into())), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PackageResolution);
    assert_eq!(err.status_code(), 3);
}

#[tokio::test]
async fn hostile_archive_is_rejected() {
    let env = Env::new();
    let hostile = package_zip(&[("lib/net8.0/../../../../evil.txt", b"owned")]);
    let feed = Feed::new(&["1.0.0"], &[("1.0.0", hostile)]);
    let pipeline = Pipeline::new(vec![feed], env.reader(), FakeDecompiler::default());

    let err = pipeline
        .run(&env.request(TargetSpec::Type("Polly.Policy".into())), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArchiveSafety);
    assert_eq!(err.status_code(), 3);
    assert!(!env.root().join(".cache/packages/polly/evil.txt").exists());
}

#[tokio::test]
async fn decompiler_failure_skips_catalog() {
    let env = Env::new();
    let pipeline = env.pipeline(FakeDecompiler {
        fail: true,
        ..FakeDecompiler::default()
    });

    let err = pipeline
        .run(&env.request(TargetSpec::Type("Polly.Policy".into())), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decompilation);
    assert_eq!(err.status_code(), 5);
    assert!(!env.root().join("manifest.json").exists());
}

#[tokio::test]
async fn canceled_run_reports_canceled() {
    let env = Env::new();
    let pipeline = env.pipeline(FakeDecompiler::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = pipeline
        .run(&env.request(TargetSpec::Type("Polly.Policy".into())), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Canceled));
    assert_eq!(err.status_code(), 130);
}

#[tokio::test]
async fn cancel_during_decompile_stops_the_run() {
    let env = Env::new();
    let started = Arc::new(Notify::new());
    let pipeline = env.pipeline(FakeDecompiler {
        stall: Some(Arc::clone(&started)),
        ..FakeDecompiler::default()
    });
    let request = env.request(TargetSpec::Type("Polly.Policy".into()));
    let cancel = CancellationToken::new();

    let (result, ()) = tokio::join!(pipeline.run(&request, &cancel), async {
        started.notified().await;
        cancel.cancel();
    });

    let err = result.unwrap_err();
    assert!(matches!(err, PipelineError::Canceled));
    assert_eq!(err.status_code(), 130);
    assert!(!env.root().join("index.json").exists());
    assert!(!env.root().join("manifest.json").exists());
}

#[tokio::test]
async fn cancel_during_download_stops_the_run() {
    let env = Env::new();
    let started = Arc::new(Notify::new());
    let feed = Feed::new(&["8.4.1"], &[("8.4.1", polly_zip())]).stalled(Arc::clone(&started));
    let decompiler = FakeDecompiler::default();
    let pipeline = Pipeline::new(vec![feed], env.reader(), decompiler.clone());
    let request = env.request(TargetSpec::Type("Polly.Policy".into()));
    let cancel = CancellationToken::new();

    let (result, ()) = tokio::join!(pipeline.run(&request, &cancel), async {
        started.notified().await;
        cancel.cancel();
    });

    assert_eq!(result.unwrap_err().status_code(), 130);
    assert_eq!(decompiler.calls.load(Ordering::SeqCst), 0);
    assert!(!env.lib("8.4.1", "net8.0", "Polly.dll").exists());
    assert!(!env.root().join("manifest.json").exists());
}

#[tokio::test]
async fn framework_outside_lib_is_invalid_input() {
    let env = Env::new();
    let pipeline = env.pipeline(FakeDecompiler::default());
    let elsewhere = TempDir::new().unwrap();
    let cancel = CancellationToken::new();

    for tfm in ["../x", elsewhere.path().to_str().unwrap(), "net8.0/../../x"] {
        let request = env.request(TargetSpec::Type("Polly.Policy".into())).tfm(tfm);
        let err = pipeline.run(&request, &cancel).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput, "{tfm:?} should be rejected");
        assert!(pipeline.plan(&request).is_err());
    }

    assert!(!env.root().join(".cache").exists());
    assert_eq!(fs::read_dir(elsewhere.path()).unwrap().count(), 0);
}

#[test]
fn plan_does_no_io() {
    let env = Env::new();
    let pipeline = env.pipeline(FakeDecompiler::default());
    let root = env.root().join("not-created");

    let plan = pipeline
        .plan(&RunRequest::new("Polly", TargetSpec::Symbol("Polly.Policy.Handle".into()), &root).tfm("auto"))
        .unwrap();

    assert_eq!(plan.version, "latest");
    assert_eq!(plan.tfm, "auto");
    assert_eq!(plan.cache_root, root.join(".cache"));
    assert_eq!(plan.steps.first(), Some(&Phase::Resolving));
    assert!(!root.exists());

    let fixed = env.pipeline(FakeDecompiler::default()).with_cache_root("/srv/nupeek");
    let plan = fixed
        .plan(&RunRequest::new("Polly", TargetSpec::Type("Polly.Policy".into()), &root).version("8.4.1"))
        .unwrap();
    assert_eq!(plan.version, "8.4.1");
    assert_eq!(plan.cache_root, PathBuf::from("/srv/nupeek"));
}
