//! End-to-end incremental builds against a temporary project directory.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use abforge_build::{
    BuildReport, BuildSession, BuildSettings, BundleCompiler, CompileError, CompileJob,
    CompiledBundle,
};
use abforge_cache::{dependency_table, BundleManifest, FingerprintStore};
use abforge_common::{ContentHash, ExportKind};
use abforge_config::Compression;
use abforge_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use abforge_graph::ReferenceSource;

struct Project {
    dir: tempfile::TempDir,
    refs: HashMap<String, Vec<String>>,
}

impl Project {
    /// hero and villain share shared.mat, which embeds detail.tex; hero also
    /// embeds hero.mat.
    fn new() -> Self {
        let mut project = Self {
            dir: tempfile::tempdir().unwrap(),
            refs: HashMap::new(),
        };
        project.asset("Assets/hero.prefab", "hero", &["Assets/hero.mat", "Assets/shared.mat"]);
        project.asset("Assets/villain.prefab", "villain", &["Assets/shared.mat"]);
        project.asset("Assets/hero.mat", "hero material", &[]);
        project.asset("Assets/shared.mat", "shared material", &["Assets/detail.tex"]);
        project.asset("Assets/detail.tex", "detail texture", &[]);
        project
    }

    fn asset(&mut self, path: &str, content: &str, refs: &[&str]) {
        self.write(path, content);
        self.refs
            .insert(path.to_string(), refs.iter().map(|r| r.to_string()).collect());
    }

    fn write(&self, path: &str, content: &str) {
        let file = self.dir.path().join(path);
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(file, content).unwrap();
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn bundle_dir(&self) -> PathBuf {
        self.root().join("AssetBundles").join("test")
    }

    fn cache_file(&self) -> PathBuf {
        self.root().join(".abforge").join("test").join("fingerprints.json")
    }

    fn settings(&self) -> BuildSettings {
        BuildSettings {
            project_dir: self.root().to_path_buf(),
            platform: "test".into(),
            bundle_dir: self.bundle_dir(),
            cache_file: self.cache_file(),
            dependency_file: self.bundle_dir().join("dep.all"),
            compression: Compression::Lz4,
            prune_stale: true,
            force: false,
            tool_version: "test".into(),
        }
    }

    fn read_output(&self, name: &str) -> Vec<u8> {
        std::fs::read(self.bundle_dir().join(name)).unwrap()
    }
}

impl ReferenceSource for Project {
    fn references(&self, path: &str) -> std::io::Result<Vec<String>> {
        Ok(self.refs.get(path).cloned().unwrap_or_default())
    }

    fn exists(&self, path: &str) -> bool {
        self.root().join(path).is_file()
    }

    fn is_builtin(&self, path: &str) -> bool {
        path.starts_with("Resources/")
    }
}

/// Concatenates the primary and embedded files; fails for configured assets.
#[derive(Default)]
struct ConcatCompiler {
    calls: AtomicUsize,
    failing: HashSet<String>,
}

impl ConcatCompiler {
    fn failing(asset: &str) -> Self {
        Self {
            failing: HashSet::from([asset.to_string()]),
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BundleCompiler for ConcatCompiler {
    fn compile(&self, job: &CompileJob) -> Result<CompiledBundle, CompileError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&job.asset_path) {
            return Err(CompileError::Failed {
                reason: "packer crashed".into(),
            });
        }
        let mut bytes = Vec::new();
        for file in std::iter::once(&job.source).chain(&job.embedded) {
            let content = std::fs::read(file).map_err(|e| CompileError::Io {
                path: file.clone(),
                source: e,
            })?;
            bytes.extend_from_slice(&content);
        }
        let fingerprint = ContentHash::from_bytes(&bytes).to_string();
        Ok(CompiledBundle { bytes, fingerprint })
    }
}

const HERO: &str = "assets.hero.prefab.ab";
const VILLAIN: &str = "assets.villain.prefab.ab";
const SHARED: &str = "assets.shared.mat.ab";

fn roots(paths: &[&str]) -> Vec<String> {
    paths.iter().map(|p| p.to_string()).collect()
}

fn both_roots() -> Vec<String> {
    roots(&["Assets/hero.prefab", "Assets/villain.prefab"])
}

fn build(
    project: &Project,
    settings: BuildSettings,
    compiler: &ConcatCompiler,
    roots: &[String],
) -> (BuildReport, Vec<Diagnostic>) {
    let sink = DiagnosticSink::new();
    let report = BuildSession::new(settings, project, compiler, &sink)
        .run(roots)
        .unwrap();
    (report, sink.take_all())
}

fn sorted(mut names: Vec<String>) -> Vec<String> {
    names.sort();
    names
}

#[test]
fn first_build_compiles_every_bundle() {
    let project = Project::new();
    let compiler = ConcatCompiler::default();
    let (report, diags) = build(&project, project.settings(), &compiler, &both_roots());

    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(compiler.calls(), 3);
    assert_eq!(sorted(report.compiled.clone()), [HERO, SHARED, VILLAIN]);
    assert_eq!(sorted(report.published.clone()), [HERO, SHARED, VILLAIN]);
    assert_eq!(report.exit_code(), 0);

    assert_eq!(project.read_output(HERO), b"herohero material");
    assert_eq!(project.read_output(SHARED), b"shared materialdetail texture");

    let info = project.bundle_dir().join(format!("{HERO}.info"));
    let manifest = BundleManifest::read(&info).unwrap();
    assert_eq!(manifest.dependencies, [SHARED]);
    assert_eq!(manifest.source_file_name, "hero.prefab");

    let table = dependency_table::read_file(&project.bundle_dir().join("dep.all")).unwrap();
    assert_eq!(table.len(), 3);
    let hero = table.get("Assets/hero.prefab").unwrap();
    assert_eq!(hero.export, ExportKind::Root);
    assert_eq!(hero.dependencies, ["Assets/shared.mat"]);
    assert_eq!(table.get("Assets/shared.mat").unwrap().export, ExportKind::Standalone);
    assert!(table.get("Assets/detail.tex").is_none());
    assert_eq!(table.full_name("villain.prefab"), Some("Assets/villain.prefab"));
}

#[test]
fn unchanged_rebuild_compiles_nothing_and_rewrites_identical_files() {
    let project = Project::new();
    build(&project, project.settings(), &ConcatCompiler::default(), &both_roots());
    let info = project.read_output(&format!("{HERO}.info"));
    let table = project.read_output("dep.all");
    let cache = std::fs::read(project.cache_file()).unwrap();

    let compiler = ConcatCompiler::default();
    let (report, diags) = build(&project, project.settings(), &compiler, &both_roots());

    assert!(diags.is_empty());
    assert_eq!(compiler.calls(), 0);
    assert!(report.compiled.is_empty());
    assert_eq!(report.skipped, [HERO, SHARED, VILLAIN]);
    assert_eq!(project.read_output(&format!("{HERO}.info")), info);
    assert_eq!(project.read_output("dep.all"), table);
    assert_eq!(std::fs::read(project.cache_file()).unwrap(), cache);
}

#[test]
fn embedded_change_rebuilds_its_bundle_and_every_consumer() {
    let project = Project::new();
    build(&project, project.settings(), &ConcatCompiler::default(), &both_roots());

    project.write("Assets/detail.tex", "detail texture v2");
    let compiler = ConcatCompiler::default();
    let (report, _) = build(&project, project.settings(), &compiler, &both_roots());

    assert_eq!(sorted(report.compiled.clone()), [HERO, SHARED, VILLAIN]);
    // Only the shared bundle's bytes changed.
    assert_eq!(report.published, [SHARED]);
    assert_eq!(sorted(report.reused.clone()), [HERO, VILLAIN]);
    assert_eq!(project.read_output(SHARED), b"shared materialdetail texture v2");
}

#[test]
fn root_change_rebuilds_bundles_it_uses() {
    let project = Project::new();
    build(&project, project.settings(), &ConcatCompiler::default(), &both_roots());

    project.write("Assets/hero.prefab", "hero v2");
    let compiler = ConcatCompiler::default();
    let (report, _) = build(&project, project.settings(), &compiler, &both_roots());

    assert_eq!(sorted(report.compiled.clone()), [HERO, SHARED]);
    assert_eq!(report.published, [HERO]);
    assert_eq!(report.reused, [SHARED]);
    assert_eq!(report.skipped, [VILLAIN]);
}

#[test]
fn corrupt_cache_falls_back_to_full_rebuild() {
    let project = Project::new();
    build(&project, project.settings(), &ConcatCompiler::default(), &both_roots());
    std::fs::write(project.cache_file(), "{ not json").unwrap();

    let compiler = ConcatCompiler::default();
    let (report, diags) = build(&project, project.settings(), &compiler, &both_roots());

    assert_eq!(compiler.calls(), 3);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, DiagnosticCode::CACHE_DISCARDED);
    assert_eq!(report.exit_code(), 0);

    let compiler = ConcatCompiler::default();
    build(&project, project.settings(), &compiler, &both_roots());
    assert_eq!(compiler.calls(), 0);
}

#[test]
fn forced_build_republishes_everything() {
    let project = Project::new();
    build(&project, project.settings(), &ConcatCompiler::default(), &both_roots());

    let mut settings = project.settings();
    settings.force = true;
    let compiler = ConcatCompiler::default();
    let (report, _) = build(&project, settings, &compiler, &both_roots());

    assert_eq!(compiler.calls(), 3);
    assert_eq!(sorted(report.published.clone()), [HERO, SHARED, VILLAIN]);
    assert!(report.reused.is_empty());
}

#[test]
fn forced_build_restores_a_deleted_bundle_dir() {
    let project = Project::new();
    build(&project, project.settings(), &ConcatCompiler::default(), &both_roots());
    let hero_before = project.read_output(HERO);
    std::fs::remove_dir_all(project.bundle_dir()).unwrap();

    let mut settings = project.settings();
    settings.force = true;
    let (report, diags) = build(&project, settings, &ConcatCompiler::default(), &both_roots());

    assert!(diags.is_empty());
    assert_eq!(sorted(report.published.clone()), [HERO, SHARED, VILLAIN]);
    for name in [HERO, SHARED, VILLAIN] {
        assert!(project.bundle_dir().join(name).is_file(), "{name}");
        assert!(project.bundle_dir().join(format!("{name}.info")).is_file(), "{name}");
    }
    assert_eq!(project.read_output(HERO), hero_before);
    let table = dependency_table::read_file(&project.bundle_dir().join("dep.all")).unwrap();
    assert_eq!(table.len(), 3);
}

#[test]
fn rebuilt_bundle_missing_from_disk_is_published() {
    let project = Project::new();
    build(&project, project.settings(), &ConcatCompiler::default(), &both_roots());
    std::fs::remove_file(project.bundle_dir().join(HERO)).unwrap();

    // A stale dependency list makes hero rebuild with unchanged output.
    let (mut store, _) = FingerprintStore::load(&project.cache_file(), "test");
    store.records.get_mut("Assets/hero.prefab").unwrap().dependencies = Vec::new();
    store.save(&project.cache_file()).unwrap();

    let compiler = ConcatCompiler::default();
    let (report, diags) = build(&project, project.settings(), &compiler, &both_roots());

    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(report.published, [HERO]);
    assert_eq!(report.reused, [SHARED]);
    assert!(project.bundle_dir().join(HERO).is_file());
}

#[test]
fn compile_failure_is_isolated_and_retried() {
    let project = Project::new();
    let compiler = ConcatCompiler::failing("Assets/villain.prefab");
    let (report, diags) = build(&project, project.settings(), &compiler, &both_roots());

    assert_eq!(report.failed, [VILLAIN]);
    assert_eq!(sorted(report.published.clone()), [HERO, SHARED]);
    assert_eq!(report.exit_code(), 1);
    assert!(diags
        .iter()
        .any(|d| d.code == DiagnosticCode::COMPILE_FAILED
            && d.asset.as_deref() == Some("Assets/villain.prefab")));
    assert!(!project.bundle_dir().join(VILLAIN).exists());
    assert!(!project.bundle_dir().join(format!("{VILLAIN}.info")).exists());
    let table = dependency_table::read_file(&project.bundle_dir().join("dep.all")).unwrap();
    assert!(table.get("Assets/villain.prefab").is_none());

    // The retried root drags the shared bundle it uses along.
    let compiler = ConcatCompiler::default();
    let (report, diags) = build(&project, project.settings(), &compiler, &both_roots());
    assert!(diags.is_empty());
    assert_eq!(sorted(report.compiled.clone()), [SHARED, VILLAIN]);
    assert_eq!(report.published, [VILLAIN]);
    assert_eq!(report.skipped, [HERO]);
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn dropped_root_prunes_its_bundles() {
    let project = Project::new();
    build(&project, project.settings(), &ConcatCompiler::default(), &both_roots());

    let (report, _) = build(
        &project,
        project.settings(),
        &ConcatCompiler::default(),
        &roots(&["Assets/hero.prefab"]),
    );

    // With one root left, shared.mat is packed into hero again.
    assert_eq!(report.compiled, [HERO]);
    assert_eq!(report.pruned, [SHARED, VILLAIN]);
    assert_eq!(
        project.read_output(HERO),
        b"herodetail texturehero materialshared material"
    );
    assert!(!project.bundle_dir().join(SHARED).exists());
    assert!(!project.bundle_dir().join(format!("{VILLAIN}.info")).exists());
}

#[test]
fn missing_reference_is_skipped() {
    let mut project = Project::new();
    let refs = ["Assets/shared.mat", "Assets/gone.png"];
    project.asset("Assets/villain.prefab", "villain", &refs);
    let compiler = ConcatCompiler::default();
    let (report, diags) = build(&project, project.settings(), &compiler, &both_roots());

    assert_eq!(report.compiled.len(), 3);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, DiagnosticCode::MISSING_REFERENCE);
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn builtin_references_never_become_bundles() {
    let mut project = Project::new();
    let builtin = "Resources/unity_builtin_extra";
    project.asset("Assets/hero.mat", "hero material", &[builtin]);
    project.asset("Assets/villain.prefab", "villain", &["Assets/shared.mat", builtin]);
    let compiler = ConcatCompiler::default();
    let (report, diags) = build(&project, project.settings(), &compiler, &both_roots());

    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(report.compiled.len(), 3);
    let table = dependency_table::read_file(&project.bundle_dir().join("dep.all")).unwrap();
    assert!(table.get("Resources/unity_builtin_extra").is_none());
}

#[test]
fn reference_cycle_is_reported_and_build_continues() {
    let mut project = Project::new();
    project.asset("Assets/detail.tex", "detail texture", &["Assets/shared.mat"]);
    let compiler = ConcatCompiler::default();
    let (report, diags) = build(&project, project.settings(), &compiler, &both_roots());

    assert!(diags.iter().any(|d| d.code == DiagnosticCode::CYCLE));
    assert_eq!(report.compiled.len(), 3);
    assert_eq!(report.exit_code(), 1);
}
