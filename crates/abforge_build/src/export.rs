//! Compiling and publishing bundles, and the files written next to them.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use abforge_cache::bundle_manifest::MANIFEST_EXTENSION;
use abforge_cache::BundleRecord;
use abforge_common::AssetId;
use abforge_graph::{short_name, AssetGraph, BUNDLE_EXTENSION};
use rayon::prelude::*;
use tracing::debug;

use crate::compiler::{BundleCompiler, CompileError, CompileJob, CompiledBundle};
use crate::error::BuildError;
use crate::planner::Plan;
use crate::settings::BuildSettings;

/// Builds a compile job for every bundle the plan says to export, ordered by
/// asset path.
pub fn collect_jobs(
    graph: &AssetGraph,
    plan: &Plan,
    settings: &BuildSettings,
) -> Vec<CompileJob> {
    let mut jobs: Vec<CompileJob> = graph
        .ids()
        .filter(|&id| plan.should_export(graph, id))
        .map(|id| {
            let node = graph.node(id);
            CompileJob {
                asset: id,
                asset_path: node.path.clone(),
                bundle_name: node.bundle_name.clone(),
                source: settings.asset_file(&node.path),
                embedded: graph
                    .collect_embedded_assets(id)
                    .into_iter()
                    .map(|dep| settings.asset_file(graph.path(dep)))
                    .collect(),
                compression: settings.compression,
            }
        })
        .collect();
    jobs.sort_by(|a, b| a.asset_path.cmp(&b.asset_path));
    jobs
}

/// Compiles every job on the rayon pool. Results come back in job order.
pub fn compile_all(
    jobs: Vec<CompileJob>,
    compiler: &dyn BundleCompiler,
) -> Vec<(CompileJob, Result<CompiledBundle, CompileError>)> {
    jobs.into_par_iter()
        .map(|job| {
            debug!("compiling {}", job.bundle_name);
            let result = compiler.compile(&job);
            (job, result)
        })
        .collect()
}

/// Writes bundle bytes into `bundle_dir`, returning the written path.
pub fn publish(bundle_dir: &Path, bundle_name: &str, bytes: &[u8]) -> Result<PathBuf, BuildError> {
    let path = bundle_dir.join(bundle_name);
    std::fs::write(&path, bytes).map_err(|e| BuildError::io(&path, e))?;
    Ok(path)
}

/// Dependency table records for every bundle-producing asset, skipping the
/// ones in `failed`.
pub fn dependency_records(
    graph: &AssetGraph,
    plan: &Plan,
    failed: &HashSet<AssetId>,
) -> Vec<BundleRecord> {
    graph
        .iter()
        .filter(|(id, node)| node.is_self_exported() && !failed.contains(id))
        .filter_map(|(id, node)| {
            let entry = plan.entry(id);
            Some(BundleRecord {
                name: node.path.clone(),
                short_name: short_name(&node.path).to_string(),
                hash: entry.hash?.to_string(),
                export: node.export,
                dependencies: entry.dependencies.clone(),
            })
        })
        .collect()
}

/// Deletes bundles in `bundle_dir` whose names are not in `live`, together
/// with their manifests. Returns the deleted bundle names, sorted.
pub fn prune_stale(
    bundle_dir: &Path,
    live: &HashSet<String>,
) -> Result<Vec<String>, BuildError> {
    let entries = match std::fs::read_dir(bundle_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(BuildError::io(bundle_dir, e)),
    };

    let mut stale = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(|e| BuildError::io(bundle_dir, e))?;
        let path = entry.path();
        let is_bundle = path.extension().and_then(|e| e.to_str()) == Some(BUNDLE_EXTENSION);
        if !path.is_file() || !is_bundle {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if !live.contains(name) {
                stale.insert(name.to_string());
            }
        }
    }

    for name in &stale {
        let bundle = bundle_dir.join(name);
        std::fs::remove_file(&bundle).map_err(|e| BuildError::io(&bundle, e))?;
        let manifest = bundle_dir.join(format!("{name}.{MANIFEST_EXTENSION}"));
        match std::fs::remove_file(&manifest) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(BuildError::io(&manifest, e)),
        }
        debug!("pruned stale bundle {name}");
    }
    Ok(stale.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use abforge_cache::FingerprintStore;
    use abforge_common::{ContentHash, ContentKind, ExportKind};
    use abforge_config::Compression;

    struct Echo {
        calls: AtomicUsize,
    }

    impl BundleCompiler for Echo {
        fn compile(&self, job: &CompileJob) -> Result<CompiledBundle, CompileError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if job.asset_path.contains("broken") {
                return Err(CompileError::Failed {
                    reason: "bad input".into(),
                });
            }
            Ok(CompiledBundle {
                bytes: job.asset_path.as_bytes().to_vec(),
                fingerprint: job.bundle_name.clone(),
            })
        }
    }

    fn settings(dir: &Path) -> BuildSettings {
        BuildSettings {
            project_dir: dir.to_path_buf(),
            platform: "test".into(),
            bundle_dir: dir.join("out"),
            cache_file: dir.join("cache.json"),
            dependency_file: dir.join("out").join("dep.all"),
            compression: Compression::Lz4,
            prune_stale: false,
            force: false,
            tool_version: "test".into(),
        }
    }

    fn planned() -> (AssetGraph, Plan) {
        let mut g = AssetGraph::new();
        let r = g.insert("Assets/r.prefab", ContentKind::Content);
        let m = g.insert("Assets/m.mat", ContentKind::Content);
        let s = g.insert("Assets/s.mat", ContentKind::Content);
        let b = g.insert("Assets/broken.prefab", ContentKind::Content);
        g.designate_root("Assets/r.prefab").unwrap();
        g.designate_root("Assets/broken.prefab").unwrap();
        g.node_mut(s).export = ExportKind::Standalone;
        g.add_edge(r, m).unwrap();
        g.add_edge(m, s).unwrap();
        g.add_edge(b, s).unwrap();
        let hashes: Vec<_> = g
            .iter()
            .map(|(_, n)| Some(ContentHash::from_bytes(n.path.as_bytes())))
            .collect();
        let plan = crate::planner::plan(&mut g, &FingerprintStore::new("test"), &hashes, false);
        (g, plan)
    }

    #[test]
    fn jobs_carry_embedded_files_in_path_order() {
        let dir = tempfile::tempdir().unwrap();
        let (g, plan) = planned();
        let jobs = collect_jobs(&g, &plan, &settings(dir.path()));
        let names: Vec<&str> = jobs.iter().map(|j| j.asset_path.as_str()).collect();
        assert_eq!(names, ["Assets/broken.prefab", "Assets/r.prefab", "Assets/s.mat"]);
        let r = &jobs[1];
        assert_eq!(r.bundle_name, "assets.r.prefab.ab");
        assert_eq!(r.embedded, vec![dir.path().join("Assets/m.mat")]);
        assert!(jobs[2].embedded.is_empty());
    }

    #[test]
    fn compile_all_keeps_order_and_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let (g, plan) = planned();
        let compiler = Echo {
            calls: AtomicUsize::new(0),
        };
        let results = compile_all(collect_jobs(&g, &plan, &settings(dir.path())), &compiler);
        assert_eq!(compiler.calls.load(Ordering::SeqCst), 3);
        assert!(results[0].1.is_err());
        assert!(results[1].1.is_ok());
        assert!(results[2].1.is_ok());
    }

    #[test]
    fn dependency_records_skip_failed_and_embedded() {
        let (g, plan) = planned();
        let failed = HashSet::from([g.lookup("Assets/broken.prefab").unwrap()]);
        let records = dependency_records(&g, &plan, &failed);
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Assets/r.prefab", "Assets/s.mat"]);
        assert_eq!(records[0].short_name, "r.prefab");
        assert_eq!(records[0].dependencies, ["Assets/s.mat"]);
        assert_eq!(records[1].export, ExportKind::Standalone);
    }

    #[test]
    fn publish_writes_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let path = publish(dir.path(), "a.prefab.ab", b"bytes").unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"bytes");
    }

    #[test]
    fn prune_removes_only_stale_bundles() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["live.ab", "live.ab.info", "old.ab", "old.ab.info", "dep.all", "notes.txt"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }
        let live = HashSet::from(["live.ab".to_string()]);
        let pruned = prune_stale(dir.path(), &live).unwrap();
        assert_eq!(pruned, ["old.ab"]);
        assert!(dir.path().join("live.ab").exists());
        assert!(dir.path().join("live.ab.info").exists());
        assert!(!dir.path().join("old.ab").exists());
        assert!(!dir.path().join("old.ab.info").exists());
        assert!(dir.path().join("dep.all").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn prune_of_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let pruned = prune_stale(&dir.path().join("nope"), &HashSet::new()).unwrap();
        assert!(pruned.is_empty());
    }
}
