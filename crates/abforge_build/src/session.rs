//! One build invocation from roots to persisted output.

use std::collections::{HashMap, HashSet};

use abforge_cache::{
    dependency_table, BundleManifest, CacheRecord, FingerprintStore, StoreStatus,
};
use abforge_common::{AssetId, ContentHash};
use abforge_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use abforge_graph::{classify, discover, merge_shared, short_name, AssetGraph, ReferenceSource};
use tracing::info;

use crate::compiler::BundleCompiler;
use crate::error::BuildError;
use crate::export::{collect_jobs, compile_all, dependency_records, prune_stale, publish};
use crate::planner::{hash_assets, plan, Plan};
use crate::report::BuildReport;
use crate::settings::BuildSettings;

/// A build over one project and platform.
///
/// The session owns no global state: everything it reads and writes comes
/// from its [`BuildSettings`] and collaborators.
pub struct BuildSession<'a> {
    settings: BuildSettings,
    source: &'a dyn ReferenceSource,
    compiler: &'a dyn BundleCompiler,
    sink: &'a DiagnosticSink,
}

impl<'a> BuildSession<'a> {
    /// Creates a session.
    pub fn new(
        settings: BuildSettings,
        source: &'a dyn ReferenceSource,
        compiler: &'a dyn BundleCompiler,
        sink: &'a DiagnosticSink,
    ) -> Self {
        Self {
            settings,
            source,
            compiler,
            sink,
        }
    }

    /// The session's settings.
    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    /// Discovers the graph from `roots` and finalizes its classification.
    pub fn analyze(&self, roots: &[String]) -> Result<AssetGraph, BuildError> {
        let mut graph = AssetGraph::new();
        let discovered = discover(&mut graph, roots, self.source, self.sink);
        let merged = merge_shared(&mut graph)?;
        let promoted = classify(&mut graph);
        info!(
            "{} assets from {} roots, {} shared, {} promoted to standalone",
            discovered.assets, discovered.roots, merged, promoted
        );
        Ok(graph)
    }

    /// Runs a full incremental build.
    ///
    /// Bundle-level failures are reported through the diagnostic sink and the
    /// report; only failures to persist output abort the run.
    pub fn run(&self, roots: &[String]) -> Result<BuildReport, BuildError> {
        let settings = &self.settings;
        let mut graph = self.analyze(roots)?;
        let store = self.load_store();
        let hashes = self.hash(&graph);
        let plan = plan(&mut graph, &store, &hashes, settings.force);

        std::fs::create_dir_all(&settings.bundle_dir)
            .map_err(|e| BuildError::io(&settings.bundle_dir, e))?;

        let mut report = BuildReport {
            platform: settings.platform.clone(),
            ..BuildReport::default()
        };
        let mut failed: HashSet<AssetId> = graph
            .iter()
            .filter(|(id, node)| node.is_self_exported() && plan.entry(*id).hash.is_none())
            .map(|(id, _)| id)
            .collect();
        let mut fingerprints: HashMap<AssetId, String> = HashMap::new();

        for (job, result) in compile_all(collect_jobs(&graph, &plan, settings), self.compiler) {
            match result {
                Ok(bundle) => {
                    let previous = plan.entry(job.asset).previous_fingerprint.as_deref();
                    let on_disk = settings.bundle_dir.join(&job.bundle_name).is_file();
                    let new_output = !on_disk || previous != Some(bundle.fingerprint.as_str());
                    if new_output {
                        publish(&settings.bundle_dir, &job.bundle_name, &bundle.bytes)?;
                        report.published.push(job.bundle_name.clone());
                    } else {
                        report.reused.push(job.bundle_name.clone());
                    }
                    let node = graph.node_mut(job.asset);
                    node.exported = true;
                    node.flags.new_build_output = new_output;
                    report.compiled.push(job.bundle_name);
                    fingerprints.insert(job.asset, bundle.fingerprint);
                }
                Err(e) => {
                    self.sink.emit(
                        Diagnostic::error(
                            DiagnosticCode::COMPILE_FAILED,
                            format!("failed to compile {}: {e}", job.bundle_name),
                        )
                        .with_asset(job.asset_path.as_str()),
                    );
                    failed.insert(job.asset);
                }
            }
        }

        let mut bundles: Vec<(AssetId, &str)> = graph
            .iter()
            .filter(|(_, node)| node.is_self_exported())
            .map(|(id, node)| (id, node.bundle_name.as_str()))
            .collect();
        bundles.sort_by(|a, b| a.1.cmp(b.1));
        for &(id, name) in &bundles {
            if failed.contains(&id) {
                report.failed.push(name.to_string());
            } else if !graph.node(id).exported {
                report.skipped.push(name.to_string());
            }
        }

        self.write_manifests(&graph, &plan, &fingerprints, &failed)?;

        if let Some(parent) = settings.dependency_file.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
        }
        dependency_table::write_file(
            &settings.dependency_file,
            &dependency_records(&graph, &plan, &failed),
        )?;

        if settings.prune_stale {
            let live: HashSet<String> = bundles.iter().map(|(_, name)| name.to_string()).collect();
            report.pruned = prune_stale(&settings.bundle_dir, &live)?;
        }

        self.store_after(&graph, &plan, &fingerprints, &failed)
            .save(&settings.cache_file)?;

        report.errors = self.sink.error_count();
        info!("{}: {report}", settings.platform);
        Ok(report)
    }

    fn load_store(&self) -> FingerprintStore {
        let (store, status) =
            FingerprintStore::load(&self.settings.cache_file, &self.settings.tool_version);
        if let StoreStatus::Discarded { reason } = status {
            self.sink.emit(
                Diagnostic::warning(
                    DiagnosticCode::CACHE_DISCARDED,
                    format!("fingerprint store discarded ({reason}), rebuilding everything"),
                )
                .with_asset(self.settings.cache_file.display().to_string()),
            );
        }
        store
    }

    fn hash(&self, graph: &AssetGraph) -> Vec<Option<ContentHash>> {
        hash_assets(graph, &self.settings.project_dir)
            .into_iter()
            .zip(graph.iter())
            .map(|(result, (_, node))| match result {
                Ok(hash) => Some(hash),
                Err(e) => {
                    self.sink.emit(
                        Diagnostic::error(DiagnosticCode::UNREADABLE_SOURCE, e.to_string())
                            .with_asset(node.path.as_str()),
                    );
                    None
                }
            })
            .collect()
    }

    fn write_manifests(
        &self,
        graph: &AssetGraph,
        plan: &Plan,
        fingerprints: &HashMap<AssetId, String>,
        failed: &HashSet<AssetId>,
    ) -> Result<(), BuildError> {
        for (id, node) in graph.iter() {
            if !node.is_self_exported() || failed.contains(&id) {
                continue;
            }
            let Some(fingerprint) = fingerprints
                .get(&id)
                .or(plan.entry(id).previous_fingerprint.as_ref())
            else {
                continue;
            };
            let dependencies = graph
                .collect_effective_dependencies(id)
                .into_iter()
                .map(|dep| graph.node(dep).bundle_name.clone())
                .collect();
            BundleManifest::new(
                node.bundle_name.as_str(),
                fingerprint.as_str(),
                short_name(&node.path),
                dependencies,
            )
            .write_to(&self.settings.bundle_dir)?;
        }
        Ok(())
    }

    fn store_after(
        &self,
        graph: &AssetGraph,
        plan: &Plan,
        fingerprints: &HashMap<AssetId, String>,
        failed: &HashSet<AssetId>,
    ) -> FingerprintStore {
        let mut store = FingerprintStore::new(&self.settings.tool_version);
        for (id, node) in graph.iter() {
            let entry = plan.entry(id);
            let Some(content_hash) = entry.hash else {
                continue;
            };
            if failed.contains(&id) {
                continue;
            }
            let output_fingerprint = if node.is_self_exported() {
                fingerprints
                    .get(&id)
                    .cloned()
                    .or_else(|| entry.previous_fingerprint.clone())
            } else {
                None
            };
            store.insert(
                node.path.clone(),
                CacheRecord {
                    content_hash,
                    output_fingerprint,
                    dependencies: entry.dependencies.clone(),
                },
            );
        }
        store
    }
}
