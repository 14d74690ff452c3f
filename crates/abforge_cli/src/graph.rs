//! `abforge graph`: prints how every asset would be bundled.

use std::fmt::Write;

use abforge_build::{BuildSession, BuildSettings};
use abforge_config::resolve_platform;
use abforge_diagnostics::DiagnosticSink;
use abforge_graph::AssetGraph;

use crate::compiler::ContainerCompiler;
use crate::pipeline::{render_diagnostics, resolve_project_root, scan_roots, SidecarReferences};
use crate::{GlobalArgs, GraphArgs, ReportFormat};

/// Runs the `abforge graph` command.
///
/// Analyzes the project without hashing or compiling anything and prints
/// one line per asset.
pub fn run(args: &GraphArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = resolve_project_root(global)?;
    let config = abforge_config::load_config(&project_dir)?;
    let platform = resolve_platform(&config, &project_dir, None)?;
    let roots = scan_roots(&project_dir, &config.build)?;

    let settings = BuildSettings::new(&project_dir, &platform, &config.build);
    let source = SidecarReferences::new(&project_dir, &config.build.builtin_prefixes);
    let compiler = ContainerCompiler::new(&project_dir);
    let sink = DiagnosticSink::new();
    let session = BuildSession::new(settings, &source, &compiler, &sink);

    let graph = session.analyze(&roots)?;
    print!("{}", render_graph(&graph, args.bundles_only));

    render_diagnostics(&sink, ReportFormat::Text, global.color);
    Ok(if sink.has_errors() { 1 } else { 0 })
}

/// Renders a graph as one line per asset, sorted by path.
///
/// Bundle lines list the bundles they depend on after `->`.
pub fn render_graph(graph: &AssetGraph, bundles_only: bool) -> String {
    let mut nodes: Vec<_> = graph
        .iter()
        .filter(|(_, node)| !bundles_only || node.is_self_exported())
        .collect();
    nodes.sort_by(|a, b| a.1.path.cmp(&b.1.path));

    let mut out = String::new();
    for (id, node) in nodes {
        let kind = if node.is_builtin() {
            "builtin".to_string()
        } else {
            node.export.to_string()
        };
        if !node.is_self_exported() {
            let _ = writeln!(out, "{kind:<10} {}", node.path);
            continue;
        }
        let mut deps: Vec<&str> = graph
            .collect_effective_dependencies(id)
            .into_iter()
            .map(|dep| graph.node(dep).bundle_name.as_str())
            .collect();
        deps.sort_unstable();
        let _ = write!(out, "{kind:<10} {} ({})", node.path, node.bundle_name);
        if !deps.is_empty() {
            let _ = write!(out, " -> {}", deps.join(", "));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use abforge_common::ContentKind;
    use abforge_graph::{classify, merge_shared};

    fn shared_material_graph() -> AssetGraph {
        let mut g = AssetGraph::new();
        let hero = g.insert("Assets/hero.prefab", ContentKind::Content);
        let villain = g.insert("Assets/villain.prefab", ContentKind::Content);
        let shared = g.insert("Assets/shared.mat", ContentKind::Content);
        let detail = g.insert("Assets/detail.png", ContentKind::Content);
        g.designate_root("Assets/hero.prefab").unwrap();
        g.designate_root("Assets/villain.prefab").unwrap();
        g.add_edge(hero, shared).unwrap();
        g.add_edge(villain, shared).unwrap();
        g.add_edge(hero, detail).unwrap();
        merge_shared(&mut g).unwrap();
        classify(&mut g);
        g
    }

    #[test]
    fn renders_every_asset() {
        let out = render_graph(&shared_material_graph(), false);
        assert_eq!(
            out,
            "embedded   Assets/detail.png\n\
             root       Assets/hero.prefab (assets.hero.prefab.ab) -> assets.shared.mat.ab\n\
             standalone Assets/shared.mat (assets.shared.mat.ab)\n\
             root       Assets/villain.prefab (assets.villain.prefab.ab) -> assets.shared.mat.ab\n"
        );
    }

    #[test]
    fn bundles_only_hides_embedded_assets() {
        let out = render_graph(&shared_material_graph(), true);
        assert!(!out.contains("detail.png"));
        assert_eq!(out.lines().count(), 3);
    }
}
