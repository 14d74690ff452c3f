//! Shared pipeline helpers for CLI commands.
//!
//! Contains project root resolution, root asset scanning, the file-system
//! reference source read from `.refs` sidecar files, and diagnostic rendering.

use std::path::{Path, PathBuf};

use abforge_config::{BuildConfig, CONFIG_FILE};
use abforge_diagnostics::{DiagnosticRenderer, DiagnosticSink, TerminalRenderer};
use abforge_graph::{normalize_asset_path, ReferenceSource};

use crate::{GlobalArgs, ReportFormat};

/// Extension of the sidecar file listing an asset's references.
pub const REFERENCES_EXTENSION: &str = "refs";

/// Walks up from `start` looking for the nearest directory containing `abforge.toml`.
///
/// Returns the directory containing `abforge.toml`, or an error if none is found.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the project root directory from global CLI args.
///
/// If `--config` is specified, uses that path (file → parent dir, dir → itself).
/// Otherwise walks up from the current directory looking for `abforge.toml`.
pub fn resolve_project_root(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(ref config_path) = global.config {
        let p = PathBuf::from(config_path);
        if p.is_file() {
            Ok(p.parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".")))
        } else {
            Ok(p)
        }
    } else {
        find_project_root(&std::env::current_dir()?)
    }
}

/// Finds the root assets of a build: every file under the configured root
/// directories whose extension is a root extension.
///
/// Returns project-relative asset paths with `/` separators, sorted.
pub fn scan_roots(
    project_dir: &Path,
    build: &BuildConfig,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    for root in &build.roots {
        let dir = project_dir.join(root);
        if !dir.is_dir() {
            return Err(format!("root directory {} does not exist", dir.display()).into());
        }
        walk_dir(&dir, &build.root_extensions, &mut files)?;
    }

    let mut roots: Vec<String> = files
        .iter()
        .filter_map(|file| file.strip_prefix(project_dir).ok())
        .filter_map(|relative| normalize_asset_path(&asset_path(relative)))
        .collect();
    roots.sort();
    roots.dedup();
    Ok(roots)
}

/// Recursively walks a directory collecting files with one of `extensions`.
fn walk_dir(
    dir: &Path,
    extensions: &[String],
    files: &mut Vec<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            walk_dir(&path, extensions, files)?;
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| extensions.iter().any(|x| x == e))
        {
            files.push(path);
        }
    }
    Ok(())
}

/// Converts a project-relative file path into an asset path.
fn asset_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Reads asset references from sidecar files.
///
/// The references of `Assets/hero.prefab` are listed in
/// `Assets/hero.prefab.refs`, one project-relative asset path per line. Blank
/// lines and lines starting with `#` are ignored; an asset without a sidecar
/// file references nothing. References come back in canonical form; one that
/// points outside the project is passed through as written for discovery to
/// reject.
pub struct SidecarReferences {
    project_dir: PathBuf,
    builtin_prefixes: Vec<String>,
}

impl SidecarReferences {
    /// Creates a reference source for a project.
    pub fn new(project_dir: &Path, builtin_prefixes: &[String]) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
            builtin_prefixes: builtin_prefixes.to_vec(),
        }
    }
}

impl ReferenceSource for SidecarReferences {
    fn references(&self, path: &str) -> std::io::Result<Vec<String>> {
        let sidecar = self
            .project_dir
            .join(format!("{path}.{REFERENCES_EXTENSION}"));
        let text = match std::fs::read_to_string(&sidecar) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| normalize_asset_path(line).unwrap_or_else(|| line.to_string()))
            .collect())
    }

    fn exists(&self, path: &str) -> bool {
        self.project_dir.join(path).is_file()
    }

    fn is_builtin(&self, path: &str) -> bool {
        self.builtin_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

/// Renders all diagnostics from a sink.
///
/// Text goes to stderr through the terminal renderer; JSON goes to stdout as
/// one array. Returns the number of diagnostics rendered.
pub fn render_diagnostics(sink: &DiagnosticSink, format: ReportFormat, color: bool) -> usize {
    let diagnostics = sink.diagnostics();
    match format {
        ReportFormat::Text => {
            let renderer = TerminalRenderer::new(color);
            for diag in &diagnostics {
                eprintln!("{}", renderer.render(diag));
            }
        }
        ReportFormat::Json => {
            let json =
                serde_json::to_string_pretty(&diagnostics).unwrap_or_else(|_| "[]".to_string());
            println!("{json}");
        }
    }
    diagnostics.len()
}
