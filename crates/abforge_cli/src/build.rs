//! `abforge build`: incremental bundle build.
//!
//! The full pipeline:
//!
//! 1. Find project root (walk up looking for `abforge.toml`)
//! 2. Load config and resolve the target platform
//! 3. Scan the root directories for root assets
//! 4. Run a build session: discover, classify, plan, compile, persist
//! 5. Render diagnostics and the build summary

use abforge_build::{BuildSession, BuildSettings};
use abforge_config::resolve_platform;
use abforge_diagnostics::DiagnosticSink;
use tracing::debug;

use crate::compiler::ContainerCompiler;
use crate::pipeline::{render_diagnostics, resolve_project_root, scan_roots, SidecarReferences};
use crate::{BuildArgs, GlobalArgs};

/// Runs the `abforge build` command.
///
/// Returns exit code 0 if every bundle was built, 1 otherwise.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = resolve_project_root(global)?;
    let config = abforge_config::load_config(&project_dir)?;
    let platform = resolve_platform(&config, &project_dir, args.platform.as_deref())?;

    if !global.quiet {
        eprintln!(
            "   Building {} for {}",
            config.project.name, platform.name
        );
    }

    let roots = scan_roots(&project_dir, &config.build)?;
    if roots.is_empty() {
        eprintln!("error: no root assets found in {}", config.build.roots.join(", "));
        return Ok(1);
    }

    debug!("{} root assets", roots.len());

    let mut settings = BuildSettings::new(&project_dir, &platform, &config.build);
    settings.force = args.force;

    let source = SidecarReferences::new(&project_dir, &config.build.builtin_prefixes);
    let compiler = ContainerCompiler::new(&project_dir);
    let sink = DiagnosticSink::new();
    let session = BuildSession::new(settings, &source, &compiler, &sink);

    let report = session.run(&roots)?;

    render_diagnostics(&sink, args.format, global.color);

    if global.verbose {
        for name in &report.published {
            eprintln!("  Published {name}");
        }
        for name in &report.failed {
            eprintln!("     Failed {name}");
        }
        for name in &report.pruned {
            eprintln!("     Pruned {name}");
        }
    }
    if !global.quiet {
        eprintln!("   Finished {report}");
    }

    Ok(report.exit_code())
}
