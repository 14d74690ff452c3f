//! `abforge deps`: prints the contents of a binary dependency table.

use std::fmt::Write;
use std::path::Path;

use abforge_cache::{dependency_table, CacheError, DependencyTable};
use abforge_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};

use crate::pipeline::render_diagnostics;
use crate::{DepsArgs, GlobalArgs, ReportFormat};

/// Runs the `abforge deps` command.
///
/// A missing or unrecognized file reads as an empty table, and so does a
/// damaged one after a warning. Returns exit code 0.
pub fn run(args: &DepsArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let sink = DiagnosticSink::new();
    let table = load_table(&args.file, &sink)?;
    render_diagnostics(&sink, ReportFormat::Text, global.color);
    print!("{}", render_table(&table));
    if !global.quiet {
        eprintln!("   {} bundles in {}", table.len(), args.file.display());
    }
    Ok(0)
}

/// Reads a dependency table the way runtime loaders do: a damaged body is
/// reported as a warning and yields an empty table. I/O failures are returned.
pub fn load_table(path: &Path, sink: &DiagnosticSink) -> Result<DependencyTable, CacheError> {
    match dependency_table::read_file(path) {
        Err(CacheError::Malformed { reason }) => {
            sink.emit(
                Diagnostic::warning(
                    DiagnosticCode::DAMAGED_TABLE,
                    format!("dependency table is damaged ({reason}), treating it as empty"),
                )
                .with_asset(path.display().to_string()),
            );
            Ok(DependencyTable::default())
        }
        other => other,
    }
}

/// Renders one block per bundle: the record line, then one indented line per
/// dependency.
pub fn render_table(table: &DependencyTable) -> String {
    let mut out = String::new();
    for record in table.records() {
        let _ = writeln!(
            out,
            "{} [{}] {} hash={}",
            record.name, record.export, record.short_name, record.hash
        );
        for dep in &record.dependencies {
            let _ = writeln!(out, "    {dep}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use abforge_cache::BundleRecord;
    use abforge_common::ExportKind;

    #[test]
    fn renders_records_and_dependencies() {
        let records = vec![
            BundleRecord {
                name: "Assets/shared.mat".to_string(),
                short_name: "shared.mat".to_string(),
                hash: "00ff".to_string(),
                export: ExportKind::Standalone,
                dependencies: vec![],
            },
            BundleRecord {
                name: "Assets/hero.prefab".to_string(),
                short_name: "hero.prefab".to_string(),
                hash: "abcd".to_string(),
                export: ExportKind::Root,
                dependencies: vec!["Assets/shared.mat".to_string()],
            },
        ];
        let bytes = dependency_table::encode(&records).unwrap();
        let table = dependency_table::decode(&bytes).unwrap();
        assert_eq!(
            render_table(&table),
            "Assets/hero.prefab [root] hero.prefab hash=abcd\n\
             \x20   Assets/shared.mat\n\
             Assets/shared.mat [standalone] shared.mat hash=00ff\n"
        );
    }

    #[test]
    fn damaged_table_reads_as_empty_with_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("dep.all");
        let mut bytes = dependency_table::encode(&[BundleRecord {
            name: "Assets/hero.prefab".to_string(),
            short_name: "hero.prefab".to_string(),
            hash: "abcd".to_string(),
            export: ExportKind::Root,
            dependencies: vec![],
        }])
        .unwrap();
        bytes.truncate(bytes.len() - 3);
        std::fs::write(&file, &bytes).unwrap();

        let sink = DiagnosticSink::new();
        let table = load_table(&file, &sink).unwrap();
        assert!(table.is_empty());
        let diags = sink.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::DAMAGED_TABLE);
        assert!(!sink.has_errors());
    }

    #[test]
    fn unrecognized_or_missing_table_reads_as_empty_silently() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("dep.all");
        std::fs::write(&file, b"PK\x03\x04 not a table").unwrap();

        let sink = DiagnosticSink::new();
        assert!(load_table(&file, &sink).unwrap().is_empty());
        assert!(load_table(&dir.path().join("gone.all"), &sink).unwrap().is_empty());
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn empty_table_renders_nothing() {
        assert_eq!(render_table(&DependencyTable::default()), "");
    }
}
