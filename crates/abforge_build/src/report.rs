//! Outcome of one build.

use std::fmt;

/// What a build did, by bundle name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Platform the build targeted.
    pub platform: String,
    /// Bundles compiled this run.
    pub compiled: Vec<String>,
    /// Compiled bundles whose output changed and was written.
    pub published: Vec<String>,
    /// Compiled bundles whose output matched the previous build.
    pub reused: Vec<String>,
    /// Bundles that needed no rebuild.
    pub skipped: Vec<String>,
    /// Bundles that could not be built.
    pub failed: Vec<String>,
    /// Stale bundle files deleted from the output directory.
    pub pruned: Vec<String>,
    /// Error diagnostics emitted during the run.
    pub errors: usize,
}

impl BuildReport {
    /// Returns `true` if every bundle was built and no error was reported.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.errors == 0
    }

    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} compiled ({} published, {} unchanged), {} up to date, {} failed",
            self.compiled.len(),
            self.published.len(),
            self.reused.len(),
            self.skipped.len(),
            self.failed.len()
        )?;
        if !self.pruned.is_empty() {
            write!(f, ", {} pruned", self.pruned.len())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_report_exits_zero() {
        let report = BuildReport {
            compiled: vec!["a.ab".into()],
            published: vec!["a.ab".into()],
            ..BuildReport::default()
        };
        assert!(report.is_success());
        assert_eq!(report.exit_code(), 0);
        assert_eq!(
            report.to_string(),
            "1 compiled (1 published, 0 unchanged), 0 up to date, 0 failed"
        );
    }

    #[test]
    fn failures_or_errors_exit_nonzero() {
        let failed = BuildReport {
            failed: vec!["b.ab".into()],
            ..BuildReport::default()
        };
        assert_eq!(failed.exit_code(), 1);

        let errored = BuildReport {
            errors: 1,
            ..BuildReport::default()
        };
        assert_eq!(errored.exit_code(), 1);
    }

    #[test]
    fn pruned_count_is_shown() {
        let report = BuildReport {
            pruned: vec!["old.ab".into()],
            ..BuildReport::default()
        };
        assert!(report.to_string().ends_with(", 1 pruned"));
    }
}
