//! How serious a build diagnostic is.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a diagnostic.
///
/// A warning marks input the build worked around, such as a skipped reference
/// or a discarded fingerprint store. An error marks a bundle that could not be
/// built correctly and makes the run exit non-zero.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The build continued around the problem.
    Warning,
    /// The build result is incomplete.
    Error,
}

impl Severity {
    /// Returns `true` if the diagnostic fails the build.
    pub fn is_error(self) -> bool {
        self == Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_outrank_warnings() {
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error.is_error());
        assert!(!Severity::Warning.is_error());
    }

    #[test]
    fn renders_as_lowercase_label() {
        assert_eq!(Severity::Error.to_string(), "error");
        assert_eq!(format!("{:>8}", Severity::Warning), " warning");
    }

    #[test]
    fn serializes_as_lowercase_label() {
        assert_eq!(serde_json::to_string(&Severity::Warning).unwrap(), "\"warning\"");
    }
}
