//! Content and export classification of assets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of content backs an asset node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum ContentKind {
    /// A regular asset file on disk.
    #[default]
    Content,
    /// An engine-provided resource: never read from disk, never bundled alone.
    BuiltinResource,
}

/// How an asset ends up in the published bundle set.
///
/// `Root` is assigned by the caller to build entry points. `Embedded` nodes
/// may be promoted to `Standalone` once per run and are never demoted.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum ExportKind {
    /// Packed into the bundle of the single bundle that reaches it.
    #[default]
    Embedded,
    /// A caller-designated top-level bundle.
    Root,
    /// Shared by more than one bundle, so exported as its own bundle.
    Standalone,
}

/// Error returned when a dependency table holds an unrecognized export code.
#[derive(Debug, thiserror::Error)]
#[error("unknown export classification code {0}")]
pub struct UnknownExportCode(pub i32);

impl ExportKind {
    /// Wire code written into the binary dependency table.
    pub fn code(self) -> i32 {
        match self {
            ExportKind::Embedded => 0,
            ExportKind::Root => 1,
            ExportKind::Standalone => 1 << 2,
        }
    }

    /// Decodes a wire code written by [`code`](Self::code).
    pub fn from_code(code: i32) -> Result<Self, UnknownExportCode> {
        match code {
            0 => Ok(ExportKind::Embedded),
            1 => Ok(ExportKind::Root),
            4 => Ok(ExportKind::Standalone),
            other => Err(UnknownExportCode(other)),
        }
    }

    /// Returns `true` for kinds that produce a bundle of their own.
    pub fn is_bundle(self) -> bool {
        matches!(self, ExportKind::Root | ExportKind::Standalone)
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportKind::Embedded => write!(f, "embedded"),
            ExportKind::Root => write!(f, "root"),
            ExportKind::Standalone => write!(f, "standalone"),
        }
    }
}
