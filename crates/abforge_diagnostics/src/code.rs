//! Diagnostic codes with category prefixes for structured error identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Error diagnostics, prefixed with `E`.
    Error,
    /// Warning diagnostics, prefixed with `W`.
    Warning,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
        }
    }
}

/// A structured diagnostic code combining a category prefix and a numeric identifier.
///
/// Displayed as the category prefix followed by a zero-padded 3-digit number,
/// e.g., `E101`, `W201`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// A dependency cycle was found between assets.
    pub const CYCLE: DiagnosticCode = DiagnosticCode::new(Category::Error, 101);
    /// The external bundle compiler failed for one bundle.
    pub const COMPILE_FAILED: DiagnosticCode = DiagnosticCode::new(Category::Error, 102);
    /// The source file of an asset could not be read.
    pub const UNREADABLE_SOURCE: DiagnosticCode = DiagnosticCode::new(Category::Error, 103);
    /// A referenced asset does not exist and was skipped.
    pub const MISSING_REFERENCE: DiagnosticCode = DiagnosticCode::new(Category::Warning, 201);
    /// The fingerprint store was unusable and has been reset.
    pub const CACHE_DISCARDED: DiagnosticCode = DiagnosticCode::new(Category::Warning, 202);
    /// The references of an asset could not be listed.
    pub const UNREADABLE_REFERENCES: DiagnosticCode = DiagnosticCode::new(Category::Warning, 203);
    /// A dependency table carried a valid header but a damaged body.
    pub const DAMAGED_TABLE: DiagnosticCode = DiagnosticCode::new(Category::Warning, 204);

    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}
