//! Deterministic names derived from asset paths.

/// Extension of published bundle files.
pub const BUNDLE_EXTENSION: &str = "ab";

/// Returns the canonical project-relative form of an asset path.
///
/// Separators become `/`, empty and `.` segments are dropped and `..` removes
/// the preceding segment. Returns `None` for absolute paths, paths that climb
/// out of the project and paths that name nothing.
pub fn normalize_asset_path(path: &str) -> Option<String> {
    let path = path.trim();
    let bytes = path.as_bytes();
    if path.starts_with(['/', '\\']) || (bytes.len() >= 2 && bytes[1] == b':') {
        return None;
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            s => segments.push(s),
        }
    }
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}

/// Returns the bundle file name of an asset: the lower-cased path with path
/// separators replaced by `.`, followed by `.ab`.
pub fn bundle_name(asset_path: &str) -> String {
    let mut name: String = asset_path
        .chars()
        .map(|c| match c {
            '/' | '\\' => '.',
            c => c.to_ascii_lowercase(),
        })
        .collect();
    name.push('.');
    name.push_str(BUNDLE_EXTENSION);
    name
}

/// Returns the file name component of an asset path.
pub fn short_name(asset_path: &str) -> &str {
    asset_path
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(asset_path)
}
