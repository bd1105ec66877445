//! URL to filesystem path resolution.

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Resolve a request URL below `serve_root`, mapping directories to `index.html`.
///
/// Returns `None` for anything that does not exist or escapes the root.
pub fn resolve_path(url: &str, serve_root: &Path) -> Option<PathBuf> {
    let clean = url_path(url);
    if clean.split('/').any(|segment| segment == "..") {
        return None;
    }

    // Canonicalize to resolve symlinks and verify the path stays under the root.
    let root = serve_root.canonicalize().ok()?;
    let canonical = serve_root.join(&clean).canonicalize().ok()?;
    if !canonical.starts_with(&root) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }
    let index = canonical.join("index.html");
    index.is_file().then_some(index)
}

/// Decoded URL path without query, fragment, or surrounding slashes.
pub fn url_path(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    decoded.trim_matches('/').to_string()
}
