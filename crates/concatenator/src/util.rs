//! Path helpers

use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::{ConcatError, Result};

/// Append `suffix` (e.g. `.js`) unless `name` already ends with it
pub fn with_default_extension(name: &str, suffix: &str) -> String {
    if name.ends_with(suffix) {
        name.to_owned()
    } else {
        format!("{name}{suffix}")
    }
}

fn is_pattern(path: &str) -> bool {
    path.contains(['*', '?', '['])
}

/// Expand glob patterns relative to `base`, keeping plain paths as given.
///
/// A pattern without matches contributes nothing. Matches of one pattern are
/// returned in alphabetical order.
pub fn expand_paths(paths: &[PathBuf], base: &Path) -> Result<Vec<PathBuf>> {
    let mut expanded = Vec::with_capacity(paths.len());
    for path in paths {
        let raw = path.to_string_lossy();
        if !is_pattern(&raw) {
            expanded.push(path.clone());
            continue;
        }

        let pattern = base.join(path).to_string_lossy().into_owned();
        let matches = glob::glob(&pattern).map_err(|source| ConcatError::InvalidPattern {
            pattern: raw.to_string(),
            source,
        })?;
        let before = expanded.len();
        for entry in matches {
            match entry {
                Ok(found) => expanded.push(found),
                Err(e) => warn!("Skipping unreadable glob match: {e}"),
            }
        }
        debug!("Expanded {} to {} path(s)", raw, expanded.len() - before);
    }
    Ok(expanded)
}
