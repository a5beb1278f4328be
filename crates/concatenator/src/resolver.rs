use std::{
    fs::File,
    path::{Path, PathBuf},
};

use log::{debug, trace, warn};

use crate::types::FxIndexSet;

/// Ordered list of directories searched for files. First match wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadPath {
    dirs: Vec<PathBuf>,
}

impl LoadPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a directory, giving it the lowest priority
    pub fn push(&mut self, dir: impl Into<PathBuf>) {
        self.dirs.push(dir.into());
    }

    /// Insert a directory in front, giving it the highest priority
    pub fn prepend(&mut self, dir: impl Into<PathBuf>) {
        self.dirs.insert(0, dir.into());
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for LoadPath {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self {
            dirs: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Resolves file names against the root directory and the load path
#[derive(Debug, Clone)]
pub struct LoadPathResolver {
    root: PathBuf,
    load_path: LoadPath,
}

impl LoadPathResolver {
    pub fn new(root: impl Into<PathBuf>, load_path: LoadPath) -> Self {
        Self {
            root: root.into(),
            load_path,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn load_path(&self) -> &LoadPath {
        &self.load_path
    }

    /// Canonicalize a path, handling errors gracefully
    fn canonicalize_path(path: PathBuf) -> PathBuf {
        match path.canonicalize() {
            Ok(canonical) => canonical,
            Err(e) => {
                // Log warning but don't fail - return the original path
                warn!("Failed to canonicalize path {}: {}", path.display(), e);
                path
            }
        }
    }

    /// Look up `name` in `dir`, returning the canonical path of a readable file
    pub fn resolve_in_directory(dir: &Path, name: &str) -> Option<PathBuf> {
        let candidate = dir.join(name);
        if !candidate.is_file() {
            return None;
        }
        if let Err(e) = File::open(&candidate) {
            debug!("Skipping unreadable {}: {}", candidate.display(), e);
            return None;
        }
        Some(Self::canonicalize_path(candidate))
    }

    /// Search the load path in order. An empty load path is a clean miss.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        for dir in self.load_path.dirs() {
            if let Some(found) = Self::resolve_in_directory(dir, name) {
                trace!("Resolved {name} in load path entry {}", dir.display());
                return Some(found);
            }
        }
        None
    }

    /// Look up a top-level source file: the root first, then the load path
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        Self::resolve_in_directory(&self.root, name).or_else(|| self.resolve(name))
    }

    /// Directories consulted by [`Self::locate`], deduplicated, in search order
    pub fn search_directories(&self) -> Vec<PathBuf> {
        let mut unique_dirs = FxIndexSet::default();
        unique_dirs.insert(self.root.clone());
        unique_dirs.extend(self.load_path.dirs().iter().cloned());
        unique_dirs.into_iter().collect()
    }
}
