//! Shared type definitions for the concatenator crate
//!
//! This module contains common types that are used across multiple components
//! of the concatenator, ensuring consistency and avoiding circular dependencies.

use std::hash::BuildHasherDefault;

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHasher;

/// Type alias for FxHasher-based IndexMap
pub type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// Type alias for FxHasher-based IndexSet
pub type FxIndexSet<T> = IndexSet<T, BuildHasherDefault<FxHasher>>;

/// The command carried by a directive comment (`// = require foo`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Include another source file at this point
    Require,

    /// Register an asset for installation
    Provide,
}

impl Command {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "require" => Some(Self::Require),
            "provide" => Some(Self::Provide),
            _ => None,
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Require => write!(f, "require"),
            Self::Provide => write!(f, "provide"),
        }
    }
}

/// Where a required file is looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Relative to the directory of the requiring file (`// = require foo`)
    Relative,

    /// Through the configured load path (`// = require <foo>`)
    LoadPath,
}

impl Lookup {
    /// Check if this lookup searches the load path
    pub fn is_load_path(&self) -> bool {
        matches!(self, Self::LoadPath)
    }
}
