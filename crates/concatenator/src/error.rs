//! Error kinds surfaced by a concatenation run.
//!
//! Every variant is fatal for the operation that raised it. A run that fails
//! never hands back the partially filled output buffer.

use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T, E = ConcatError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ConcatError {
    /// A top-level source file or a required file could not be resolved.
    #[error("{name} not found in {}{}", display_dirs(.searched), display_origin(.required_from.as_ref()))]
    FileNotFound {
        name: String,
        searched: Vec<PathBuf>,
        required_from: Option<PathBuf>,
    },

    #[error("constant {name} is not defined ({}:{line}), please check your constants", .file.display())]
    UndefinedConstant {
        name: String,
        file: PathBuf,
        line: usize,
    },

    #[error("destination {} is not writable", .path.display())]
    DestinationNotWritable {
        path: PathBuf,
        #[source]
        source: Option<io::Error>,
    },

    #[error("option {key} is not implemented")]
    InvalidOption { key: String },

    #[error("option {key} expects {expected}")]
    InvalidOptionValue { key: String, expected: &'static str },

    /// A file requires itself, directly or through other files.
    #[error("cyclic require: {}", display_chain(.chain))]
    CyclicRequire { chain: Vec<PathBuf> },

    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid path pattern {pattern}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

impl ConcatError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn display_dirs(dirs: &[PathBuf]) -> String {
    if dirs.is_empty() {
        return "(no directories)".to_owned();
    }
    dirs.iter()
        .map(|dir| dir.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn display_origin(required_from: Option<&PathBuf>) -> String {
    required_from
        .map(|file| format!(" (required from {})", file.display()))
        .unwrap_or_default()
}

fn display_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|file| file.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_names_searched_directories() {
        let err = ConcatError::FileNotFound {
            name: "util.js".to_owned(),
            searched: vec![PathBuf::from("/a"), PathBuf::from("/b")],
            required_from: Some(PathBuf::from("/src/app.js")),
        };
        assert_eq!(
            err.to_string(),
            "util.js not found in /a, /b (required from /src/app.js)"
        );
    }

    #[test]
    fn test_file_not_found_without_load_path() {
        let err = ConcatError::FileNotFound {
            name: "main.js".to_owned(),
            searched: Vec::new(),
            required_from: None,
        };
        assert_eq!(err.to_string(), "main.js not found in (no directories)");
    }

    #[test]
    fn test_cyclic_require_chain() {
        let err = ConcatError::CyclicRequire {
            chain: vec![
                PathBuf::from("a.js"),
                PathBuf::from("b.js"),
                PathBuf::from("a.js"),
            ],
        };
        assert_eq!(err.to_string(), "cyclic require: a.js -> b.js -> a.js");
    }
}
