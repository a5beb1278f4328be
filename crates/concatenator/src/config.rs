//! Configuration for a concatenation run.
//!
//! Options can be set field by field, by name through [`Config::set_option`]
//! or from a TOML file. Every recognised option is listed in
//! [`Config::OPTIONS`]; anything else is rejected with
//! [`ConcatError::InvalidOption`].

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::debug;
use serde::de::DeserializeOwned;

use crate::{
    constants::{ConstantsTable, UndefinedConstantPolicy},
    error::{ConcatError, Result},
    resolver::LoadPath,
};

#[derive(Debug, Clone)]
pub struct Config {
    /// Files to concatenate, in order. May contain glob patterns.
    pub source_files: Vec<PathBuf>,
    /// Directories searched for `<...>` requires and the constants file.
    /// Relative entries are taken relative to `root`.
    pub load_path: LoadPath,
    /// Base directory for top-level source files
    pub root: PathBuf,
    /// Destination for provided assets
    pub asset_root: Option<PathBuf>,
    /// Append a build summary comment to the output
    pub write_infos: bool,
    /// Expand glob patterns in source files and load path entries
    pub expand_paths: bool,
    pub strip_comments: bool,
    /// Extension appended to names that lack it
    pub extension: String,
    pub undefined_constants: UndefinedConstantPolicy,
    /// Constants given directly; `None` means look for the constants file
    pub constants: Option<ConstantsTable>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_files: Vec::new(),
            load_path: LoadPath::new(),
            root: PathBuf::from("."),
            asset_root: None,
            write_infos: false,
            expand_paths: true,
            strip_comments: true,
            extension: Self::DEFAULT_EXTENSION.to_owned(),
            undefined_constants: UndefinedConstantPolicy::default(),
            constants: None,
        }
    }
}

impl Config {
    pub const DEFAULT_EXTENSION: &'static str = "js";

    /// Default configuration file name
    pub const DEFAULT_NAME: &'static str = "concatenator.toml";

    pub const OPTIONS: &'static [&'static str] = &[
        "source_files",
        "load_path",
        "root",
        "asset_root",
        "write_infos",
        "expand_paths",
        "strip_comments",
        "extension",
        "undefined_constants",
        "constants",
    ];

    /// Build a configuration from named options, applied in order
    pub fn from_options<'a, I>(options: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a toml::Value)>,
    {
        let mut config = Self::default();
        for (key, value) in options {
            config.set_option(key, value)?;
        }
        Ok(config)
    }

    /// Parse a TOML document of options
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self> {
        let table: toml::Table =
            toml::from_str(content).map_err(|source| ConcatError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_options(table.iter().map(|(key, value)| (key.as_str(), value)))
    }

    /// Load options from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConcatError::io(path, e))?;
        let mut config = Self::from_toml_str(&content, path)?;
        // The root is relative to the file itself, the load path to the root
        if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            config.root = base.join(&config.root);
        }
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn set_option(&mut self, key: &str, value: &toml::Value) -> Result<()> {
        match key {
            "source_files" => self.source_files = path_list(key, value)?,
            "load_path" => self.load_path = path_list(key, value)?.into_iter().collect(),
            "root" => self.root = typed(key, value, "a path")?,
            "asset_root" => {
                let path: PathBuf = typed(key, value, "a non-empty path")?;
                self.set_asset_root(path)?;
            }
            "write_infos" => self.write_infos = typed(key, value, "a boolean")?,
            "expand_paths" => self.expand_paths = typed(key, value, "a boolean")?,
            "strip_comments" => self.strip_comments = typed(key, value, "a boolean")?,
            "extension" => {
                let extension: String = typed(key, value, "a string")?;
                self.extension = extension.trim_start_matches('.').to_owned();
            }
            "undefined_constants" => {
                self.undefined_constants = typed(key, value, r#""error" or "ignore""#)?;
            }
            "constants" => {
                let table = value.as_table().ok_or(ConcatError::InvalidOptionValue {
                    key: key.to_owned(),
                    expected: "a table",
                })?;
                self.constants = Some(ConstantsTable::from_toml(table));
            }
            _ => {
                debug!("Known options: {}", Self::OPTIONS.join(", "));
                return Err(ConcatError::InvalidOption {
                    key: key.to_owned(),
                });
            }
        }
        Ok(())
    }

    /// Set the asset root, which must be an existing writable directory
    pub fn set_asset_root(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(ConcatError::InvalidOptionValue {
                key: "asset_root".to_owned(),
                expected: "a non-empty path",
            });
        }
        let writable = fs::metadata(&path)
            .map(|metadata| metadata.is_dir() && !metadata.permissions().readonly())
            .unwrap_or(false);
        if !writable {
            return Err(ConcatError::DestinationNotWritable { path, source: None });
        }
        self.asset_root = Some(path);
        Ok(())
    }

    /// Suffix used to default-extend file names, dot included
    pub fn extension_suffix(&self) -> String {
        format!(".{}", self.extension)
    }
}

fn typed<T: DeserializeOwned>(key: &str, value: &toml::Value, expected: &'static str) -> Result<T> {
    value
        .clone()
        .try_into()
        .map_err(|_| ConcatError::InvalidOptionValue {
            key: key.to_owned(),
            expected,
        })
}

/// Accepts a single path or a list of paths
fn path_list(key: &str, value: &toml::Value) -> Result<Vec<PathBuf>> {
    if value.is_str() {
        return Ok(vec![typed(key, value, "a path or a list of paths")?]);
    }
    typed(key, value, "a path or a list of paths")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.strip_comments);
        assert!(config.expand_paths);
        assert!(!config.write_infos);
        assert_eq!(config.extension_suffix(), ".js");
        assert_eq!(config.undefined_constants, UndefinedConstantPolicy::Error);
        assert!(config.constants.is_none());
    }

    #[test]
    fn test_options_from_toml() -> anyhow::Result<()> {
        let config = Config::from_toml_str(
            r#"
source_files = ["app.js", "lib/*.js"]
load_path = "vendor"
strip_comments = false
write_infos = true
extension = ".mjs"
undefined_constants = "ignore"

[constants]
VERSION = "1.0"
"#,
            Path::new("concatenator.toml"),
        )?;

        assert_eq!(
            config.source_files,
            vec![PathBuf::from("app.js"), PathBuf::from("lib/*.js")]
        );
        assert_eq!(config.load_path.dirs(), [PathBuf::from("vendor")]);
        assert!(!config.strip_comments);
        assert!(config.write_infos);
        assert_eq!(config.extension, "mjs");
        assert_eq!(config.undefined_constants, UndefinedConstantPolicy::Ignore);
        assert_eq!(
            config.constants.as_ref().and_then(|c| c.get("VERSION")),
            Some("1.0")
        );
        Ok(())
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        let err = Config::from_toml_str("minify = true", Path::new("concatenator.toml"))
            .expect_err("unknown option");
        assert!(matches!(err, ConcatError::InvalidOption { key } if key == "minify"));
    }

    #[test]
    fn test_wrong_value_type_is_rejected() {
        let err = Config::from_toml_str("strip_comments = \"yes\"", Path::new("c.toml"))
            .expect_err("wrong type");
        assert!(matches!(
            err,
            ConcatError::InvalidOptionValue { key, .. } if key == "strip_comments"
        ));
    }

    #[test]
    fn test_asset_root_must_exist() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let mut config = Config::default();

        let existing = toml::Value::String(temp_dir.path().display().to_string());
        config.set_option("asset_root", &existing)?;
        assert_eq!(config.asset_root.as_deref(), Some(temp_dir.path()));

        let missing = toml::Value::String(temp_dir.path().join("nope").display().to_string());
        let err = config
            .set_option("asset_root", &missing)
            .expect_err("missing asset root");
        assert!(matches!(err, ConcatError::DestinationNotWritable { .. }));
        Ok(())
    }

    #[test]
    fn test_set_asset_root_rejects_files_and_empty_paths() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let file = temp_dir.path().join("assets.txt");
        fs::write(&file, "")?;
        let mut config = Config::default();

        let err = config.set_asset_root(&file).expect_err("not a directory");
        assert!(matches!(err, ConcatError::DestinationNotWritable { ref path, .. } if *path == file));
        let err = config.set_asset_root("").expect_err("empty path");
        assert!(matches!(err, ConcatError::InvalidOptionValue { ref key, .. } if key == "asset_root"));
        assert!(config.asset_root.is_none());

        config.set_asset_root(temp_dir.path())?;
        assert_eq!(config.asset_root.as_deref(), Some(temp_dir.path()));
        Ok(())
    }

    #[test]
    fn test_load_resolves_paths_relative_to_file() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join(Config::DEFAULT_NAME);
        fs::write(&path, "root = \"src\"\nload_path = [\"vendor\"]\n")?;

        let config = Config::load(&path)?;
        assert_eq!(config.root, temp_dir.path().join("src"));
        assert_eq!(config.load_path.dirs(), [PathBuf::from("vendor")]);
        Ok(())
    }
}
