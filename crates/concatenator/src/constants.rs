//! Constant interpolation
//!
//! Source lines may contain `<%= name %>` placeholders. Each one is replaced
//! with the value of `name` from the [`ConstantsTable`] of the current run.

use std::{fs, path::Path};

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::{
    error::{ConcatError, Result},
    source_line::SourceLine,
    types::FxIndexMap,
};

/// File name looked up on the root and load path when no constants are given
pub const CONSTANTS_FILE: &str = "constants.toml";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<%=(.*?)%>").expect("placeholder pattern is valid"));

/// What to do with a placeholder naming an unknown constant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndefinedConstantPolicy {
    /// Abort the run with [`ConcatError::UndefinedConstant`]
    #[default]
    Error,
    /// Leave the placeholder in the output untouched
    Ignore,
}

/// Immutable name to value mapping used for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstantsTable {
    values: FxIndexMap<String, String>,
}

impl ConstantsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Build a table from a parsed TOML table, stringifying scalar values
    pub fn from_toml(table: &toml::Table) -> Self {
        table
            .iter()
            .map(|(name, value)| (name.clone(), value_to_string(value)))
            .collect()
    }

    /// Load constants from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConcatError::io(path, e))?;
        let table: toml::Table = toml::from_str(&content).map_err(|source| {
            ConcatError::ConfigParse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let constants = Self::from_toml(&table);
        debug!(
            "Loaded {} constant(s) from {}",
            constants.len(),
            path.display()
        );
        Ok(constants)
    }

    /// Rewrite every placeholder of `text` in a single pass.
    ///
    /// Substituted values are not scanned again. Returns the name of the first
    /// unknown constant when the policy is [`UndefinedConstantPolicy::Error`].
    pub fn interpolate(
        &self,
        text: &str,
        policy: UndefinedConstantPolicy,
    ) -> Result<String, String> {
        let mut result = String::with_capacity(text.len());
        let mut last = 0;
        for captures in PLACEHOLDER.captures_iter(text) {
            let (Some(placeholder), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let name = name.as_str().trim();
            result.push_str(&text[last..placeholder.start()]);
            match (self.get(name), policy) {
                (Some(value), _) => result.push_str(value),
                (None, UndefinedConstantPolicy::Ignore) => result.push_str(placeholder.as_str()),
                (None, UndefinedConstantPolicy::Error) => return Err(name.to_owned()),
            }
            last = placeholder.end();
        }
        result.push_str(&text[last..]);
        Ok(result)
    }

    /// Interpolate a source line in place
    pub fn interpolate_line(
        &self,
        line: &mut SourceLine,
        policy: UndefinedConstantPolicy,
    ) -> Result<()> {
        if !line.text().contains("<%=") {
            return Ok(());
        }
        let text = self
            .interpolate(line.text(), policy)
            .map_err(|name| ConcatError::UndefinedConstant {
                name,
                file: line.file().to_path_buf(),
                line: line.number(),
            })?;
        line.set_text(text);
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConstantsTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for ConstantsTable {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.values.extend(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into())),
        );
    }
}

fn value_to_string(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn table() -> ConstantsTable {
        [("brandColor", "#fff"), ("VERSION", "1.2.0")]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_interpolates_placeholder() {
        let result = table().interpolate("color: <%= brandColor %>;", UndefinedConstantPolicy::Error);
        assert_eq!(result.as_deref(), Ok("color: #fff;"));
    }

    #[test]
    fn test_interpolates_every_occurrence() {
        let result = table().interpolate(
            "<%=VERSION%> <%= brandColor %> <%=  VERSION  %>",
            UndefinedConstantPolicy::Error,
        );
        assert_eq!(result.as_deref(), Ok("1.2.0 #fff 1.2.0"));
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        let constants: ConstantsTable = [("outer", "<%= inner %>")].into_iter().collect();
        let result = constants.interpolate("x = '<%= outer %>';", UndefinedConstantPolicy::Error);
        assert_eq!(result.as_deref(), Ok("x = '<%= inner %>';"));
    }

    #[test]
    fn test_undefined_constant() {
        let result = table().interpolate("a <%= missing %> b", UndefinedConstantPolicy::Error);
        assert_eq!(result, Err("missing".to_owned()));

        let result = table().interpolate("a <%= missing %> b", UndefinedConstantPolicy::Ignore);
        assert_eq!(result.as_deref(), Ok("a <%= missing %> b"));
    }

    #[test]
    fn test_interpolate_line_reports_position() {
        let mut line = SourceLine::new("src/app.js", 7, "x = <%= nope %>;\n");
        let err = table()
            .interpolate_line(&mut line, UndefinedConstantPolicy::Error)
            .expect_err("undefined constant");
        match err {
            ConcatError::UndefinedConstant { name, file, line } => {
                assert_eq!(name, "nope");
                assert_eq!(file, Path::new("src/app.js"));
                assert_eq!(line, 7);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_stringifies_scalars() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join(CONSTANTS_FILE);
        fs::write(
            &path,
            "name = \"widget\"\nretries = 3\ndebug = false\n",
        )?;

        let constants = ConstantsTable::load(&path)?;
        assert_eq!(constants.get("name"), Some("widget"));
        assert_eq!(constants.get("retries"), Some("3"));
        assert_eq!(constants.get("debug"), Some("false"));
        Ok(())
    }
}
