//! Concatenation engine
//!
//! Walks the configured source files in order. Every `require` directive is
//! followed depth-first, so the required file is emitted completely before
//! the rest of the requiring file. A file is emitted at most once per run, at
//! the position where it is first encountered.

use std::{
    borrow::Cow,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use log::{debug, info, trace};

use crate::{
    concatenation::Concatenation,
    config::Config,
    constants::{CONSTANTS_FILE, ConstantsTable},
    error::{ConcatError, Result},
    resolver::{LoadPath, LoadPathResolver},
    source_file::SourceFile,
    source_line::{Directive, SourceLine},
    types::{Command, FxIndexSet, Lookup},
    util::{expand_paths, with_default_extension},
};

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct Bundle {
    pub output: Concatenation,
    /// Arguments of `provide` directives, quotes removed, in encounter order
    pub provides: Vec<String>,
    /// Canonical paths of every emitted file, in completion order
    pub files: Vec<PathBuf>,
    pub elapsed: Duration,
}

impl Bundle {
    pub fn text(&self) -> String {
        self.output.finalize()
    }
}

#[derive(Debug, Clone)]
pub struct Concatenator {
    config: Config,
}

impl Concatenator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the concatenation over all configured source files
    pub fn concatenate(&self) -> Result<Bundle> {
        let started = Instant::now();
        let config = &self.config;

        // Relative load path entries, plain or pattern, live under the root
        let dirs: Vec<PathBuf> = config
            .load_path
            .dirs()
            .iter()
            .map(|dir| config.root.join(dir))
            .collect();
        let (source_files, load_path) = if config.expand_paths {
            (
                Cow::Owned(expand_paths(&config.source_files, &config.root)?),
                expand_paths(&dirs, Path::new(""))?
                    .into_iter()
                    .collect::<LoadPath>(),
            )
        } else {
            (Cow::Borrowed(&config.source_files), dirs.into_iter().collect())
        };

        let resolver = LoadPathResolver::new(config.root.clone(), load_path);
        let constants = self.read_constants(&resolver)?;
        debug!(
            "Concatenating {} source file(s) with {} constant(s)",
            source_files.len(),
            constants.len()
        );

        let mut run = Run::new(config, &resolver, &constants);
        for source in source_files.iter() {
            run.add_source(source)?;
        }
        Ok(run.finish(started))
    }

    /// Copy provided assets to the asset root.
    ///
    /// Provided assets are only collected for now, nothing is copied.
    pub fn install_assets(&self, bundle: &Bundle) -> Result<()> {
        debug!(
            "Skipping installation of {} provided asset(s) into {:?}",
            bundle.provides.len(),
            self.config.asset_root
        );
        Ok(())
    }

    /// Constants given in the configuration, or the constants file found
    /// through the resolver, or nothing
    fn read_constants<'a>(&'a self, resolver: &LoadPathResolver) -> Result<Cow<'a, ConstantsTable>> {
        if let Some(constants) = &self.config.constants {
            return Ok(Cow::Borrowed(constants));
        }
        match resolver.locate(CONSTANTS_FILE) {
            Some(path) => Ok(Cow::Owned(ConstantsTable::load(&path)?)),
            None => {
                trace!("No {CONSTANTS_FILE} found, using no constants");
                Ok(Cow::Owned(ConstantsTable::new()))
            }
        }
    }
}

/// Comment suppression state, reset for every file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum CommentState {
    #[default]
    Normal,
    InBlockComment,
}

impl CommentState {
    /// Whether `line` must be dropped when stripping comments
    fn suppresses(&mut self, line: &SourceLine) -> bool {
        match *self {
            Self::InBlockComment => {
                if line.ends_doc_comment() || line.ends_block_comment() {
                    *self = Self::Normal;
                }
                true
            }
            Self::Normal if line.is_comment() => true,
            Self::Normal if line.begins_doc_comment() || line.begins_block_comment() => {
                if !line.is_one_line_block_comment() {
                    *self = Self::InBlockComment;
                }
                true
            }
            Self::Normal => false,
        }
    }
}

/// State of a single concatenation run
struct Run<'a> {
    config: &'a Config,
    resolver: &'a LoadPathResolver,
    constants: &'a ConstantsTable,
    suffix: String,
    processed: FxIndexSet<PathBuf>,
    /// Files whose processing has started but not finished, outermost first
    in_progress: Vec<PathBuf>,
    provides: Vec<String>,
    output: Concatenation,
}

impl<'a> Run<'a> {
    fn new(
        config: &'a Config,
        resolver: &'a LoadPathResolver,
        constants: &'a ConstantsTable,
    ) -> Self {
        Self {
            config,
            resolver,
            constants,
            suffix: config.extension_suffix(),
            processed: FxIndexSet::default(),
            in_progress: Vec::new(),
            provides: Vec::new(),
            output: Concatenation::new(),
        }
    }

    fn add_source(&mut self, source: &Path) -> Result<()> {
        let name = with_default_extension(&source.to_string_lossy(), &self.suffix);
        let Some(path) = self.resolver.locate(&name) else {
            return Err(ConcatError::FileNotFound {
                name,
                searched: self.resolver.search_directories(),
                required_from: None,
            });
        };
        self.add_file(path)
    }

    fn add_file(&mut self, path: PathBuf) -> Result<()> {
        if self.processed.contains(&path) {
            trace!("Already included {}", path.display());
            return Ok(());
        }
        if let Some(start) = self.in_progress.iter().position(|p| *p == path) {
            let mut chain = self.in_progress[start..].to_vec();
            chain.push(path);
            return Err(ConcatError::CyclicRequire { chain });
        }

        debug!("Adding {}", path.display());
        self.in_progress.push(path.clone());
        let file = SourceFile::new(&path);
        let mut state = CommentState::default();

        for line in file.lines()? {
            let mut line = line?;
            self.constants
                .interpolate_line(&mut line, self.config.undefined_constants)?;

            if let Some(directive) = line.directive() {
                self.apply_directive(directive, &file)?;
                continue;
            }
            if self.config.strip_comments && state.suppresses(&line) {
                continue;
            }
            self.output.append_line(line.text());
        }

        self.output.append_raw("\n");
        self.in_progress.pop();
        self.processed.insert(path);
        Ok(())
    }

    fn apply_directive(&mut self, directive: &Directive, file: &SourceFile) -> Result<()> {
        match directive.command {
            Command::Provide => {
                let asset = directive.argument.trim_matches('"').to_owned();
                debug!("{} provides {asset}", file.path().display());
                self.provides.push(asset);
                Ok(())
            }
            Command::Require => self.require(directive, file),
        }
    }

    fn require(&mut self, directive: &Directive, file: &SourceFile) -> Result<()> {
        let name = with_default_extension(directive.target(), &self.suffix);
        let lookup = directive.lookup();
        let resolved = match lookup {
            Lookup::LoadPath => self.resolver.resolve(&name),
            Lookup::Relative => LoadPathResolver::resolve_in_directory(file.directory(), &name),
        };

        match resolved {
            Some(path) => {
                trace!("{} requires {}", file.path().display(), path.display());
                self.add_file(path)
            }
            None => Err(ConcatError::FileNotFound {
                name,
                searched: if lookup.is_load_path() {
                    self.resolver.load_path().dirs().to_vec()
                } else {
                    vec![file.directory().to_path_buf()]
                },
                required_from: Some(file.path().to_path_buf()),
            }),
        }
    }

    fn finish(mut self, started: Instant) -> Bundle {
        let elapsed = started.elapsed();
        if self.config.write_infos {
            let summary = format!(
                "// Built {} source file(s) in {:.6} seconds ({} bytes)\n",
                self.processed.len(),
                elapsed.as_secs_f64(),
                self.output.len()
            );
            self.output.append_raw(&summary);
        }
        info!(
            "Concatenated {} file(s) into {} bytes in {:?}",
            self.processed.len(),
            self.output.len(),
            elapsed
        );
        Bundle {
            output: self.output,
            provides: self.provides,
            files: self.processed.into_iter().collect(),
            elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed `lines` through the state machine, returning the kept ones
    fn kept(lines: &[&str]) -> Vec<String> {
        let mut state = CommentState::default();
        lines
            .iter()
            .enumerate()
            .map(|(i, text)| SourceLine::new("t.js", i + 1, *text))
            .filter(|line| !state.suppresses(line))
            .map(|line| line.text().to_owned())
            .collect()
    }

    #[test]
    fn test_plain_comment_is_suppressed() {
        assert_eq!(kept(&["// note", "a();", "  // indented"]), ["a();"]);
    }

    #[test]
    fn test_one_line_block_comment_keeps_state() {
        assert_eq!(kept(&["/* note */", "a();", "/** doc **/", "b();"]), ["a();", "b();"]);
    }

    #[test]
    fn test_multiline_doc_comment() {
        let lines = ["/**", " * Docs", " * @param x", " **/", "a();"];
        assert_eq!(kept(&lines), ["a();"]);
    }

    #[test]
    fn test_multiline_block_comment_closed_by_plain_end() {
        let lines = ["/* start", "still comment", "end */", "a();"];
        assert_eq!(kept(&lines), ["a();"]);
    }

    #[test]
    fn test_text_after_closing_marker_stays_one_line() {
        let lines = ["/* note */ still comment", "b();", "c();"];
        assert_eq!(kept(&lines), ["b();", "c();"]);

        let lines = ["/** doc **/ trailing", "/* open", "x();", "*/", "d();"];
        assert_eq!(kept(&lines), ["d();"]);
    }

    #[test]
    fn test_closing_marker_outside_block_is_content() {
        assert_eq!(kept(&["a(); */", "b();"]), ["a(); */", "b();"]);
    }
}
