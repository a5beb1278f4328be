//! Line classification
//!
//! A [`SourceLine`] answers every question the concatenation engine asks
//! about one line of a source file: is it a `//` comment, does it carry a
//! `require`/`provide` directive, and does it open or close a block comment.
//! Answers are computed from the current text on first use and memoized until
//! the text is rewritten.

use std::path::{Path, PathBuf};

use once_cell::unsync::OnceCell;

use crate::types::{Command, Lookup};

/// Marker that opens a single-line comment
const COMMENT_MARKER: &str = "//";

/// First character of a directive comment body
const COMMAND_START: char = '=';

/// A parsed `// = <command> <argument>` comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub command: Command,
    /// Argument as written, quotes and angle brackets included
    pub argument: String,
}

impl Directive {
    /// Parse the body of a `//` comment (marker already stripped and trimmed)
    pub fn parse(comment: &str) -> Option<Self> {
        let body = comment.strip_prefix(COMMAND_START)?;
        let mut parts = body.split_whitespace();
        let command = Command::from_name(parts.next()?)?;
        let argument = parts.next()?.to_owned();
        Some(Self { command, argument })
    }

    /// How a `require` argument must be looked up
    pub fn lookup(&self) -> Lookup {
        if self.argument.starts_with('<') {
            Lookup::LoadPath
        } else {
            Lookup::Relative
        }
    }

    /// Argument with surrounding quotes and angle brackets removed
    pub fn target(&self) -> &str {
        self.argument.trim_matches(|c| matches!(c, '<' | '>' | '"'))
    }
}

/// Memoized classification of the current line text
#[derive(Debug, Default, Clone)]
struct Classification {
    comment: OnceCell<Option<String>>,
    directive: OnceCell<Option<Directive>>,
}

/// One line of a source file together with its position
#[derive(Debug, Clone)]
pub struct SourceLine {
    /// Raw text including the original line terminator
    text: String,
    /// 1-based line number
    number: usize,
    file: PathBuf,
    classification: Classification,
}

impl SourceLine {
    pub fn new(file: impl Into<PathBuf>, number: usize, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            number,
            file: file.into(),
            classification: Classification::default(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Replace the line text, dropping every memoized answer
    pub fn set_text(&mut self, text: String) {
        self.text = text;
        self.classification = Classification::default();
    }

    fn trimmed(&self) -> &str {
        self.text.trim()
    }

    pub fn is_comment(&self) -> bool {
        self.trimmed().starts_with(COMMENT_MARKER)
    }

    /// Comment body with the `//` marker and surrounding whitespace removed
    pub fn comment(&self) -> Option<&str> {
        self.classification
            .comment
            .get_or_init(|| {
                self.trimmed()
                    .strip_prefix(COMMENT_MARKER)
                    .map(|body| body.trim().to_owned())
            })
            .as_deref()
    }

    pub fn directive(&self) -> Option<&Directive> {
        self.classification
            .directive
            .get_or_init(|| self.comment().and_then(Directive::parse))
            .as_ref()
    }

    pub fn is_directive(&self) -> bool {
        self.directive().is_some()
    }

    pub fn is_require(&self) -> bool {
        self.directive()
            .is_some_and(|directive| directive.command == Command::Require)
    }

    pub fn is_provide(&self) -> bool {
        self.directive()
            .is_some_and(|directive| directive.command == Command::Provide)
    }

    pub fn begins_doc_comment(&self) -> bool {
        self.trimmed().starts_with("/**")
    }

    pub fn ends_doc_comment(&self) -> bool {
        self.trimmed().ends_with("**/")
    }

    pub fn begins_block_comment(&self) -> bool {
        self.trimmed().starts_with("/*")
    }

    pub fn ends_block_comment(&self) -> bool {
        self.trimmed().ends_with("*/")
    }

    /// Opens a doc or block comment and closes it on the same line. Text
    /// after the closing marker does not reopen the block.
    pub fn is_one_line_block_comment(&self) -> bool {
        self.trimmed()
            .strip_prefix("/*")
            .is_some_and(|rest| rest.contains("*/"))
    }
}

impl std::fmt::Display for SourceLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
