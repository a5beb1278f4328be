//! Lazy line-by-line reading of a source file

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use log::{trace, warn};

use crate::{
    error::{ConcatError, Result},
    source_line::SourceLine,
};

/// A source file on disk.
///
/// Every call to [`SourceFile::lines`] opens the file again, so the sequence
/// can be restarted as often as needed.
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: PathBuf,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory containing the file, used for relative requires
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn lines(&self) -> Result<SourceLines> {
        let file = File::open(&self.path).map_err(|e| ConcatError::io(&self.path, e))?;
        trace!("Reading {}", self.path.display());
        Ok(SourceLines {
            path: self.path.clone(),
            reader: BufReader::new(file),
            number: 0,
        })
    }
}

/// Iterator over the classified lines of one file, in file order
#[derive(Debug)]
pub struct SourceLines {
    path: PathBuf,
    reader: BufReader<File>,
    number: usize,
}

impl Iterator for SourceLines {
    type Item = Result<SourceLine>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buf = Vec::new();
        match self.reader.read_until(b'\n', &mut buf) {
            Ok(0) => None,
            Ok(_) => {
                self.number += 1;
                let text = match String::from_utf8(buf) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(
                            "{}:{}: invalid UTF-8, replacing undecodable bytes",
                            self.path.display(),
                            self.number
                        );
                        String::from_utf8_lossy(e.as_bytes()).into_owned()
                    }
                };
                Some(Ok(SourceLine::new(&self.path, self.number, text)))
            }
            Err(e) => Some(Err(ConcatError::io(&self.path, e))),
        }
    }
}
