//! The output buffer of a concatenation run.

use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::Path,
};

use log::debug;

use crate::error::{ConcatError, Result};

/// Append-only text sink.
///
/// [`Concatenation::finalize`] does not consume the buffer and can be called
/// any number of times.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Concatenation {
    chunks: Vec<String>,
    len: usize,
}

impl Concatenation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source line. The line keeps its own terminator, if any.
    pub fn append_line(&mut self, line: &str) {
        self.append_raw(line);
    }

    pub fn append_raw(&mut self, block: &str) {
        if block.is_empty() {
            return;
        }
        self.len += block.len();
        self.chunks.push(block.to_owned());
    }

    /// Size of the accumulated text in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn finalize(&self) -> String {
        let mut text = String::with_capacity(self.len);
        for chunk in &self.chunks {
            text.push_str(chunk);
        }
        text
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for chunk in &self.chunks {
            writer.write_all(chunk.as_bytes())?;
        }
        writer.flush()
    }

    /// Persist the buffer to `path`, replacing any existing content
    pub fn save_to(&self, path: &Path) -> Result<()> {
        ensure_writable(path)?;
        let not_writable = |source| ConcatError::DestinationNotWritable {
            path: path.to_path_buf(),
            source: Some(source),
        };
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(not_writable)?;
        self.write_to(&mut file).map_err(not_writable)?;
        debug!("Wrote {} bytes to {}", self.len, path.display());
        Ok(())
    }
}

impl std::fmt::Display for Concatenation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for chunk in &self.chunks {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

/// An existing destination must be a writable file, a new one needs an
/// existing writable parent directory.
fn ensure_writable(path: &Path) -> Result<()> {
    let not_writable = || ConcatError::DestinationNotWritable {
        path: path.to_path_buf(),
        source: None,
    };
    let target = if path.exists() {
        if !path.is_file() {
            return Err(not_writable());
        }
        path
    } else {
        match path.parent() {
            Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
            Some(parent) => parent,
            None => return Err(not_writable()),
        }
    };
    let metadata = fs::metadata(target).map_err(|source| ConcatError::DestinationNotWritable {
        path: path.to_path_buf(),
        source: Some(source),
    })?;
    if metadata.permissions().readonly() {
        return Err(not_writable());
    }
    Ok(())
}
