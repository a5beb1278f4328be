//! Concatenates script sources into a single file, following `require`
//! directives, stripping comments and substituting `<%= name %>` constants.

pub mod concatenation;
pub mod config;
pub mod constants;
pub mod error;
pub mod orchestrator;
pub mod resolver;
pub mod source_file;
pub mod source_line;
pub mod types;
pub mod util;

pub use concatenation::Concatenation;
pub use config::Config;
pub use constants::{ConstantsTable, UndefinedConstantPolicy};
pub use error::{ConcatError, Result};
pub use orchestrator::{Bundle, Concatenator};
pub use resolver::{LoadPath, LoadPathResolver};
pub use source_file::SourceFile;
pub use source_line::{Directive, SourceLine};
