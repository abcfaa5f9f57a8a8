//! Parsing-to-component pipeline: the parser contract, one parser family per
//! language, one per package-manager manifest format, and the controller
//! that dispatches files to parsers during the directory walk.

pub mod controller;
pub mod languages;
pub mod packagemanagers;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::model::ComponentBuilder;

/// Per-invocation context handed to every parser.
///
/// `pwd` is the directory of the file being parsed and `source_files` the
/// relative paths of every file under the source root, both '/'-separated,
/// so internal-component lookups are directory-aware without touching the
/// filesystem.
#[derive(Debug, Clone, Default)]
pub struct ParserContext {
    pub pwd: PathBuf,
    pub source_root: PathBuf,
    pub source_files: Vec<String>,
}

impl ParserContext {
    pub fn new(source_root: impl Into<PathBuf>) -> Self {
        Self {
            pwd: PathBuf::new(),
            source_root: source_root.into(),
            source_files: Vec::new(),
        }
    }
}

/// Uniform contract every concrete parser implements.
///
/// `parse` is a pure function of file text to components: it appends zero or
/// more classified builders to the caller-supplied list and never fails on
/// malformed input - unparseable fragments are skipped, not errors.
#[async_trait]
pub trait Parser: Send + Sync {
    async fn parse(
        &self,
        ctx: &ParserContext,
        components: &mut Vec<ComponentBuilder>,
        contents: &str,
    );
}
