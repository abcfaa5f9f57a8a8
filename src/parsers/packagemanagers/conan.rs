//! Conan `conanfile.txt` parser.

use std::sync::Arc;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::model::ComponentBuilder;
use crate::parsers::{Parser, ParserContext};
use crate::registry::RegistryQuery;

use super::DependencyRecord;

/// `[section]` headers.
static SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([a-z_-]+)\]$").expect("conan section regex must compile"));

/// Parses `[requires]` entries of the form `name/version`. Revision
/// suffixes (`#revision`) stay part of the version verbatim. Conan has no
/// license registry endpoint, so there is no enrichment.
pub struct ConanParser;

impl ConanParser {
    pub fn new(_registry: Arc<dyn RegistryQuery>) -> Self {
        Self
    }

    fn records(contents: &str) -> Vec<DependencyRecord> {
        let mut records = Vec::new();
        let mut in_requires = false;

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(caps) = SECTION_RE.captures(line) {
                in_requires = matches!(&caps[1], "requires" | "build_requires" | "tool_requires");
                continue;
            }

            if !in_requires {
                continue;
            }

            let mut record = match line.split_once('/') {
                Some((name, version)) => {
                    let mut record = DependencyRecord::new(name.trim());
                    record.version = Some(version.trim().to_string());
                    record
                }
                None => DependencyRecord::new(line),
            };
            if record.artifact_id.is_empty() {
                continue;
            }
            if record.version.as_deref() == Some("") {
                record.version = None;
            }
            records.push(record);
        }

        records
    }
}

#[async_trait]
impl Parser for ConanParser {
    async fn parse(
        &self,
        _ctx: &ParserContext,
        components: &mut Vec<ComponentBuilder>,
        contents: &str,
    ) {
        for record in Self::records(contents) {
            components.push(record.into_builder("conan"));
        }
    }
}
