//! Gradle `build.gradle` parser.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::model::ComponentBuilder;
use crate::parsers::languages::{strip_comments, CommentStyle};
use crate::parsers::{Parser, ParserContext};
use crate::registry::RegistryQuery;

use super::maven::extract_licenses;
use super::{
    resolve_properties, run_license_lookups, substitute, DependencyRecord, LicenseLookup,
};

const ARTIFACT_URL: &str = "https://central.sonatype.com/artifact/";

const GRADLE_COMMENTS: CommentStyle = CommentStyle {
    line: "//",
    block: Some(("/*", "*/")),
};

/// `section { ... }` blocks of a build script.
static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*([\w.]+)[ \t]*\{([^}]*)\}").expect("gradle block regex must compile")
});

/// One dependency declaration: `implementation 'group:artifact:version'`.
static DEPENDENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(\w+)[ \t]*\(?[ \t]*['"]([^'"]+)['"]"#)
        .expect("gradle dependency regex must compile")
});

/// `key = value` lines of an `ext` block.
static PROPERTY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^([\w.]+)[ \t]*=[ \t]*['"]?([^'"\n]*)['"]?$"#)
        .expect("gradle property regex must compile")
});

/// Parses dependency declarations from the `dependencies` block, resolving
/// `$var` references against the `ext` property block, and enriches
/// licenses from Maven Central.
pub struct GradleParser {
    registry: Arc<dyn RegistryQuery>,
}

impl GradleParser {
    pub fn new(registry: Arc<dyn RegistryQuery>) -> Self {
        Self { registry }
    }

    fn records(contents: &str) -> Vec<DependencyRecord> {
        let stripped = strip_comments(contents, GRADLE_COMMENTS);

        let mut properties: HashMap<String, String> = HashMap::new();
        let mut dependency_lines: Vec<String> = Vec::new();

        for caps in BLOCK_RE.captures_iter(&stripped) {
            let section = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let body = caps.get(2).map(|m| m.as_str()).unwrap_or("");

            match section {
                "ext" => {
                    for line in body.lines() {
                        if let Some(prop_caps) = PROPERTY_RE.captures(line.trim()) {
                            properties.insert(
                                prop_caps[1].trim().to_string(),
                                prop_caps[2].trim().to_string(),
                            );
                        }
                    }
                }
                "dependencies" => {
                    dependency_lines
                        .extend(body.lines().map(|l| l.trim().to_string()).filter(|l| !l.is_empty()));
                }
                _ => {}
            }
        }

        let properties = resolve_properties(&properties);

        dependency_lines
            .iter()
            .filter_map(|line| {
                let caps = DEPENDENCY_RE.captures(line)?;
                let coordinate = substitute(&caps[2], &properties);

                // group:artifact:version, artifact alone for flat declarations
                let mut parts = coordinate.splitn(3, ':');
                let first = parts.next()?.to_string();
                let second = parts.next().map(str::to_string);
                let third = parts.next().map(str::to_string);

                let mut record = match second {
                    Some(artifact) => {
                        let mut record = DependencyRecord::new(artifact);
                        record.group_id = Some(first);
                        record
                    }
                    None => DependencyRecord::new(first),
                };
                record.version = third;
                Some(record)
            })
            .collect()
    }
}

#[async_trait]
impl Parser for GradleParser {
    async fn parse(
        &self,
        _ctx: &ParserContext,
        components: &mut Vec<ComponentBuilder>,
        contents: &str,
    ) {
        let records = Self::records(contents);

        let mut builders = Vec::with_capacity(records.len());
        let mut lookups = Vec::new();

        for record in records {
            if let (Some(group), Some(version)) = (&record.group_id, &record.version) {
                lookups.push(LicenseLookup {
                    index: builders.len(),
                    url: format!(
                        "{}{}/{}/{}",
                        ARTIFACT_URL, group, record.artifact_id, version
                    ),
                    extract: extract_licenses,
                });
            }
            builders.push(record.into_builder("maven"));
        }

        run_license_lookups(&self.registry, lookups, &mut builders).await;
        components.append(&mut builders);
    }
}
