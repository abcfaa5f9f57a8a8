//! Maven `pom.xml` parser.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::model::ComponentBuilder;
use crate::parsers::{Parser, ParserContext};
use crate::registry::RegistryQuery;

use super::{
    resolve_properties, run_license_lookups, substitute, DependencyRecord, LicenseLookup,
};

const ARTIFACT_URL: &str = "https://central.sonatype.com/artifact/";

#[derive(Debug, Deserialize)]
struct PomProject {
    properties: Option<HashMap<String, String>>,
    dependencies: Option<PomDependencies>,
}

#[derive(Debug, Deserialize)]
struct PomDependencies {
    #[serde(default)]
    dependency: Vec<PomDependency>,
}

#[derive(Debug, Deserialize)]
struct PomDependency {
    #[serde(rename = "groupId")]
    group_id: Option<String>,
    #[serde(rename = "artifactId")]
    artifact_id: Option<String>,
    version: Option<String>,
}

/// License entries on a Maven Central artifact page.
static LICENSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<li data-test="license">(.*?)</li>"#).expect("license regex must compile")
});

pub(crate) fn extract_licenses(body: &str) -> Vec<String> {
    LICENSE_RE
        .captures_iter(body)
        .map(|caps| caps[1].trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

/// Parses `<dependencies>` entries, resolving `${property}` references
/// against the `<properties>` block, and enriches licenses from Maven
/// Central.
pub struct MavenParser {
    registry: Arc<dyn RegistryQuery>,
}

impl MavenParser {
    pub fn new(registry: Arc<dyn RegistryQuery>) -> Self {
        Self { registry }
    }

    fn records(contents: &str) -> Vec<DependencyRecord> {
        let project: PomProject = match quick_xml::de::from_str(contents) {
            Ok(project) => project,
            Err(e) => {
                debug!(error = %e, "unparseable pom.xml, skipping");
                return Vec::new();
            }
        };

        let properties = resolve_properties(&project.properties.unwrap_or_default());

        let dependencies = match project.dependencies {
            Some(dependencies) => dependencies.dependency,
            None => return Vec::new(),
        };

        dependencies
            .into_iter()
            .filter_map(|dep| {
                let artifact_id = substitute(dep.artifact_id?.trim(), &properties);
                if artifact_id.is_empty() {
                    return None;
                }
                let mut record = DependencyRecord::new(artifact_id);
                record.group_id = dep
                    .group_id
                    .map(|g| substitute(g.trim(), &properties))
                    .filter(|g| !g.is_empty());
                record.version = dep
                    .version
                    .map(|v| substitute(v.trim(), &properties))
                    .filter(|v| !v.is_empty());
                Some(record)
            })
            .collect()
    }
}

#[async_trait]
impl Parser for MavenParser {
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
            // Only fully-coordinated artifacts have a registry page
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
