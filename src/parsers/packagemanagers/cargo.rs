//! Cargo `Cargo.toml` parser.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::model::ComponentBuilder;
use crate::parsers::{Parser, ParserContext};
use crate::registry::RegistryQuery;

use super::{run_license_lookups, DependencyRecord, LicenseLookup};

const CRATES_IO_URL: &str = "https://crates.io/api/v1/crates/";

#[derive(Debug, Deserialize)]
struct CargoManifest {
    #[serde(default)]
    dependencies: toml::Table,
    #[serde(default, rename = "dev-dependencies")]
    dev_dependencies: toml::Table,
    #[serde(default, rename = "build-dependencies")]
    build_dependencies: toml::Table,
}

#[derive(Debug, Deserialize)]
struct CratesIoVersion {
    version: CratesIoVersionInfo,
}

#[derive(Debug, Deserialize)]
struct CratesIoVersionInfo {
    #[serde(default)]
    license: Option<String>,
}

pub(crate) fn extract_licenses(body: &str) -> Vec<String> {
    match serde_json::from_str::<CratesIoVersion>(body) {
        Ok(response) => response.version.license.into_iter().collect(),
        Err(_) => Vec::new(),
    }
}

/// Parses `[dependencies]`, `[dev-dependencies]`, and `[build-dependencies]`
/// tables and enriches licenses from the crates.io API.
pub struct CargoParser {
    registry: Arc<dyn RegistryQuery>,
}

impl CargoParser {
    pub fn new(registry: Arc<dyn RegistryQuery>) -> Self {
        Self { registry }
    }

    fn record_from_entry(name: &str, value: &toml::Value) -> Option<DependencyRecord> {
        match value {
            // serde = "1.0"
            toml::Value::String(version) => {
                let mut record = DependencyRecord::new(name);
                record.version = Some(version.clone());
                Some(record)
            }
            // serde = { version = "1.0", features = [...] } / { path = ".." }
            toml::Value::Table(table) => {
                // Renamed dependencies point at the real crate
                let real_name = table
                    .get("package")
                    .and_then(|p| p.as_str())
                    .unwrap_or(name);
                let mut record = DependencyRecord::new(real_name);
                record.version = table
                    .get("version")
                    .and_then(|v| v.as_str())
                    .map(str::to_string);
                Some(record)
            }
            _ => None,
        }
    }

    fn records(contents: &str) -> Vec<DependencyRecord> {
        let manifest: CargoManifest = match toml::from_str(contents) {
            Ok(manifest) => manifest,
            Err(e) => {
                debug!(error = %e, "unparseable Cargo.toml, skipping");
                return Vec::new();
            }
        };

        [
            manifest.dependencies,
            manifest.dev_dependencies,
            manifest.build_dependencies,
        ]
        .iter()
        .flat_map(|table| {
            table
                .iter()
                .filter_map(|(name, value)| Self::record_from_entry(name, value))
        })
        .collect()
    }
}

#[async_trait]
impl Parser for CargoParser {
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
            if let Some(version) = &record.version {
                // Exact versions only; requirement ranges have no API page
                if version.chars().next().is_some_and(|c| c.is_ascii_digit()) {
                    lookups.push(LicenseLookup {
                        index: builders.len(),
                        url: format!("{}{}/{}", CRATES_IO_URL, record.artifact_id, version),
                        extract: extract_licenses,
                    });
                }
            }
            builders.push(record.into_builder("cargo"));
        }

        run_license_lookups(&self.registry, lookups, &mut builders).await;
        components.append(&mut builders);
    }
}
