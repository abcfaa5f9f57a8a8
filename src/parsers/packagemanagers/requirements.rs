//! pip `requirements.txt` parser.

use std::sync::Arc;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;

use crate::model::ComponentBuilder;
use crate::parsers::{Parser, ParserContext};
use crate::registry::RegistryQuery;

use super::{run_license_lookups, DependencyRecord, LicenseLookup};

const PYPI_URL: &str = "https://pypi.org/pypi/";

/// One requirement per line: `name`, `name == version`, or `name @ source`.
static REQUIREMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([^#=@\s<>~!;]+)\s*(?:==\s*(\S+)|@\s*(\S+))?")
        .expect("requirements regex must compile")
});

#[derive(Debug, Deserialize)]
struct PyPiPackageInfo {
    info: PyPiInfo,
}

#[derive(Debug, Deserialize)]
struct PyPiInfo {
    #[serde(default)]
    license: Option<String>,
    #[serde(default)]
    license_expression: Option<String>,
    #[serde(default)]
    classifiers: Vec<String>,
}

/// Selects a license string from PyPI metadata.
///
/// Priority: the license field (unless empty or "UNKNOWN"), then the
/// license expression, then the first OSI-approved classifier.
fn select_license(
    license: Option<String>,
    license_expression: Option<String>,
    classifiers: &[String],
) -> Option<String> {
    license
        .filter(|l| !l.is_empty() && l != "UNKNOWN")
        .or_else(|| license_expression.filter(|l| !l.is_empty()))
        .or_else(|| {
            classifiers.iter().find_map(|classifier| {
                classifier
                    .strip_prefix("License :: OSI Approved :: ")
                    .map(str::to_string)
            })
        })
}

pub(crate) fn extract_licenses(body: &str) -> Vec<String> {
    let package: PyPiPackageInfo = match serde_json::from_str(body) {
        Ok(package) => package,
        Err(_) => return Vec::new(),
    };
    select_license(
        package.info.license,
        package.info.license_expression,
        &package.info.classifiers,
    )
    .into_iter()
    .collect()
}

/// Parses one dependency per requirement line and enriches licenses from
/// the PyPI JSON API.
pub struct RequirementsParser {
    registry: Arc<dyn RegistryQuery>,
}

impl RequirementsParser {
    pub fn new(registry: Arc<dyn RegistryQuery>) -> Self {
        Self { registry }
    }

    fn records(contents: &str) -> Vec<DependencyRecord> {
        contents
            .lines()
            .filter(|line| {
                let line = line.trim_start();
                // '#' starts a comment, '-' a pip option such as -r or -e
                !line.starts_with('#') && !line.starts_with('-')
            })
            .filter_map(|line| {
                let caps = REQUIREMENT_RE.captures(line)?;
                let name = caps.get(1)?.as_str();
                // Strip extras: package[extra] pins the same distribution
                let name = name.split('[').next().unwrap_or(name);
                if name.is_empty() {
                    return None;
                }

                let mut record = DependencyRecord::new(name);
                record.version = caps.get(2).map(|m| m.as_str().to_string());
                record.group_id = caps.get(3).map(|m| m.as_str().to_string());
                Some(record)
            })
            .collect()
    }

    fn lookup_url(record: &DependencyRecord) -> String {
        let name = record.artifact_id.to_lowercase().replace('_', "-");
        match &record.version {
            Some(version) => format!(
                "{}{}/{}/json",
                PYPI_URL,
                urlencoding::encode(&name),
                urlencoding::encode(version)
            ),
            None => format!("{}{}/json", PYPI_URL, urlencoding::encode(&name)),
        }
    }
}

#[async_trait]
impl Parser for RequirementsParser {
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
            lookups.push(LicenseLookup {
                index: builders.len(),
                url: Self::lookup_url(&record),
                extract: extract_licenses,
            });
            builders.push(record.into_builder("pypi"));
        }

        run_license_lookups(&self.registry, lookups, &mut builders).await;
        components.append(&mut builders);
    }
}
