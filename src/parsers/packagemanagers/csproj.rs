//! NuGet `.csproj` parser.

use std::sync::Arc;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::model::ComponentBuilder;
use crate::parsers::{Parser, ParserContext};
use crate::registry::RegistryQuery;

use super::{run_license_lookups, DependencyRecord, LicenseLookup};

const NUGET_URL: &str = "https://api.nuget.org/v3-flatcontainer/";

#[derive(Debug, Deserialize)]
struct CsProj {
    #[serde(default, rename = "ItemGroup")]
    item_groups: Vec<ItemGroup>,
}

#[derive(Debug, Deserialize)]
struct ItemGroup {
    #[serde(default, rename = "PackageReference")]
    package_references: Vec<PackageReference>,
}

#[derive(Debug, Deserialize)]
struct PackageReference {
    #[serde(rename = "@Include")]
    include: Option<String>,
    #[serde(rename = "@Version")]
    version: Option<String>,
}

/// `<license type="expression">MIT</license>` in a nuspec document.
static NUSPEC_LICENSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<license[^>]*>([^<]+)</license>").expect("nuspec license regex must compile")
});

pub(crate) fn extract_licenses(body: &str) -> Vec<String> {
    NUSPEC_LICENSE_RE
        .captures_iter(body)
        .map(|caps| caps[1].trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

/// Parses `<PackageReference Include=".." Version=".." />` items and
/// enriches licenses from the NuGet nuspec endpoint.
pub struct CsProjParser {
    registry: Arc<dyn RegistryQuery>,
}

impl CsProjParser {
    pub fn new(registry: Arc<dyn RegistryQuery>) -> Self {
        Self { registry }
    }

    fn records(contents: &str) -> Vec<DependencyRecord> {
        let project: CsProj = match quick_xml::de::from_str(contents) {
            Ok(project) => project,
            Err(e) => {
                debug!(error = %e, "unparseable csproj, skipping");
                return Vec::new();
            }
        };

        project
            .item_groups
            .into_iter()
            .flat_map(|group| group.package_references)
            .filter_map(|reference| {
                let mut record = DependencyRecord::new(reference.include?.trim());
                if record.artifact_id.is_empty() {
                    return None;
                }
                record.version = reference.version.map(|v| v.trim().to_string());
                Some(record)
            })
            .collect()
    }
}

#[async_trait]
impl Parser for CsProjParser {
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
                let id = record.artifact_id.to_lowercase();
                lookups.push(LicenseLookup {
                    index: builders.len(),
                    url: format!("{}{}/{}/{}.nuspec", NUGET_URL, id, version, id),
                    extract: extract_licenses,
                });
            }
            builders.push(record.into_builder("nuget"));
        }

        run_license_lookups(&self.registry, lookups, &mut builders).await;
        components.append(&mut builders);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{FailingRegistry, StaticRegistry};
    use super::*;

    const CSPROJ: &str = r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <TargetFramework>net7.0</TargetFramework>
  </PropertyGroup>
  <ItemGroup>
    <PackageReference Include="Newtonsoft.Json" Version="13.0.3" />
    <PackageReference Include="Serilog" Version="3.0.1" />
  </ItemGroup>
</Project>"#;

    async fn parse_with(
        registry: Arc<dyn RegistryQuery>,
        contents: &str,
    ) -> Vec<ComponentBuilder> {
        let mut components = Vec::new();
        CsProjParser::new(registry)
            .parse(&ParserContext::new("proj"), &mut components, contents)
            .await;
        components
    }

    #[tokio::test]
    async fn test_parses_package_references() {
        let components = parse_with(Arc::new(FailingRegistry), CSPROJ).await;

        assert_eq!(components.len(), 2);
        assert_eq!(components[0].name(), "Newtonsoft.Json");
        assert_eq!(components[0].version(), Some("13.0.3"));
        assert_eq!(components[1].name(), "Serilog");
    }

    #[tokio::test]
    async fn test_enrichment_reads_nuspec_license() {
        let registry = StaticRegistry {
            status: 200,
            body: r#"<package><metadata><license type="expression">MIT</license></metadata></package>"#
                .to_string(),
        };
        let components = parse_with(Arc::new(registry), CSPROJ).await;
        let built = components[0].clone().build();
        assert_eq!(built.license_names(), ["MIT"]);
    }

    #[tokio::test]
    async fn test_malformed_csproj_yields_no_components() {
        let components = parse_with(Arc::new(FailingRegistry), "<Project><broken").await;
        assert!(components.is_empty());
    }

    #[tokio::test]
    async fn test_item_group_without_packages() {
        let csproj = r#"<Project><ItemGroup><Compile Include="A.cs" /></ItemGroup></Project>"#;
        let components = parse_with(Arc::new(FailingRegistry), csproj).await;
        assert!(components.is_empty());
    }

    #[tokio::test]
    async fn test_purl_type_is_nuget() {
        let components = parse_with(Arc::new(FailingRegistry), CSPROJ).await;
        let built = components[1].clone().build();
        assert_eq!(built.purls(), ["pkg:nuget/Serilog@3.0.1"]);
    }
}
