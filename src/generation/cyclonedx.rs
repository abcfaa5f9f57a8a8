//! CycloneDX store and serializers (JSON, XML).

use std::collections::HashMap;

use serde::Serialize;

use crate::model::{Component, ComponentId, ComponentType, License};
use crate::shared::{Result, SbomError};

use super::Tool;

/// CycloneDX component type for an internal classification.
///
/// Schema-specific mapping table; never inferred from other fields.
pub fn cdx_type(component_type: ComponentType) -> &'static str {
    match component_type {
        ComponentType::Language => "framework",
        ComponentType::Internal => "file",
        ComponentType::Application => "application",
        ComponentType::External => "library",
    }
}

/// All data of a CycloneDX BOM: document metadata, the top-level component
/// list, and a separate parent -> children map. Nesting is materialized at
/// write time by walking the map.
pub struct CycloneDxStore {
    serial_number: String,
    bom_version: u32,
    timestamp: String,
    head: Component,
    tools: Vec<Tool>,
    components: Vec<Component>,
    children: HashMap<ComponentId, Vec<Component>>,
}

impl CycloneDxStore {
    pub const SPEC_VERSION: &'static str = "1.4";

    pub fn new(serial_number: String, bom_version: u32, head: Component, timestamp: String) -> Self {
        Self {
            serial_number,
            bom_version,
            timestamp,
            head,
            tools: Vec::new(),
            components: Vec::new(),
            children: HashMap::new(),
        }
    }

    pub fn add_tool(&mut self, tool: Tool) {
        self.tools.push(tool);
    }

    /// Adds a top-level component, resolving its licenses.
    pub fn add_component(&mut self, mut component: Component) {
        component.resolve_licenses();
        self.components.push(component);
    }

    /// Adds a child under an already-registered parent.
    ///
    /// The parent must exist among top-level components or previously added
    /// children; otherwise this is a generation error and the edge is
    /// dropped by the caller.
    pub fn add_child(&mut self, parent: ComponentId, mut child: Component) -> Result<()> {
        let known = self.components.iter().any(|c| c.id() == parent)
            || self
                .children
                .values()
                .any(|list| list.iter().any(|c| c.id() == parent));

        if !known {
            return Err(SbomError::Generation {
                schema: "CycloneDX".to_string(),
                reason: format!(
                    "parent {} does not exist in components, cannot attach \"{}\"",
                    parent,
                    child.name()
                ),
            }
            .into());
        }

        child.resolve_licenses();
        self.children.entry(parent).or_default().push(child);
        Ok(())
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn children_of(&self, parent: ComponentId) -> &[Component] {
        self.children
            .get(&parent)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every component in the store, nested children included.
    pub fn all_components(&self) -> Vec<&Component> {
        let mut all: Vec<&Component> = self.components.iter().collect();
        for list in self.children.values() {
            all.extend(list.iter());
        }
        all
    }

    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    pub fn head(&self) -> &Component {
        &self.head
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    fn license_entries(licenses: &[License]) -> Option<Vec<CdxLicenseEntry>> {
        if licenses.is_empty() {
            return None;
        }
        Some(
            licenses
                .iter()
                .map(|license| CdxLicenseEntry {
                    license: CdxLicenseContent {
                        id: license.spdx_id().map(str::to_string),
                        name: match license.spdx_id() {
                            Some(_) => None,
                            None => Some(license.name().to_string()),
                        },
                        url: license.url().map(str::to_string),
                    },
                })
                .collect(),
        )
    }

    fn component_entry(&self, component: &Component) -> CdxComponent {
        let children = self.children_of(component.id());
        CdxComponent {
            component_type: cdx_type(component.component_type()).to_string(),
            name: component.name().to_string(),
            group: component.group().map(str::to_string),
            version: component.version().map(str::to_string),
            hashes: component
                .hashes()
                .iter()
                .map(|(algorithm, content)| CdxHash {
                    alg: algorithm.clone(),
                    content: content.clone(),
                })
                .collect(),
            licenses: Self::license_entries(component.licenses()),
            purl: match component.purls() {
                [] => None,
                purls => Some(purls.join(", ")),
            },
            cpe: match component.cpes() {
                [] => None,
                cpes => Some(cpes.join(", ")),
            },
            properties: if component.files().is_empty() {
                None
            } else {
                Some(
                    component
                        .files()
                        .iter()
                        .map(|file| CdxProperty {
                            name: "fileAnalyzed".to_string(),
                            value: file.clone(),
                        })
                        .collect(),
                )
            },
            components: if children.is_empty() {
                None
            } else {
                Some(children.iter().map(|child| self.component_entry(child)).collect())
            },
        }
    }

    fn head_entry(&self) -> CdxComponent {
        // The head carries the generating tools' licenses
        let tool_licenses: Vec<License> = self
            .tools
            .iter()
            .flat_map(|tool| tool.licenses().iter().cloned())
            .collect();

        CdxComponent {
            component_type: cdx_type(self.head.component_type()).to_string(),
            name: self.head.name().to_string(),
            group: self.head.group().map(str::to_string),
            version: self.head.version().map(str::to_string),
            hashes: self
                .head
                .hashes()
                .iter()
                .map(|(algorithm, content)| CdxHash {
                    alg: algorithm.clone(),
                    content: content.clone(),
                })
                .collect(),
            licenses: Self::license_entries(&tool_licenses),
            purl: None,
            cpe: None,
            properties: None,
            components: None,
        }
    }

    fn document(&self) -> CdxDocument {
        CdxDocument {
            bom_format: "CycloneDX".to_string(),
            spec_version: Self::SPEC_VERSION.to_string(),
            serial_number: self.serial_number.clone(),
            version: self.bom_version,
            metadata: CdxMetadata {
                timestamp: self.timestamp.clone(),
                tools: self
                    .tools
                    .iter()
                    .map(|tool| CdxTool {
                        vendor: tool.vendor().to_string(),
                        name: tool.name().to_string(),
                        version: tool.version().to_string(),
                        hashes: tool
                            .hashes()
                            .iter()
                            .map(|(algorithm, content)| CdxHash {
                                alg: algorithm.clone(),
                                content: content.clone(),
                            })
                            .collect(),
                    })
                    .collect(),
                component: self.head_entry(),
            },
            components: self
                .components
                .iter()
                .map(|component| self.component_entry(component))
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.document())?)
    }

    pub fn to_xml(&self) -> Result<String> {
        let document = self.document();
        let bom = XmlBom::from_document(&document);

        let mut buffer = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let mut serializer = quick_xml::se::Serializer::new(&mut buffer);
        serializer.indent(' ', 2);
        bom.serialize(serializer)?;
        Ok(buffer)
    }
}

//
// JSON document shape
//

#[derive(Debug, Serialize)]
struct CdxDocument {
    #[serde(rename = "bomFormat")]
    bom_format: String,
    #[serde(rename = "specVersion")]
    spec_version: String,
    #[serde(rename = "serialNumber")]
    serial_number: String,
    version: u32,
    metadata: CdxMetadata,
    components: Vec<CdxComponent>,
}

#[derive(Debug, Serialize)]
struct CdxMetadata {
    timestamp: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<CdxTool>,
    component: CdxComponent,
}

#[derive(Debug, Serialize)]
struct CdxTool {
    vendor: String,
    name: String,
    version: String,
    hashes: Vec<CdxHash>,
}

#[derive(Debug, Serialize)]
struct CdxHash {
    alg: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct CdxComponent {
    #[serde(rename = "type")]
    component_type: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    hashes: Vec<CdxHash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    licenses: Option<Vec<CdxLicenseEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    purl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cpe: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    properties: Option<Vec<CdxProperty>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    components: Option<Vec<CdxComponent>>,
}

#[derive(Debug, Serialize)]
struct CdxLicenseEntry {
    license: CdxLicenseContent,
}

#[derive(Debug, Serialize)]
struct CdxLicenseContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

#[derive(Debug, Serialize)]
struct CdxProperty {
    name: String,
    value: String,
}

//
// XML document shape (attributes differ from the JSON field layout)
//

#[derive(Debug, Serialize)]
#[serde(rename = "bom")]
struct XmlBom {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    #[serde(rename = "@serialNumber")]
    serial_number: String,
    #[serde(rename = "@version")]
    version: u32,
    metadata: XmlMetadata,
    components: XmlComponents,
}

#[derive(Debug, Serialize)]
struct XmlMetadata {
    timestamp: String,
    tools: XmlTools,
    component: XmlComponent,
}

#[derive(Debug, Serialize)]
struct XmlTools {
    tool: Vec<XmlTool>,
}

#[derive(Debug, Serialize)]
struct XmlTool {
    vendor: String,
    name: String,
    version: String,
    hashes: XmlHashes,
}

#[derive(Debug, Serialize)]
struct XmlHashes {
    hash: Vec<XmlHash>,
}

#[derive(Debug, Serialize)]
struct XmlHash {
    #[serde(rename = "@alg")]
    alg: String,
    #[serde(rename = "$text")]
    content: String,
}

#[derive(Debug, Serialize)]
struct XmlComponents {
    #[serde(rename = "component")]
    components: Vec<XmlComponent>,
}

#[derive(Debug, Serialize)]
struct XmlComponent {
    #[serde(rename = "@type")]
    component_type: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    hashes: XmlHashes,
    #[serde(skip_serializing_if = "Option::is_none")]
    licenses: Option<XmlLicenses>,
    #[serde(skip_serializing_if = "Option::is_none")]
    purl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    components: Option<Box<XmlComponents>>,
}

#[derive(Debug, Serialize)]
struct XmlLicenses {
    license: Vec<XmlLicenseContent>,
}

#[derive(Debug, Serialize)]
struct XmlLicenseContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

impl XmlBom {
    fn from_document(document: &CdxDocument) -> Self {
        Self {
            xmlns: "http://cyclonedx.org/schema/bom/1.4",
            serial_number: document.serial_number.clone(),
            version: document.version,
            metadata: XmlMetadata {
                timestamp: document.metadata.timestamp.clone(),
                tools: XmlTools {
                    tool: document
                        .metadata
                        .tools
                        .iter()
                        .map(|tool| XmlTool {
                            vendor: tool.vendor.clone(),
                            name: tool.name.clone(),
                            version: tool.version.clone(),
                            hashes: XmlHashes {
                                hash: tool.hashes.iter().map(XmlHash::from).collect(),
                            },
                        })
                        .collect(),
                },
                component: XmlComponent::from(&document.metadata.component),
            },
            components: XmlComponents {
                components: document.components.iter().map(XmlComponent::from).collect(),
            },
        }
    }
}

impl From<&CdxHash> for XmlHash {
    fn from(hash: &CdxHash) -> Self {
        Self {
            alg: hash.alg.clone(),
            content: hash.content.clone(),
        }
    }
}

impl From<&CdxComponent> for XmlComponent {
    fn from(component: &CdxComponent) -> Self {
        Self {
            component_type: component.component_type.clone(),
            name: component.name.clone(),
            group: component.group.clone(),
            version: component.version.clone(),
            hashes: XmlHashes {
                hash: component.hashes.iter().map(XmlHash::from).collect(),
            },
            licenses: component.licenses.as_ref().map(|entries| XmlLicenses {
                license: entries
                    .iter()
                    .map(|entry| XmlLicenseContent {
                        id: entry.license.id.clone(),
                        name: entry.license.name.clone(),
                        url: entry.license.url.clone(),
                    })
                    .collect(),
            }),
            purl: component.purl.clone(),
            components: component.components.as_ref().map(|nested| {
                Box::new(XmlComponents {
                    components: nested.iter().map(XmlComponent::from).collect(),
                })
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ComponentBuilder;

    fn store_with_head() -> CycloneDxStore {
        let mut head_builder = ComponentBuilder::new("demo");
        head_builder.set_type(ComponentType::Application);
        CycloneDxStore::new(
            "urn:uuid:00000000-0000-0000-0000-000000000000".to_string(),
            1,
            head_builder.build(),
            "2024-01-01T00:00:00+00:00".to_string(),
        )
    }

    fn component(name: &str) -> Component {
        ComponentBuilder::new(name).build()
    }

    #[test]
    fn test_cdx_type_mapping() {
        assert_eq!(cdx_type(ComponentType::Internal), "file");
        assert_eq!(cdx_type(ComponentType::Language), "framework");
        assert_eq!(cdx_type(ComponentType::Application), "application");
        assert_eq!(cdx_type(ComponentType::External), "library");
    }

    #[test]
    fn test_add_child_requires_registered_parent() {
        let mut store = store_with_head();
        let orphan = component("orphan");
        let result = store.add_child(orphan.id(), component("child"));
        assert!(result.is_err());
    }

    #[test]
    fn test_add_child_under_top_level() {
        let mut store = store_with_head();
        let parent = component("parent");
        let parent_id = parent.id();
        store.add_component(parent);

        store.add_child(parent_id, component("child")).unwrap();
        assert_eq!(store.children_of(parent_id).len(), 1);
    }

    #[test]
    fn test_add_child_under_nested_child() {
        let mut store = store_with_head();
        let parent = component("parent");
        let parent_id = parent.id();
        store.add_component(parent);

        let child = component("child");
        let child_id = child.id();
        store.add_child(parent_id, child).unwrap();
        store.add_child(child_id, component("grandchild")).unwrap();

        assert_eq!(store.children_of(child_id).len(), 1);
    }

    #[test]
    fn test_licenses_resolved_on_add() {
        let mut store = store_with_head();
        let mut builder = ComponentBuilder::new("requests");
        builder.add_license("MIT License");
        store.add_component(builder.build());

        let added = &store.components()[0];
        assert_eq!(added.licenses()[0].spdx_id(), Some("MIT"));
    }

    #[test]
    fn test_json_document_shape() {
        let mut store = store_with_head();
        let mut builder = ComponentBuilder::new("requests");
        builder.set_version("2.31.0");
        builder.add_license("MIT");
        store.add_component(builder.build());

        let json = store.to_json().unwrap();
        assert!(json.contains("\"bomFormat\": \"CycloneDX\""));
        assert!(json.contains("\"specVersion\": \"1.4\""));
        assert!(json.contains("\"name\": \"requests\""));
        assert!(json.contains("\"id\": \"MIT\""));
    }

    #[test]
    fn test_json_nests_children_under_parent() {
        let mut store = store_with_head();
        let parent = component("parent");
        let parent_id = parent.id();
        store.add_component(parent);
        store.add_child(parent_id, component("nested-child")).unwrap();

        let json = store.to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let top = &parsed["components"][0];
        assert_eq!(top["name"], "parent");
        assert_eq!(top["components"][0]["name"], "nested-child");
    }

    #[test]
    fn test_component_without_license_omits_field() {
        let mut store = store_with_head();
        store.add_component(component("bare"));

        let parsed: serde_json::Value = serde_json::from_str(&store.to_json().unwrap()).unwrap();
        assert!(parsed["components"][0].get("licenses").is_none());
    }

    #[test]
    fn test_unresolved_license_emitted_by_name() {
        let mut store = store_with_head();
        let mut builder = ComponentBuilder::new("mystery");
        builder.add_license("Custom Internal EULA");
        store.add_component(builder.build());

        let parsed: serde_json::Value = serde_json::from_str(&store.to_json().unwrap()).unwrap();
        let license = &parsed["components"][0]["licenses"][0]["license"];
        assert_eq!(license["name"], "Custom Internal EULA");
        assert!(license.get("id").is_none());
    }

    #[test]
    fn test_xml_document_shape() {
        let mut store = store_with_head();
        store.add_component(component("requests"));

        let xml = store.to_xml().unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\""));
        assert!(xml.contains("<bom"));
        assert!(xml.contains("serialNumber=\"urn:uuid:00000000-0000-0000-0000-000000000000\""));
        assert!(xml.contains("<name>requests</name>"));
    }
}
