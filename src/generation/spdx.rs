//! SPDX store and serializers (JSON, tag-value, YAML).

use std::collections::HashMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::model::{Component, ComponentId, ComponentType};
use crate::shared::{Result, SbomError};

use super::Tool;

/// SPDX package purpose for an internal classification.
///
/// Schema-specific mapping table; never inferred from other fields.
pub fn spdx_purpose(component_type: ComponentType) -> &'static str {
    match component_type {
        ComponentType::Language => "FRAMEWORK",
        ComponentType::Internal => "FILE",
        ComponentType::Application => "APPLICATION",
        ComponentType::External => "LIBRARY",
    }
}

/// A DEPENDS_ON pair between two SPDX elements, recorded as the build walk
/// discovers parent/child edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub spdx_element_id: String,
    pub related_spdx_element: String,
}

/// All data of an SPDX document. Unlike the CycloneDX store, the package
/// list is fully denormalized during the build walk: every component lands
/// in one flat list and nesting is preserved as explicit relationships.
pub struct SpdxStore {
    serial_number: String,
    bom_version: u32,
    timestamp: String,
    head: Component,
    tools: Vec<Tool>,
    packages: Vec<Component>,
    spdx_ids: HashMap<ComponentId, String>,
    document_describes: Vec<String>,
    relationships: Vec<Relationship>,
    files: Vec<(String, String)>,
    external_licenses: Vec<(String, String)>,
    next_id: usize,
    next_license_id: usize,
}

impl SpdxStore {
    pub const SPEC_VERSION: &'static str = "SPDX-2.3";
    pub const DOCUMENT_ID: &'static str = "SPDXRef-DOCUMENT";

    pub fn new(serial_number: String, bom_version: u32, head: Component, timestamp: String) -> Self {
        Self {
            serial_number,
            bom_version,
            timestamp,
            head,
            tools: Vec::new(),
            packages: Vec::new(),
            spdx_ids: HashMap::new(),
            document_describes: Vec::new(),
            relationships: Vec::new(),
            files: Vec::new(),
            external_licenses: Vec::new(),
            next_id: 0,
            next_license_id: 0,
        }
    }

    pub fn add_tool(&mut self, tool: Tool) {
        self.tools.push(tool);
    }

    /// Adds a package, assigning the next SPDX reference id, resolving its
    /// licenses (unresolvable ones get a document-local license ref), and
    /// indexing its analyzed files.
    pub fn add_component(&mut self, mut component: Component) {
        let spdx_id = self.next_ref();

        component.resolve_licenses();
        for unresolved in component.unresolved_licenses() {
            let name = unresolved.name().to_string();
            if !self.external_licenses.iter().any(|(_, n)| *n == name) {
                let license_ref = self.next_license_ref();
                self.external_licenses.push((license_ref, name));
            }
        }

        for file in component.files() {
            if !self.files.iter().any(|(name, _)| name == file) {
                let file_ref = self.next_ref();
                self.files.push((file.clone(), file_ref));
            }
        }

        self.spdx_ids.insert(component.id(), spdx_id.clone());
        self.document_describes.push(spdx_id);
        self.packages.push(component);
    }

    /// Adds a child package and a DEPENDS_ON relationship from its parent.
    ///
    /// The parent must already be registered; otherwise this is a
    /// generation error and the caller drops the edge.
    pub fn add_child(&mut self, parent: ComponentId, child: Component) -> Result<()> {
        let parent_id = match self.spdx_ids.get(&parent) {
            Some(parent_id) => parent_id.clone(),
            None => {
                return Err(SbomError::Generation {
                    schema: "SPDX".to_string(),
                    reason: format!(
                        "no package with id {} found when inserting \"{}\"",
                        parent,
                        child.name()
                    ),
                }
                .into())
            }
        };

        let child_component_id = child.id();
        self.add_component(child);
        let child_id = self.spdx_ids[&child_component_id].clone();

        self.relationships.push(Relationship {
            spdx_element_id: parent_id,
            related_spdx_element: child_id,
        });
        Ok(())
    }

    pub fn packages(&self) -> &[Component] {
        &self.packages
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn spdx_id_of(&self, id: ComponentId) -> Option<&str> {
        self.spdx_ids.get(&id).map(String::as_str)
    }

    pub fn bom_version(&self) -> u32 {
        self.bom_version
    }

    fn next_ref(&mut self) -> String {
        let id = self.next_id;
        self.next_id += 1;
        if id < 10 {
            format!("SPDXRef-0{}", id)
        } else {
            format!("SPDXRef-{}", id)
        }
    }

    fn next_license_ref(&mut self) -> String {
        let id = self.next_license_id;
        self.next_license_id += 1;
        if id < 10 {
            format!("SPDXRef-License-0{}", id)
        } else {
            format!("SPDXRef-License-{}", id)
        }
    }

    /// Concluded license expression for a package: SPDX ids joined with
    /// AND, document-local refs for unresolvable names, NOASSERTION when
    /// the package has no license at all.
    fn license_concluded(&self, component: &Component) -> String {
        let mut parts = Vec::new();
        for license in component.licenses() {
            match license.spdx_id() {
                Some(id) => parts.push(id.to_string()),
                None => {
                    if let Some((license_ref, _)) = self
                        .external_licenses
                        .iter()
                        .find(|(_, name)| name == license.name())
                    {
                        parts.push(license_ref.clone());
                    }
                }
            }
        }
        if parts.is_empty() {
            "NOASSERTION".to_string()
        } else {
            parts.join(" AND ")
        }
    }

    fn data_license(&self) -> String {
        let ids: Vec<&str> = self
            .tools
            .iter()
            .flat_map(|tool| tool.licenses())
            .filter_map(|license| license.spdx_id())
            .collect();
        if ids.is_empty() {
            "NOASSERTION".to_string()
        } else {
            ids.join(" AND ")
        }
    }

    fn package_entry(&self, component: &Component) -> SpdxPackage {
        let external_refs: Vec<SpdxExternalRef> = component
            .purls()
            .iter()
            .map(|purl| SpdxExternalRef {
                reference_category: "SECURITY".to_string(),
                reference_type: "purl".to_string(),
                reference_locator: purl.clone(),
            })
            .chain(component.cpes().iter().map(|cpe| SpdxExternalRef {
                reference_category: "SECURITY".to_string(),
                reference_type: "cpe23Type".to_string(),
                reference_locator: cpe.clone(),
            }))
            .collect();

        SpdxPackage {
            spdx_id: self.spdx_ids[&component.id()].clone(),
            name: component.name().to_string(),
            version_info: component.version().map(str::to_string),
            primary_package_purpose: spdx_purpose(component.component_type()).to_string(),
            download_location: "NOASSERTION".to_string(),
            copyright_text: "NOASSERTION".to_string(),
            license_concluded: self.license_concluded(component),
            external_refs: if external_refs.is_empty() {
                None
            } else {
                Some(external_refs)
            },
        }
    }

    fn document(&self) -> SpdxDocument {
        SpdxDocument {
            spdx_id: Self::DOCUMENT_ID.to_string(),
            spdx_version: Self::SPEC_VERSION.to_string(),
            creation_info: SpdxCreationInfo {
                created: self.timestamp.clone(),
                creators: self.tools.iter().map(Tool::creator_string).collect(),
            },
            name: self.head.name().to_string(),
            data_license: self.data_license(),
            has_extracted_licensing_infos: self
                .external_licenses
                .iter()
                .map(|(license_ref, name)| SpdxExtractedLicense {
                    license_id: license_ref.clone(),
                    name: name.clone(),
                })
                .collect(),
            document_describes: self.document_describes.clone(),
            document_namespace: self.serial_number.clone(),
            packages: self
                .packages
                .iter()
                .map(|component| self.package_entry(component))
                .collect(),
            files: self
                .files
                .iter()
                .map(|(file_name, file_ref)| SpdxFile {
                    spdx_id: file_ref.clone(),
                    file_name: file_name.clone(),
                    file_types: vec!["SOURCE".to_string()],
                })
                .collect(),
            relationships: self
                .relationships
                .iter()
                .map(|relationship| SpdxRelationship {
                    spdx_element_id: relationship.spdx_element_id.clone(),
                    related_spdx_element: relationship.related_spdx_element.clone(),
                    relationship_type: "DEPENDS_ON".to_string(),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.document())?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(&self.document())?)
    }

    /// Renders the classic tag-value text form.
    pub fn to_tag_value(&self) -> String {
        let document = self.document();
        let mut out = String::new();

        let _ = writeln!(out, "SPDXVersion: {}", document.spdx_version);
        let _ = writeln!(out, "DataLicense: {}", document.data_license);
        let _ = writeln!(out, "SPDXID: {}", document.spdx_id);
        let _ = writeln!(out, "DocumentName: {}", document.name);
        let _ = writeln!(out, "DocumentNamespace: {}", document.document_namespace);
        for creator in &document.creation_info.creators {
            let _ = writeln!(out, "Creator: {}", creator);
        }
        let _ = writeln!(out, "Created: {}", document.creation_info.created);

        for (license_ref, name) in &self.external_licenses {
            let _ = writeln!(out);
            let _ = writeln!(out, "LicenseID: {}", license_ref);
            let _ = writeln!(out, "LicenseName: {}", name);
        }

        for package in &document.packages {
            let _ = writeln!(out);
            let _ = writeln!(out, "PackageName: {}", package.name);
            let _ = writeln!(out, "SPDXID: {}", package.spdx_id);
            if let Some(version) = &package.version_info {
                let _ = writeln!(out, "PackageVersion: {}", version);
            }
            let _ = writeln!(out, "PackageDownloadLocation: {}", package.download_location);
            let _ = writeln!(out, "PackageCopyrightText: {}", package.copyright_text);
            let _ = writeln!(out, "PackageLicenseConcluded: {}", package.license_concluded);
            for external_ref in package.external_refs.iter().flatten() {
                let _ = writeln!(
                    out,
                    "ExternalRef: {} {} {}",
                    external_ref.reference_category,
                    external_ref.reference_type,
                    external_ref.reference_locator
                );
            }
        }

        for file in &document.files {
            let _ = writeln!(out);
            let _ = writeln!(out, "FileName: {}", file.file_name);
            let _ = writeln!(out, "SPDXID: {}", file.spdx_id);
            let _ = writeln!(out, "FileType: SOURCE");
        }

        if !document.relationships.is_empty() {
            let _ = writeln!(out);
            for relationship in &document.relationships {
                let _ = writeln!(
                    out,
                    "Relationship: {} {} {}",
                    relationship.spdx_element_id,
                    relationship.relationship_type,
                    relationship.related_spdx_element
                );
            }
        }

        out
    }
}

//
// Document shape shared by the JSON and YAML serializers
//

#[derive(Debug, Serialize)]
struct SpdxDocument {
    #[serde(rename = "SPDXID")]
    spdx_id: String,
    #[serde(rename = "spdxVersion")]
    spdx_version: String,
    #[serde(rename = "creationInfo")]
    creation_info: SpdxCreationInfo,
    name: String,
    #[serde(rename = "dataLicense")]
    data_license: String,
    #[serde(rename = "hasExtractedLicensingInfos", skip_serializing_if = "Vec::is_empty")]
    has_extracted_licensing_infos: Vec<SpdxExtractedLicense>,
    #[serde(rename = "documentDescribes")]
    document_describes: Vec<String>,
    #[serde(rename = "documentNamespace")]
    document_namespace: String,
    packages: Vec<SpdxPackage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    files: Vec<SpdxFile>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    relationships: Vec<SpdxRelationship>,
}

#[derive(Debug, Serialize)]
struct SpdxCreationInfo {
    created: String,
    creators: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SpdxExtractedLicense {
    #[serde(rename = "licenseId")]
    license_id: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct SpdxPackage {
    #[serde(rename = "SPDXID")]
    spdx_id: String,
    name: String,
    #[serde(rename = "versionInfo", skip_serializing_if = "Option::is_none")]
    version_info: Option<String>,
    #[serde(rename = "primaryPackagePurpose")]
    primary_package_purpose: String,
    #[serde(rename = "downloadLocation")]
    download_location: String,
    #[serde(rename = "copyrightText")]
    copyright_text: String,
    #[serde(rename = "licenseConcluded")]
    license_concluded: String,
    #[serde(rename = "externalRefs", skip_serializing_if = "Option::is_none")]
    external_refs: Option<Vec<SpdxExternalRef>>,
}

#[derive(Debug, Serialize)]
struct SpdxExternalRef {
    #[serde(rename = "referenceCategory")]
    reference_category: String,
    #[serde(rename = "referenceType")]
    reference_type: String,
    #[serde(rename = "referenceLocator")]
    reference_locator: String,
}

#[derive(Debug, Serialize)]
struct SpdxFile {
    #[serde(rename = "SPDXID")]
    spdx_id: String,
    #[serde(rename = "fileName")]
    file_name: String,
    #[serde(rename = "fileTypes")]
    file_types: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SpdxRelationship {
    #[serde(rename = "spdxElementId")]
    spdx_element_id: String,
    #[serde(rename = "relatedSpdxElement")]
    related_spdx_element: String,
    #[serde(rename = "relationshipType")]
    relationship_type: String,
}
