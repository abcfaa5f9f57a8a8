//! Schema generators and serializers: projecting the dependency graph into
//! CycloneDX and SPDX documents.

pub mod cyclonedx;
pub mod spdx;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::warn;
use uuid::Uuid;

use crate::model::{License, Sbom};
use crate::shared::{Result, SbomError};

use cyclonedx::CycloneDxStore;
use spdx::SpdxStore;

/// Supported SBOM document schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorSchema {
    CycloneDx,
    Spdx,
}

impl GeneratorSchema {
    pub fn spec_version(self) -> &'static str {
        match self {
            GeneratorSchema::CycloneDx => "1.4",
            GeneratorSchema::Spdx => "2.3",
        }
    }

    /// Formats this schema can be written to, default first.
    pub fn supported_formats(self) -> &'static [GeneratorFormat] {
        match self {
            GeneratorSchema::CycloneDx => &[GeneratorFormat::Json, GeneratorFormat::Xml],
            GeneratorSchema::Spdx => &[
                GeneratorFormat::Json,
                GeneratorFormat::TagValue,
                GeneratorFormat::Yaml,
            ],
        }
    }

    pub fn supports_format(self, format: GeneratorFormat) -> bool {
        self.supported_formats().contains(&format)
    }

    pub fn default_format(self) -> GeneratorFormat {
        self.supported_formats()[0]
    }
}

impl fmt::Display for GeneratorSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorSchema::CycloneDx => write!(f, "CycloneDX"),
            GeneratorSchema::Spdx => write!(f, "SPDX"),
        }
    }
}

impl FromStr for GeneratorSchema {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cdx" | "cyclonedx" => Ok(GeneratorSchema::CycloneDx),
            "spdx" => Ok(GeneratorSchema::Spdx),
            _ => Err(format!(
                "Invalid schema: {}. Please specify 'cyclonedx' or 'spdx'",
                s
            )),
        }
    }
}

/// Supported output formats across all schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorFormat {
    Json,
    Xml,
    Yaml,
    TagValue,
}

impl GeneratorFormat {
    pub fn extension(self) -> &'static str {
        match self {
            GeneratorFormat::Json => "json",
            GeneratorFormat::Xml => "xml",
            GeneratorFormat::Yaml => "yml",
            GeneratorFormat::TagValue => "spdx",
        }
    }
}

impl fmt::Display for GeneratorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorFormat::Json => write!(f, "JSON"),
            GeneratorFormat::Xml => write!(f, "XML"),
            GeneratorFormat::Yaml => write!(f, "YAML"),
            GeneratorFormat::TagValue => write!(f, "Tag-Value"),
        }
    }
}

impl FromStr for GeneratorFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(GeneratorFormat::Json),
            "xml" => Ok(GeneratorFormat::Xml),
            "yaml" | "yml" => Ok(GeneratorFormat::Yaml),
            "tag-value" | "tagvalue" | "spdx" => Ok(GeneratorFormat::TagValue),
            _ => Err(format!(
                "Invalid format: {}. Please specify 'json', 'xml', 'yaml' or 'tag-value'",
                s
            )),
        }
    }
}

/// Record of the tool that generated a document.
#[derive(Debug, Clone)]
pub struct Tool {
    vendor: String,
    name: String,
    version: String,
    licenses: Vec<License>,
    hashes: BTreeMap<String, String>,
}

impl Tool {
    pub fn new(vendor: &str, name: &str, version: &str) -> Self {
        Self {
            vendor: vendor.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            licenses: Vec::new(),
            hashes: BTreeMap::new(),
        }
    }

    pub fn add_license(&mut self, license: License) {
        self.licenses.push(license);
    }

    pub fn add_hash(&mut self, algorithm: &str, digest: &str) {
        self.hashes.insert(algorithm.to_string(), digest.to_string());
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn licenses(&self) -> &[License] {
        &self.licenses
    }

    pub fn hashes(&self) -> &BTreeMap<String, String> {
        &self.hashes
    }

    /// SPDX creator string: `Tool: name-version`.
    pub fn creator_string(&self) -> String {
        format!("Tool: {}-{}", self.name, self.version)
    }
}

/// Either schema's populated store, ready for serialization.
pub enum BomStore {
    CycloneDx(CycloneDxStore),
    Spdx(SpdxStore),
}

/// Converts a finished dependency graph into schema-conformant documents.
pub struct SbomGenerator {
    sbom: Sbom,
    schema: GeneratorSchema,
    tool: Tool,
}

impl SbomGenerator {
    pub const TOOL_VENDOR: &'static str = "srcbom";
    pub const TOOL_NAME: &'static str = "srcbom";
    pub const TOOL_LICENSE: &'static str = "MIT";
    pub const TOOL_LICENSE_URL: &'static str = "https://opensource.org/license/mit/";

    pub fn new(sbom: Sbom, schema: GeneratorSchema) -> Self {
        let mut generator = Self {
            sbom,
            schema,
            tool: Tool::new(
                Self::TOOL_VENDOR,
                Self::TOOL_NAME,
                env!("CARGO_PKG_VERSION"),
            ),
        };

        let license = License::new(Self::TOOL_LICENSE).with_url(Self::TOOL_LICENSE_URL);
        generator.tool.add_license(license);
        let hash = generator.state_hash();
        generator.tool.add_hash("SHA-256", &hash);
        generator
    }

    pub fn schema(&self) -> GeneratorSchema {
        self.schema
    }

    pub fn project_name(&self) -> &str {
        self.sbom.head().name()
    }

    /// SHA-256 over this generator's identifying state, hex-encoded.
    fn state_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.sbom.head().name().as_bytes());
        hasher.update(self.schema.to_string().as_bytes());
        hasher.update(self.schema.spec_version().as_bytes());
        hasher.update(self.sbom.component_count().to_le_bytes());
        hex::encode(hasher.finalize())
    }

    /// Serial number derived from the generator state: stable for the same
    /// graph and schema.
    fn serial_number(&self) -> String {
        let uuid = Uuid::new_v5(&Uuid::NAMESPACE_OID, self.state_hash().as_bytes());
        format!("urn:uuid:{}", uuid)
    }

    fn timestamp() -> String {
        Utc::now().to_rfc3339()
    }

    /// Builds the schema-specific store by walking the graph depth-first
    /// from the head. A child whose parent is missing from the store logs a
    /// warning and that edge is dropped; partial documents remain useful.
    pub fn build_store(&self) -> Result<BomStore> {
        match self.schema {
            GeneratorSchema::CycloneDx => Ok(BomStore::CycloneDx(self.build_cyclonedx())),
            GeneratorSchema::Spdx => Ok(BomStore::Spdx(self.build_spdx())),
        }
    }

    fn build_cyclonedx(&self) -> CycloneDxStore {
        let mut store = CycloneDxStore::new(
            self.serial_number(),
            1,
            self.sbom.head().clone(),
            Self::timestamp(),
        );
        store.add_tool(self.tool.clone());

        let head = self.sbom.head_id();
        for &child_id in self.sbom.children_of(head) {
            if let Some(component) = self.sbom.component(child_id) {
                store.add_component(component.clone());
                self.add_cyclonedx_children(&mut store, child_id);
            }
        }

        store
    }

    fn add_cyclonedx_children(&self, store: &mut CycloneDxStore, parent: crate::model::ComponentId) {
        for &child_id in self.sbom.children_of(parent) {
            let child = match self.sbom.component(child_id) {
                Some(child) => child.clone(),
                None => continue,
            };
            if let Err(e) = store.add_child(parent, child) {
                warn!(error = %e, "CycloneDX store: dropping edge");
                continue;
            }
            self.add_cyclonedx_children(store, child_id);
        }
    }

    fn build_spdx(&self) -> SpdxStore {
        let mut store = SpdxStore::new(
            self.serial_number(),
            1,
            self.sbom.head().clone(),
            Self::timestamp(),
        );
        store.add_tool(self.tool.clone());

        let head = self.sbom.head_id();
        for &child_id in self.sbom.children_of(head) {
            if let Some(component) = self.sbom.component(child_id) {
                store.add_component(component.clone());
                self.add_spdx_children(&mut store, child_id);
            }
        }

        store
    }

    fn add_spdx_children(&self, store: &mut SpdxStore, parent: crate::model::ComponentId) {
        for &child_id in self.sbom.children_of(parent) {
            let child = match self.sbom.component(child_id) {
                Some(child) => child.clone(),
                None => continue,
            };
            if let Err(e) = store.add_child(parent, child) {
                warn!(error = %e, "SPDX store: dropping edge");
                continue;
            }
            self.add_spdx_children(store, child_id);
        }
    }

    /// Resolves the output format, substituting the schema default with a
    /// warning when the requested pair is unsupported.
    fn effective_format(&self, format: GeneratorFormat) -> GeneratorFormat {
        if self.schema.supports_format(format) {
            return format;
        }
        let fallback = self.schema.default_format();
        warn!(
            "Format '{}' does not match schema '{}', '{}' will be used instead",
            format, self.schema, fallback
        );
        fallback
    }

    /// Serializes the graph to a document string, pretty-printed.
    pub fn write_string(&self, format: GeneratorFormat) -> Result<String> {
        let format = self.effective_format(format);
        let store = self.build_store()?;

        let rendered = match (&store, format) {
            (BomStore::CycloneDx(store), GeneratorFormat::Json) => store.to_json(),
            (BomStore::CycloneDx(store), GeneratorFormat::Xml) => store.to_xml(),
            (BomStore::Spdx(store), GeneratorFormat::Json) => store.to_json(),
            (BomStore::Spdx(store), GeneratorFormat::Yaml) => store.to_yaml(),
            (BomStore::Spdx(store), GeneratorFormat::TagValue) => Ok(store.to_tag_value()),
            _ => Err(anyhow::anyhow!("no serializer registered for this pair")),
        };

        rendered.map_err(|e| {
            SbomError::Generation {
                schema: self.schema.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Output file name: `<projectName>_<schema>.<ext>`.
    pub fn output_file_name(&self, format: GeneratorFormat) -> String {
        let format = self.effective_format(format);
        format!(
            "{}_{}.{}",
            self.project_name(),
            self.schema,
            format.extension()
        )
    }

    /// Writes the document to `<directory>/<projectName>_<schema>.<ext>`.
    pub fn write_file(&self, directory: &Path, format: GeneratorFormat) -> Result<PathBuf> {
        let contents = self.write_string(format)?;
        let path = directory.join(self.output_file_name(format));

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SbomError::FileWriteError {
                path: path.clone(),
                details: e.to_string(),
            })?;
        }

        std::fs::write(&path, contents).map_err(|e| SbomError::FileWriteError {
            path: path.clone(),
            details: e.to_string(),
        })?;

        Ok(path)
    }
}
