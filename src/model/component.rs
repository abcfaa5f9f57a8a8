use std::collections::BTreeMap;
use std::fmt;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use uuid::Uuid;

use super::license::License;

/// Stable unique identifier assigned to a component at build time.
///
/// Two components with identical name/version are distinct entities if
/// independently discovered; graph identity is this id, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(Uuid);

impl ComponentId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Provenance classification of a component.
///
/// - `Internal`: a file inside the analyzed project
/// - `Language`: shipped by the language maintainers (e.g. java.util)
/// - `External`: a traditional third-party package
/// - `Application`: the project itself (head component only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Internal,
    External,
    Language,
    Application,
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentType::Internal => write!(f, "INTERNAL"),
            ComponentType::External => write!(f, "EXTERNAL"),
            ComponentType::Language => write!(f, "LANGUAGE"),
            ComponentType::Application => write!(f, "APPLICATION"),
        }
    }
}

/// The mutable staging form of a component.
///
/// Parsers populate a builder, the classification step runs at most once,
/// and `build()` freezes the result into an immutable [`Component`]. After
/// that, only license resolution may touch the component.
#[derive(Debug, Clone)]
pub struct ComponentBuilder {
    name: String,
    group: Option<String>,
    version: Option<String>,
    alias: Option<String>,
    component_type: ComponentType,
    packaged: bool,
    files: Vec<String>,
    license_names: Vec<String>,
    purls: Vec<String>,
    cpes: Vec<String>,
    classified: bool,
}

impl ComponentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: None,
            version: None,
            alias: None,
            component_type: ComponentType::External,
            packaged: false,
            files: Vec::new(),
            license_names: Vec::new(),
            purls: Vec::new(),
            cpes: Vec::new(),
            classified: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_group(&mut self, group: impl Into<String>) {
        let group = group.into();
        if !group.is_empty() {
            self.group = Some(group);
        }
    }

    pub fn clear_group(&mut self) {
        self.group = None;
    }

    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = Some(version.into());
    }

    pub fn set_alias(&mut self, alias: impl Into<String>) {
        self.alias = Some(alias.into());
    }

    /// Sets the initial type guess. Only valid before classification.
    pub fn set_type(&mut self, component_type: ComponentType) {
        debug_assert!(!self.classified, "type guess after classification");
        self.component_type = component_type;
    }

    /// Marks this component as declared by a package manager manifest.
    /// Packaged components are always external dependencies.
    pub fn set_packaged(&mut self) {
        self.packaged = true;
        self.component_type = ComponentType::External;
    }

    pub fn add_file(&mut self, file: impl Into<String>) {
        let file = file.into();
        if !self.files.contains(&file) {
            self.files.push(file);
        }
    }

    pub fn add_license(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !name.trim().is_empty() && !self.license_names.contains(&name) {
            self.license_names.push(name);
        }
    }

    pub fn add_purl(&mut self, purl: impl Into<String>) {
        self.purls.push(purl.into());
    }

    pub fn add_cpe(&mut self, cpe: impl Into<String>) {
        self.cpes.push(cpe.into());
    }

    /// Applies the single permitted type revision based on the two lookups.
    ///
    /// The final type is Internal on an internal-file hit, Language on a
    /// standard-library hit, otherwise External. A component speculatively
    /// tagged Internal by regex shape (e.g. a quoted C include) that fails
    /// the internal lookup is retagged here. Subsequent calls are no-ops so
    /// the revision happens exactly once.
    pub fn classify(&mut self, internal_hit: bool, stdlib_hit: bool) {
        if self.classified {
            debug!(name = %self.name, "classify called twice, keeping existing type");
            return;
        }
        self.classified = true;

        if internal_hit {
            self.component_type = ComponentType::Internal;
            return;
        }

        if self.component_type == ComponentType::Internal {
            warn!(
                name = %self.name,
                "component was marked as INTERNAL but not found, changing to EXTERNAL"
            );
            self.component_type = ComponentType::External;
        }

        if stdlib_hit && self.component_type == ComponentType::External {
            self.component_type = ComponentType::Language;
        }
    }

    /// Freezes the builder into an immutable component with a fresh id and
    /// a SHA-256 content hash over its identifying fields.
    pub fn build(self) -> Component {
        let mut component = Component {
            id: ComponentId::generate(),
            name: self.name,
            group: self.group,
            version: self.version,
            alias: self.alias,
            component_type: self.component_type,
            packaged: self.packaged,
            files: self.files,
            hashes: BTreeMap::new(),
            license_names: self.license_names,
            resolved_licenses: Vec::new(),
            purls: self.purls,
            cpes: self.cpes,
        };
        let digest = component.content_hash();
        component.hashes.insert("SHA-256".to_string(), digest);
        component
    }
}

/// One inventoried unit: an internal file, external library, language-runtime
/// module, or the project itself.
#[derive(Debug, Clone)]
pub struct Component {
    id: ComponentId,
    name: String,
    group: Option<String>,
    version: Option<String>,
    alias: Option<String>,
    component_type: ComponentType,
    packaged: bool,
    files: Vec<String>,
    hashes: BTreeMap<String, String>,
    license_names: Vec<String>,
    resolved_licenses: Vec<License>,
    purls: Vec<String>,
    cpes: Vec<String>,
}

impl Component {
    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    pub fn is_packaged(&self) -> bool {
        self.packaged
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn hashes(&self) -> &BTreeMap<String, String> {
        &self.hashes
    }

    pub fn purls(&self) -> &[String] {
        &self.purls
    }

    pub fn cpes(&self) -> &[String] {
        &self.cpes
    }

    /// Raw license strings collected during parsing/enrichment.
    pub fn license_names(&self) -> &[String] {
        &self.license_names
    }

    /// Resolves collected license strings into [`License`] values.
    ///
    /// A comma-separated string becomes multiple licenses: the first part is
    /// always kept, later parts only when they resolve to an SPDX id.
    /// Idempotent; this is the only mutation allowed after build.
    pub fn resolve_licenses(&mut self) {
        if !self.resolved_licenses.is_empty() || self.license_names.is_empty() {
            return;
        }
        for raw in &self.license_names {
            debug!(license = %raw, "attempting to resolve license");
            let mut first = true;
            for part in raw.split(',') {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }
                let license = License::new(part);
                if first || license.is_resolved() {
                    if !self.resolved_licenses.contains(&license) {
                        self.resolved_licenses.push(license);
                    }
                    first = false;
                }
            }
        }
    }

    /// All licenses after resolution, resolved or not.
    pub fn licenses(&self) -> &[License] {
        &self.resolved_licenses
    }

    /// Licenses that could not be mapped to an SPDX identifier.
    pub fn unresolved_licenses(&self) -> Vec<&License> {
        self.resolved_licenses
            .iter()
            .filter(|l| !l.is_resolved())
            .collect()
    }

    /// SHA-256 over the identifying fields, hex-encoded.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.name.as_bytes());
        hasher.update(self.group.as_deref().unwrap_or("").as_bytes());
        hasher.update(self.version.as_deref().unwrap_or("").as_bytes());
        hasher.update(self.component_type.to_string().as_bytes());
        for file in &self.files {
            hasher.update(file.as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    /// Console-friendly one-line representation, used in debug logging.
    pub fn to_readable_string(&self) -> String {
        let mut out = String::new();
        if let Some(group) = &self.group {
            out.push_str(&format!("FROM {} ", group));
        }
        out.push_str(&format!("IMPORT {} ", self.name));
        if let Some(alias) = &self.alias {
            out.push_str(&format!("AS {} ", alias));
        }
        out.push_str(&format!("; [ {} ]", self.component_type));
        out
    }
}
