//! Package-manager manifest parsers.
//!
//! Each concrete parser owns its extraction grammar but normalizes to a
//! common dependency record before building components. License enrichment
//! is batched per manifest: every lookup is spawned, all are awaited
//! together, and a failed lookup leaves the license unset - it never fails
//! the parse.

mod cargo;
mod conan;
mod csproj;
mod gradle;
mod maven;
mod requirements;

pub use cargo::CargoParser;
pub use conan::ConanParser;
pub use csproj::CsProjParser;
pub use gradle::GradleParser;
pub use maven::MavenParser;
pub use requirements::RequirementsParser;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::LazyLock;

use futures::stream::{self, StreamExt};
use regex::Regex;
use tracing::debug;

use crate::model::ComponentBuilder;
use crate::registry::RegistryQuery;

/// Maximum concurrent license lookups within one manifest.
const MAX_CONCURRENT_LOOKUPS: usize = 10;

/// Normalized dependency entry shared by all manifest grammars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRecord {
    pub artifact_id: String,
    pub group_id: Option<String>,
    pub version: Option<String>,
}

impl DependencyRecord {
    pub fn new(artifact_id: impl Into<String>) -> Self {
        Self {
            artifact_id: artifact_id.into(),
            group_id: None,
            version: None,
        }
    }

    /// Builds a component from this record; the version and group come from
    /// manifest fields, never from regex guessing.
    pub fn into_builder(self, purl_type: &str) -> ComponentBuilder {
        let purl = build_purl(
            purl_type,
            self.group_id.as_deref(),
            &self.artifact_id,
            self.version.as_deref(),
        );

        let mut builder = ComponentBuilder::new(self.artifact_id);
        if let Some(group) = self.group_id {
            builder.set_group(group);
        }
        if let Some(version) = self.version {
            builder.set_version(version);
        }
        builder.add_purl(purl);
        builder
    }
}

/// Builds a package URL from its parts: `pkg:type/namespace/name@version`.
pub fn build_purl(
    purl_type: &str,
    namespace: Option<&str>,
    name: &str,
    version: Option<&str>,
) -> String {
    let mut purl = format!("pkg:{}", purl_type);
    if let Some(namespace) = namespace {
        purl.push('/');
        purl.push_str(namespace);
    }
    purl.push('/');
    purl.push_str(name);
    if let Some(version) = version {
        purl.push('@');
        purl.push_str(version);
    }
    purl
}

/// `${key}` or `$key` references inside manifest values.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([\w.-]+)\}|\$([\w.-]+)").expect("property token regex must compile")
});

/// Substitutes property references in a value. A reference with no
/// definition is left literal.
pub fn substitute(value: &str, props: &HashMap<String, String>) -> String {
    TOKEN_RE
        .replace_all(value, |caps: &regex::Captures| {
            let key = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or("");
            match props.get(key) {
                Some(replacement) => replacement.clone(),
                None => caps.get(0).map(|m| m.as_str()).unwrap_or("").to_string(),
            }
        })
        .into_owned()
}

/// Pre-resolves property definitions that reference other properties, so
/// dependency entries only need a single substitution pass. Resolution
/// depth is bounded to tolerate definition cycles.
pub fn resolve_properties(props: &HashMap<String, String>) -> HashMap<String, String> {
    let mut resolved = props.clone();
    for _ in 0..5 {
        let mut changed = false;
        let snapshot = resolved.clone();
        for value in resolved.values_mut() {
            let substituted = substitute(value, &snapshot);
            if *value != substituted {
                *value = substituted;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    resolved
}

/// One pending license lookup: the target builder index, the registry URL,
/// and a body -> license strings extractor.
pub(crate) struct LicenseLookup {
    pub index: usize,
    pub url: String,
    pub extract: fn(&str) -> Vec<String>,
}

/// Fires all lookups of one manifest concurrently and joins them before
/// returning. Failures (error, non-2xx, nothing extracted) are logged at
/// debug level and leave the component without a license.
pub(crate) async fn run_license_lookups(
    registry: &Arc<dyn RegistryQuery>,
    lookups: Vec<LicenseLookup>,
    builders: &mut [ComponentBuilder],
) {
    if lookups.is_empty() {
        return;
    }

    let count = lookups.len();
    let results: Vec<(usize, Vec<String>)> = stream::iter(lookups)
        .map(|lookup| {
            let registry = Arc::clone(registry);
            async move {
                match registry.get(&lookup.url).await {
                    Ok(response) if response.is_success() => {
                        (lookup.index, (lookup.extract)(&response.body))
                    }
                    Ok(response) => {
                        debug!(url = %lookup.url, status = response.status, "license lookup failed");
                        (lookup.index, Vec::new())
                    }
                    Err(e) => {
                        debug!(url = %lookup.url, error = %e, "license lookup failed");
                        (lookup.index, Vec::new())
                    }
                }
            }
        })
        .buffer_unordered(MAX_CONCURRENT_LOOKUPS)
        .collect()
        .await;

    for (index, licenses) in results {
        if let Some(builder) = builders.get_mut(index) {
            for license in licenses {
                builder.add_license(license);
            }
        }
    }

    debug!(count, "license lookups done");
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_purl_full() {
        assert_eq!(
            build_purl("maven", Some("org.apache"), "commons-lang3", Some("3.12.0")),
            "pkg:maven/org.apache/commons-lang3@3.12.0"
        );
    }

    #[test]
    fn test_build_purl_minimal() {
        assert_eq!(build_purl("pypi", None, "requests", None), "pkg:pypi/requests");
    }

    #[test]
    fn test_substitute_defined_reference() {
        let props = HashMap::from([("version".to_string(), "2.0".to_string())]);
        assert_eq!(substitute("$version", &props), "2.0");
        assert_eq!(substitute("${version}", &props), "2.0");
    }

    #[test]
    fn test_substitute_undefined_reference_left_literal() {
        let props = HashMap::new();
        assert_eq!(substitute("$version", &props), "$version");
        assert_eq!(substitute("${missing}", &props), "${missing}");
    }

    #[test]
    fn test_substitute_embedded_reference() {
        let props = HashMap::from([("major".to_string(), "3".to_string())]);
        assert_eq!(substitute("${major}.1.4", &props), "3.1.4");
    }

    #[test]
    fn test_resolve_properties_nested() {
        let props = HashMap::from([
            ("java.version".to_string(), "17".to_string()),
            ("compiler.target".to_string(), "${java.version}".to_string()),
        ]);
        let resolved = resolve_properties(&props);
        assert_eq!(resolved["compiler.target"], "17");
    }

    #[test]
    fn test_resolve_properties_cycle_terminates() {
        let props = HashMap::from([
            ("a".to_string(), "${b}".to_string()),
            ("b".to_string(), "${a}".to_string()),
        ]);
        // Must terminate; values stay reference-shaped
        let resolved = resolve_properties(&props);
        assert!(resolved["a"].starts_with("${"));
    }

    #[test]
    fn test_record_into_builder() {
        let mut record = DependencyRecord::new("boost");
        record.version = Some("1.70.0#revision2".to_string());
        let builder = record.into_builder("conan");

        assert_eq!(builder.name(), "boost");
        assert_eq!(builder.version(), Some("1.70.0#revision2"));
    }
}
