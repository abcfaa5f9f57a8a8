use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

/// A single license attached to a component.
///
/// `spdx_id` is only set once the free-text name has been resolved against
/// the SPDX license table; an unresolved license is still emitted by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct License {
    name: String,
    spdx_id: Option<String>,
    url: Option<String>,
}

impl License {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let spdx_id = resolve_spdx_id(&name);
        Self {
            name,
            spdx_id,
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spdx_id(&self) -> Option<&str> {
        self.spdx_id.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn is_resolved(&self) -> bool {
        self.spdx_id.is_some()
    }
}

/// Long license name -> SPDX short identifier.
///
/// Compiled-in subset of the SPDX license list covering the identifiers that
/// package registries commonly report.
static SPDX_LICENSES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("MIT License", "MIT"),
        ("MIT No Attribution", "MIT-0"),
        ("Apache License 1.1", "Apache-1.1"),
        ("Apache License 2.0", "Apache-2.0"),
        ("Apache Software License", "Apache-2.0"),
        ("BSD Zero Clause License", "0BSD"),
        ("BSD 2-Clause \"Simplified\" License", "BSD-2-Clause"),
        ("BSD 3-Clause \"New\" or \"Revised\" License", "BSD-3-Clause"),
        ("BSD License", "BSD-3-Clause"),
        ("GNU General Public License v2.0 only", "GPL-2.0-only"),
        ("GNU General Public License v2.0 or later", "GPL-2.0-or-later"),
        ("GNU General Public License v3.0 only", "GPL-3.0-only"),
        ("GNU General Public License v3.0 or later", "GPL-3.0-or-later"),
        ("GNU Lesser General Public License v2.1 only", "LGPL-2.1-only"),
        ("GNU Lesser General Public License v2.1 or later", "LGPL-2.1-or-later"),
        ("GNU Lesser General Public License v3.0 only", "LGPL-3.0-only"),
        ("GNU Lesser General Public License v3.0 or later", "LGPL-3.0-or-later"),
        ("GNU Affero General Public License v3.0", "AGPL-3.0-only"),
        ("Mozilla Public License 1.1", "MPL-1.1"),
        ("Mozilla Public License 2.0", "MPL-2.0"),
        ("Eclipse Public License 1.0", "EPL-1.0"),
        ("Eclipse Public License 2.0", "EPL-2.0"),
        ("Common Development and Distribution License 1.0", "CDDL-1.0"),
        ("ISC License", "ISC"),
        ("The Unlicense", "Unlicense"),
        ("zlib License", "Zlib"),
        ("Boost Software License 1.0", "BSL-1.0"),
        ("Creative Commons Zero v1.0 Universal", "CC0-1.0"),
        ("Creative Commons Attribution 4.0 International", "CC-BY-4.0"),
        ("Artistic License 2.0", "Artistic-2.0"),
        ("Python Software Foundation License 2.0", "PSF-2.0"),
        ("Python License 2.0", "Python-2.0"),
        ("Ruby License", "Ruby"),
        ("PostgreSQL License", "PostgreSQL"),
        ("OpenSSL License", "OpenSSL"),
        ("PHP License v3.01", "PHP-3.01"),
        ("Do What The F*ck You Want To Public License", "WTFPL"),
        ("Academic Free License v3.0", "AFL-3.0"),
        ("European Union Public License 1.2", "EUPL-1.2"),
        ("Microsoft Public License", "MS-PL"),
        ("Universal Permissive License v1.0", "UPL-1.0"),
        ("Vim License", "Vim"),
    ])
});

static LICENSE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d\.\d+)").expect("version regex must compile"));

/// Checks whether a string is a known SPDX short identifier.
pub fn is_valid_spdx_id(short_id: &str) -> bool {
    SPDX_LICENSES
        .values()
        .any(|id| id.eq_ignore_ascii_case(short_id))
}

/// Best-effort mapping of a free-text license string to an SPDX identifier.
///
/// Tries, in order: the string already being a short identifier, an exact
/// long-name match, and a tokenized fuzzy match filtered by license version.
/// Returns None when nothing matches; the caller keeps the free text.
pub fn resolve_spdx_id(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(id) = SPDX_LICENSES
        .values()
        .find(|id| id.eq_ignore_ascii_case(trimmed))
    {
        return Some((*id).to_string());
    }

    if let Some((_, id)) = SPDX_LICENSES
        .iter()
        .find(|(long, _)| long.eq_ignore_ascii_case(trimmed))
    {
        debug!(license = trimmed, spdx = *id, "resolved license by name");
        return Some((*id).to_string());
    }

    fuzzy_match(trimmed)
}

/// Tokenized match against the license table, used when a registry reports a
/// paraphrased name such as "Apache 2.0" or "The MIT license".
fn fuzzy_match(text: &str) -> Option<String> {
    let mut tokens = tokenize(text);
    let version = LICENSE_VERSION
        .captures(text)
        .map(|c| c[1].to_string());

    let mut candidates: Vec<(&&str, &&str)> = SPDX_LICENSES.iter().collect();
    // Stable order so ties resolve the same way every run
    candidates.sort_by_key(|(long, _)| **long);
    if let Some(v) = &version {
        candidates.retain(|(long, id)| long.contains(v.as_str()) || id.contains(v.as_str()));
        tokens.retain(|t| t != v && t != &format!("v{}", v));
    }

    for (long, id) in candidates {
        let candidate_tokens = tokenize(long);
        if tokens.iter().any(|t| candidate_tokens.contains(t)) {
            warn!(
                license = text,
                assumed = *long,
                "license assumed from partial match"
            );
            return Some((*id).to_string());
        }
    }

    warn!(license = text, "no SPDX identifier found for license");
    None
}

/// Splits a license string into lowercase tokens, dropping filler words that
/// appear in nearly every license name.
fn tokenize(text: &str) -> Vec<String> {
    const FILLER: [&str; 9] = [
        "the", "open", "free", "documentation", "software", "version", "license", "or", "only",
    ];

    text.to_lowercase()
        .split(|c: char| c.is_whitespace() || c == ',' || c == ':' || c == '"')
        .filter(|t| !t.is_empty() && !FILLER.contains(t))
        .map(str::to_string)
        .collect()
}
