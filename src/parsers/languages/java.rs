//! Java import grammar.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::model::ComponentBuilder;

use super::stdlib::JAVA_ROOTS;

/// Captures the dotted prefix and the final identifier of an import
/// statement, `import static` included. Runs on comment-stripped text.
pub(super) static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*import(?:\s+static)?\s+([\w.]*?)([\w*]+)\s*;")
        .expect("java import regex must compile")
});

pub(super) fn parse_match(caps: &Captures, out: &mut Vec<ComponentBuilder>) {
    let prefix = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
    let last = match caps.get(2) {
        Some(m) => m.as_str(),
        None => return,
    };

    // The final identifier is the component, the dotted prefix its group:
    // import foo.bar; -> name "bar", group "foo".
    let mut builder = ComponentBuilder::new(last);
    if !prefix.is_empty() {
        builder.set_group(prefix.trim_end_matches('.').replace('.', "/"));
    }

    out.push(builder);
}

/// A component is language-provided when its package root is a JDK root
/// (java, javax, ...).
pub(super) fn is_stdlib(builder: &ComponentBuilder) -> bool {
    let root = builder
        .group()
        .unwrap_or(builder.name())
        .split('/')
        .next()
        .unwrap_or("");
    JAVA_ROOTS.contains(root)
}
