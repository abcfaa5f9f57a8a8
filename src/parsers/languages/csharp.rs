//! C# using-directive grammar.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::model::ComponentBuilder;

use super::stdlib::CSHARP_ROOTS;

/// Matches `using`, `global using`, `using static`, and alias directives.
/// Runs on comment-stripped text.
pub(super) static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:global[ \t]+)?using(?:[ \t]+static)?[ \t]+(?:([\w.]+)[ \t]*=[ \t]*)?([\w.]+)[ \t]*;")
        .expect("c# using regex must compile")
});

pub(super) fn parse_match(caps: &Captures, out: &mut Vec<ComponentBuilder>) {
    let target = match caps.get(2) {
        Some(m) => m.as_str(),
        None => return,
    };

    let mut parts: Vec<&str> = target.split('.').filter(|p| !p.is_empty()).collect();
    let name = match parts.pop() {
        Some(name) => name,
        None => return,
    };

    let mut builder = ComponentBuilder::new(name);
    if !parts.is_empty() {
        builder.set_group(parts.join("/"));
    }
    if let Some(alias) = caps.get(1) {
        builder.set_alias(alias.as_str());
    }

    out.push(builder);
}

pub(super) fn is_stdlib(builder: &ComponentBuilder) -> bool {
    let root = builder
        .group()
        .unwrap_or(builder.name())
        .split('/')
        .next()
        .unwrap_or("");
    CSHARP_ROOTS.contains(root)
}
