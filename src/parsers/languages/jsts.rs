//! JavaScript / TypeScript import grammar.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::model::{ComponentBuilder, ComponentType};

use super::stdlib::NODE_MODULES;

/// Matches ES `import ... from '...'`, bare `import '...'`, and CommonJS
/// `require('...')`. Runs on comment-stripped text.
pub(super) static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\bimport[ \t]+(?:\{[\s\S]*?\}[ \t]*from[ \t]*['"]([\w./@-]+)['"]|([\w*$]+)[ \t]+from[ \t]+['"]([\w./@-]+)['"]|['"]([\w./@-]+)['"])|\brequire[ \t]*\([ \t]*['"]([\w./@-]+)['"][ \t]*\)"#,
    )
    .expect("js/ts import regex must compile")
});

pub(super) fn parse_match(caps: &Captures, out: &mut Vec<ComponentBuilder>) {
    let (path, alias) = if let Some(p) = caps.get(1) {
        (p.as_str(), None)
    } else if let Some(p) = caps.get(3) {
        (p.as_str(), caps.get(2).map(|m| m.as_str()))
    } else if let Some(p) = caps.get(4).or_else(|| caps.get(5)) {
        (p.as_str(), None)
    } else {
        return;
    };

    // A leading-dot specifier is a project-relative module.
    let relative = path.starts_with('.');

    let mut segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect();
    let name = match segments.pop() {
        Some(name) => name,
        None => return,
    };
    // Module files may be referenced with their extension
    let name = name.strip_suffix(".js").unwrap_or(name);
    let name = name.strip_suffix(".ts").unwrap_or(name);

    let mut builder = ComponentBuilder::new(name);
    if !segments.is_empty() {
        builder.set_group(segments.join("/"));
    }
    if let Some(alias) = alias.filter(|a| *a != "*") {
        builder.set_alias(alias);
    }
    if relative {
        builder.set_type(ComponentType::Internal);
    }

    out.push(builder);
}

/// Node builtins, `node:`-prefixed or bare.
pub(super) fn is_stdlib(builder: &ComponentBuilder) -> bool {
    let name = builder.name();
    match builder.group() {
        Some("node") => NODE_MODULES.contains(name),
        Some(_) => false,
        None => {
            NODE_MODULES.contains(name) || name
                .strip_prefix("node:")
                .is_some_and(|n| NODE_MODULES.contains(n))
        }
    }
}
