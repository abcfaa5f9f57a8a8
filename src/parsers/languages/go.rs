//! Go import grammar.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::model::ComponentBuilder;
use crate::parsers::ParserContext;

use super::stdlib::GO_ROOTS;

/// Matches single-line imports with optional alias and parenthesized import
/// blocks. Runs on comment-stripped text.
pub(super) static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bimport[ \t]*(?:\(([\s\S]*?)\)|(?:(\w+|\.|_)[ \t]+)?"([^"\n]+)")"#)
        .expect("go import regex must compile")
});

static BLOCK_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:(\w+|\.|_)[ \t]+)?"([^"]+)"$"#).expect("go block line regex must compile")
});

fn handle_token(alias: Option<&str>, path: &str, out: &mut Vec<ComponentBuilder>) {
    // Blank-identifier imports are unused and never become components.
    if alias == Some("_") {
        return;
    }

    // A dot import pulls everything from the package into scope, which is
    // the wildcard form: the driver renames it to the last group segment.
    if alias == Some(".") {
        let mut builder = ComponentBuilder::new("*");
        builder.set_group(path);
        out.push(builder);
        return;
    }

    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let name = match segments.pop() {
        Some(name) => name,
        None => return,
    };

    let mut builder = ComponentBuilder::new(name);
    if !segments.is_empty() {
        builder.set_group(segments.join("/"));
    }
    if let Some(alias) = alias {
        builder.set_alias(alias);
    }
    out.push(builder);
}

pub(super) fn parse_match(caps: &Captures, out: &mut Vec<ComponentBuilder>) {
    if let Some(block) = caps.get(1) {
        for line in block.as_str().lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(line_caps) = BLOCK_LINE_RE.captures(line) {
                let alias = line_caps.get(1).map(|m| m.as_str());
                let path = line_caps.get(2).map(|m| m.as_str()).unwrap_or("");
                handle_token(alias, path, out);
            }
        }
    } else if let Some(path) = caps.get(3) {
        let alias = caps.get(2).map(|m| m.as_str());
        handle_token(alias, path.as_str(), out);
    }
}

/// Internal packages resolve to a `<name>.go` file somewhere in the project.
pub(super) fn is_internal(ctx: &ParserContext, builder: &ComponentBuilder) -> bool {
    let target = format!("{}.go", builder.name().to_lowercase());
    ctx.source_files.iter().any(|file| {
        file.rsplit('/')
            .next()
            .unwrap_or(file)
            .to_lowercase()
            == target
    })
}

pub(super) fn is_stdlib(builder: &ComponentBuilder) -> bool {
    match builder.group() {
        Some(group) => {
            let root = group.split('/').next().unwrap_or("");
            GO_ROOTS.contains(root)
        }
        None => GO_ROOTS.contains(builder.name()),
    }
}
