//! Python import grammar.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::model::{ComponentBuilder, ComponentType};
use crate::parsers::ParserContext;

use super::stdlib::PYTHON_MODULES;

/// Matches `import a, b`, `import a.b as c`, `from x import y` and the
/// parenthesized multi-line form. Runs on comment-stripped text.
pub(super) static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:from[ \t]+([\w.]+)[ \t]+)?import[ \t]+(?:\(([\s\S]*?)\)|([\w. ,*]+))")
        .expect("python import regex must compile")
});

static ALIAS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([\w*/.]*)(?:[ \t]+as[ \t]+(\w+))?").expect("python alias regex must compile")
});

/// Rewrites a leading `.`/`..` to the directory it refers to, so relative
/// imports resolve against real path segments.
fn format_path(ctx: &ParserContext, raw: &str) -> String {
    let (dir, skip) = if let Some(rest) = raw.strip_prefix("..") {
        let parent = ctx.pwd.parent().unwrap_or(&ctx.pwd);
        (
            parent
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            rest,
        )
    } else if let Some(rest) = raw.strip_prefix('.') {
        (
            ctx.pwd
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            rest,
        )
    } else {
        return raw.to_string();
    };

    if skip.is_empty() {
        dir
    } else {
        format!("{}.{}", dir, skip.trim_start_matches('.'))
    }
}

pub(super) fn parse_match(ctx: &ParserContext, caps: &Captures, out: &mut Vec<ComponentBuilder>) {
    let matched = match caps.get(2).or_else(|| caps.get(3)) {
        Some(m) => m.as_str(),
        None => return,
    };

    let cleaned = matched
        .replace(['\r', '\n', '\t'], "")
        .trim()
        .to_string();

    let from_clause = caps.get(1).map(|m| m.as_str());
    // A leading-dot module is a filesystem-relative reference, so the
    // component starts out as a speculative Internal guess.
    let relative = from_clause.is_some_and(|f| f.starts_with('.'));

    for token in cleaned.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        let alias_caps = match ALIAS_RE.captures(token) {
            Some(c) => c,
            None => continue,
        };
        let mut name = alias_caps
            .get(1)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let alias = alias_caps.get(2).map(|m| m.as_str().to_string());

        let group = match from_clause {
            // from foo.fee import bar -> name bar, group foo/fee
            Some(from) => Some(format_path(ctx, from).replace('.', "/")),
            // import foo.bar.baz -> name baz, group foo/bar
            None => {
                let relative_name = name.contains('.');
                let formatted = if relative_name || name.starts_with('.') {
                    format_path(ctx, &name)
                } else {
                    name.clone()
                };
                let mut parts: Vec<&str> = formatted.split('.').filter(|p| !p.is_empty()).collect();
                match parts.len() {
                    0 => continue,
                    1 => {
                        name = parts[0].to_string();
                        None
                    }
                    _ => {
                        name = parts.pop().unwrap_or_default().to_string();
                        Some(parts.join("/"))
                    }
                }
            }
        };

        if name.is_empty() {
            continue;
        }

        let mut builder = ComponentBuilder::new(name);
        if let Some(group) = group.filter(|g| !g.is_empty() && g != "/") {
            builder.set_group(group);
        }
        if let Some(alias) = alias {
            builder.set_alias(alias);
        }
        if relative {
            builder.set_type(ComponentType::Internal);
        }

        out.push(builder);
    }
}

pub(super) fn is_stdlib(builder: &ComponentBuilder) -> bool {
    let root = builder
        .group()
        .unwrap_or(builder.name())
        .split('/')
        .next()
        .unwrap_or("");
    PYTHON_MODULES.contains(root)
}
