//! Language file parsers.
//!
//! A closed set of language families, each contributing an import regex, a
//! match handler, a standard-library test, and an internal-path rule. The
//! shared driver in this module owns everything else: comment stripping,
//! wildcard rewriting, alias capture conventions, and the classification
//! ordering (internal first, then standard library, else external).

mod ccpp;
mod csharp;
mod go;
mod java;
mod jsts;
mod python;
mod ruby;
mod scala;
pub mod stdlib;

use async_trait::async_trait;
use regex::{Captures, Regex};
use tracing::debug;

use crate::model::ComponentBuilder;

use super::{Parser, ParserContext};

/// Comment markers for a language family.
#[derive(Debug, Clone, Copy)]
pub struct CommentStyle {
    pub line: &'static str,
    pub block: Option<(&'static str, &'static str)>,
}

const C_STYLE: CommentStyle = CommentStyle {
    line: "//",
    block: Some(("/*", "*/")),
};

const HASH_STYLE: CommentStyle = CommentStyle {
    line: "#",
    block: None,
};

const RUBY_STYLE: CommentStyle = CommentStyle {
    line: "#",
    block: Some(("=begin", "=end")),
};

/// Supported language families.
///
/// Per-language specialization is limited to the regex pattern, the
/// standard-library lookup, and the internal-path matching rule; everything
/// else is shared driver behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Java,
    Python,
    CCpp,
    CSharp,
    JsTs,
    Go,
    Ruby,
    Scala,
}

impl Language {
    fn comment_style(self) -> CommentStyle {
        match self {
            Language::Python => HASH_STYLE,
            Language::Ruby => RUBY_STYLE,
            _ => C_STYLE,
        }
    }

    fn regex(self) -> &'static Regex {
        match self {
            Language::Java => &java::IMPORT_RE,
            Language::Python => &python::IMPORT_RE,
            Language::CCpp => &ccpp::IMPORT_RE,
            Language::CSharp => &csharp::IMPORT_RE,
            Language::JsTs => &jsts::IMPORT_RE,
            Language::Go => &go::IMPORT_RE,
            Language::Ruby => &ruby::IMPORT_RE,
            Language::Scala => &scala::IMPORT_RE,
        }
    }

    fn parse_match(self, ctx: &ParserContext, caps: &Captures, out: &mut Vec<ComponentBuilder>) {
        match self {
            Language::Java => java::parse_match(caps, out),
            Language::Python => python::parse_match(ctx, caps, out),
            Language::CCpp => ccpp::parse_match(caps, out),
            Language::CSharp => csharp::parse_match(caps, out),
            Language::JsTs => jsts::parse_match(caps, out),
            Language::Go => go::parse_match(caps, out),
            Language::Ruby => ruby::parse_match(caps, out),
            Language::Scala => scala::parse_match(caps, out),
        }
    }

    fn is_stdlib(self, builder: &ComponentBuilder) -> bool {
        match self {
            Language::Java => java::is_stdlib(builder),
            Language::Python => python::is_stdlib(builder),
            Language::CCpp => ccpp::is_stdlib(builder),
            Language::CSharp => csharp::is_stdlib(builder),
            Language::JsTs => jsts::is_stdlib(builder),
            Language::Go => go::is_stdlib(builder),
            Language::Ruby => ruby::is_stdlib(builder),
            Language::Scala => scala::is_stdlib(builder),
        }
    }

    fn is_internal(self, ctx: &ParserContext, builder: &ComponentBuilder) -> bool {
        match self {
            // Header lookup is by bare file name: build systems control the
            // include path, so string prefixes mean nothing here.
            Language::CCpp => ccpp::is_internal(ctx, builder),
            Language::Go => go::is_internal(ctx, builder),
            _ => default_is_internal(ctx, builder),
        }
    }
}

/// Driver that applies one language family's grammar to a file.
pub struct LanguageParser {
    language: Language,
}

impl LanguageParser {
    pub fn new(language: Language) -> Self {
        Self { language }
    }
}

#[async_trait]
impl Parser for LanguageParser {
    async fn parse(
        &self,
        ctx: &ParserContext,
        components: &mut Vec<ComponentBuilder>,
        contents: &str,
    ) {
        let stripped = strip_comments(contents, self.language.comment_style());

        for caps in self.language.regex().captures_iter(&stripped) {
            debug!(
                matched = caps.get(0).map(|m| m.as_str()).unwrap_or(""),
                file = %ctx.pwd.display(),
                "import match"
            );

            let mut found = Vec::new();
            self.language.parse_match(ctx, &caps, &mut found);

            for mut builder in found {
                if builder.name() == "*" || builder.name() == "_" {
                    // Import of everything from a group: the last group
                    // segment becomes the component name. Without a group
                    // the match is unresolvable and dropped.
                    match builder.group().map(str::to_string) {
                        Some(group) => {
                            let mut parts: Vec<&str> = group.split('/').collect();
                            let name = parts.pop().unwrap_or_default().to_string();
                            builder.set_name(name);
                            if parts.is_empty() {
                                builder.clear_group();
                            } else {
                                builder.set_group(parts.join("/"));
                            }
                        }
                        None => {
                            debug!("wildcard import without group, dropping match");
                            continue;
                        }
                    }
                }

                if builder.name().is_empty() {
                    continue;
                }

                let internal = self.language.is_internal(ctx, &builder);
                let stdlib = if internal {
                    false
                } else {
                    self.language.is_stdlib(&builder)
                };
                builder.classify(internal, stdlib);
                components.push(builder);
            }
        }
    }
}

/// Blanks out line and block comments while preserving line structure, so
/// the multiline import regexes never see commented-out code.
///
/// Tracks an inside-a-block flag across lines and handles open+close on the
/// same line.
pub fn strip_comments(contents: &str, style: CommentStyle) -> String {
    let mut out = String::with_capacity(contents.len());
    let mut in_block = false;

    for line in contents.split_inclusive('\n') {
        let (body, newline) = match line.strip_suffix('\n') {
            Some(body) => (body, "\n"),
            None => (line, ""),
        };

        let mut rest = body;
        loop {
            if in_block {
                match style.block.and_then(|(_, close)| rest.find(close)) {
                    Some(idx) => {
                        let close_len = style.block.map(|(_, c)| c.len()).unwrap_or(0);
                        rest = &rest[idx + close_len..];
                        in_block = false;
                    }
                    None => {
                        rest = "";
                        break;
                    }
                }
            } else {
                let line_idx = rest.find(style.line);
                let block_idx = style.block.and_then(|(open, _)| rest.find(open));

                match (line_idx, block_idx) {
                    (Some(l), Some(b)) if l <= b => {
                        out.push_str(&rest[..l]);
                        rest = "";
                        break;
                    }
                    (Some(l), None) => {
                        out.push_str(&rest[..l]);
                        rest = "";
                        break;
                    }
                    (_, Some(b)) => {
                        out.push_str(&rest[..b]);
                        let open_len = style.block.map(|(o, _)| o.len()).unwrap_or(0);
                        rest = &rest[b + open_len..];
                        in_block = true;
                    }
                    (None, None) => {
                        out.push_str(rest);
                        rest = "";
                        break;
                    }
                }
            }
            if rest.is_empty() {
                break;
            }
        }

        out.push_str(newline);
    }

    out
}

/// Segment-wise suffix match: does `path` end with the segments of `suffix`?
pub fn path_ends_with(path: &str, suffix: &str) -> bool {
    let p: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let s: Vec<&str> = suffix.split('/').filter(|s| !s.is_empty()).collect();
    if s.is_empty() || s.len() > p.len() {
        return false;
    }
    p[p.len() - s.len()..] == s[..]
}

/// Removes the extension from the last path segment, if any.
fn strip_extension(path: &str) -> String {
    match path.rsplit_once('/') {
        Some((dir, file)) => match file.rsplit_once('.') {
            Some((stem, _)) => format!("{}/{}", dir, stem),
            None => path.to_string(),
        },
        None => match path.rsplit_once('.') {
            Some((stem, _)) => stem.to_string(),
            None => path.to_string(),
        },
    }
}

fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Generic internal-component test: suffix match of `group/name` against the
/// project's relative file paths, tolerating extensions, also accepting a
/// match against the containing directory (package imports).
pub fn default_is_internal(ctx: &ParserContext, builder: &ComponentBuilder) -> bool {
    let target = match builder.group() {
        Some(group) => format!("{}/{}", group, builder.name()),
        None => builder.name().to_string(),
    };

    for file in &ctx.source_files {
        let no_ext = strip_extension(file);
        if path_ends_with(file, &target) || path_ends_with(&no_ext, &target) {
            return true;
        }

        let parent = parent_of(file);
        if path_ends_with(parent, &target) {
            return true;
        }

        if let Some(group) = builder.group() {
            if path_ends_with(&no_ext, group) {
                return true;
            }
        }
    }

    false
}
