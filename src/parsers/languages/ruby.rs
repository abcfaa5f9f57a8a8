//! Ruby require grammar.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::model::{ComponentBuilder, ComponentType};

use super::stdlib::RUBY_MODULES;

/// Matches `require`, `require_relative`, and `load` statements. Runs on
/// comment-stripped text.
pub(super) static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(require_relative|require|load)[ \t(]+['"]([\w./-]+)['"]"#)
        .expect("ruby require regex must compile")
});

pub(super) fn parse_match(caps: &Captures, out: &mut Vec<ComponentBuilder>) {
    let keyword = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    let path = match caps.get(2) {
        Some(m) => m.as_str(),
        None => return,
    };

    let mut segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect();
    let name = match segments.pop() {
        Some(name) => name,
        None => return,
    };
    let name = name.strip_suffix(".rb").unwrap_or(name);

    let mut builder = ComponentBuilder::new(name);
    if !segments.is_empty() {
        builder.set_group(segments.join("/"));
    }
    // require_relative always names a project file
    if keyword == "require_relative" {
        builder.set_type(ComponentType::Internal);
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
    RUBY_MODULES.contains(root)
}

#[cfg(test)]
mod tests {
    use super::super::{Language, LanguageParser};
    use super::*;
    use crate::parsers::{Parser, ParserContext};

    async fn parse(source: &str) -> Vec<ComponentBuilder> {
        parse_with_files(source, &[]).await
    }

    async fn parse_with_files(source: &str, files: &[&str]) -> Vec<ComponentBuilder> {
        let mut ctx = ParserContext::new("proj");
        ctx.source_files = files.iter().map(|f| f.to_string()).collect();
        let mut components = Vec::new();
        LanguageParser::new(Language::Ruby)
            .parse(&ctx, &mut components, source)
            .await;
        components
    }

    #[tokio::test]
    async fn test_require_gem() {
        let components = parse("require 'nokogiri'").await;
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].name(), "nokogiri");
        assert_eq!(components[0].component_type(), ComponentType::External);
    }

    #[tokio::test]
    async fn test_require_stdlib() {
        let components = parse("require 'json'").await;
        assert_eq!(components[0].component_type(), ComponentType::Language);
    }

    #[tokio::test]
    async fn test_require_stdlib_subpath() {
        let components = parse("require 'net/http'").await;
        assert_eq!(components[0].name(), "http");
        assert_eq!(components[0].group(), Some("net"));
        assert_eq!(components[0].component_type(), ComponentType::Language);
    }

    #[tokio::test]
    async fn test_require_relative_found_is_internal() {
        let components =
            parse_with_files("require_relative 'helpers/config'", &["lib/helpers/config.rb"])
                .await;
        assert_eq!(components[0].name(), "config");
        assert_eq!(components[0].component_type(), ComponentType::Internal);
    }

    #[tokio::test]
    async fn test_require_relative_missing_is_external() {
        let components = parse_with_files("require_relative 'ghost'", &["lib/app.rb"]).await;
        assert_eq!(components[0].component_type(), ComponentType::External);
    }

    #[tokio::test]
    async fn test_load_statement() {
        let components = parse("load 'tasks.rb'").await;
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].name(), "tasks");
    }

    #[tokio::test]
    async fn test_comment_ignored() {
        let components = parse("# require 'rails'\nrequire 'sinatra'").await;
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].name(), "sinatra");
    }

    #[tokio::test]
    async fn test_block_comment_ignored() {
        let components = parse("=begin\nrequire 'rails'\n=end\nrequire 'rack'").await;
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].name(), "rack");
    }
}
