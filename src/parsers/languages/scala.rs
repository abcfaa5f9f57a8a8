//! Scala import grammar.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::model::ComponentBuilder;

use super::stdlib::SCALA_ROOTS;

/// Matches dotted imports with a final identifier, wildcard (`_`), or a
/// selector group (`{A, B => C}`). Runs on comment-stripped text.
pub(super) static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*import[ \t]+([\w.]+)\.(?:\{([^}]*)\}|([\w*_]+))")
        .expect("scala import regex must compile")
});

static SELECTOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([\w*_]+)(?:[ \t]*=>[ \t]*(\w+))?").expect("scala selector regex must compile")
});

pub(super) fn parse_match(caps: &Captures, out: &mut Vec<ComponentBuilder>) {
    let prefix = match caps.get(1) {
        Some(m) => m.as_str().replace('.', "/"),
        None => return,
    };

    if let Some(selectors) = caps.get(2) {
        // import a.b.{C, D => E}
        for selector in selectors.as_str().split(',') {
            let selector = selector.trim();
            if selector.is_empty() {
                continue;
            }
            if let Some(sel_caps) = SELECTOR_RE.captures(selector) {
                let name = sel_caps.get(1).map(|m| m.as_str()).unwrap_or("");
                if name.is_empty() {
                    continue;
                }
                let mut builder = ComponentBuilder::new(name);
                builder.set_group(prefix.clone());
                if let Some(rename) = sel_caps.get(2) {
                    builder.set_alias(rename.as_str());
                }
                out.push(builder);
            }
        }
    } else if let Some(last) = caps.get(3) {
        let mut builder = ComponentBuilder::new(last.as_str());
        builder.set_group(prefix);
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
    SCALA_ROOTS.contains(root)
}

#[cfg(test)]
mod tests {
    use super::super::{Language, LanguageParser};
    use super::*;
    use crate::model::ComponentType;
    use crate::parsers::{Parser, ParserContext};

    async fn parse(source: &str) -> Vec<ComponentBuilder> {
        let mut components = Vec::new();
        LanguageParser::new(Language::Scala)
            .parse(&ParserContext::new("proj"), &mut components, source)
            .await;
        components
    }

    #[tokio::test]
    async fn test_simple_import() {
        let components = parse("import scala.io.Source").await;
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].name(), "Source");
        assert_eq!(components[0].group(), Some("scala/io"));
        assert_eq!(components[0].component_type(), ComponentType::Language);
    }

    #[tokio::test]
    async fn test_external_import() {
        let components = parse("import org.apache.spark.SparkContext").await;
        assert_eq!(components[0].name(), "SparkContext");
        assert_eq!(components[0].group(), Some("org/apache/spark"));
        assert_eq!(components[0].component_type(), ComponentType::External);
    }

    #[tokio::test]
    async fn test_selector_group() {
        let components = parse("import scala.collection.mutable.{Map, Set}").await;
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].name(), "Map");
        assert_eq!(components[0].group(), Some("scala/collection/mutable"));
        assert_eq!(components[1].name(), "Set");
    }

    #[tokio::test]
    async fn test_selector_rename_captured_as_alias() {
        let components = parse("import scala.collection.mutable.{Map => MMap}").await;
        assert_eq!(components[0].name(), "Map");
        assert_eq!(components[0].alias(), Some("MMap"));
    }

    #[tokio::test]
    async fn test_underscore_wildcard_renamed() {
        let components = parse("import scala.collection.mutable._").await;
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].name(), "mutable");
        assert_eq!(components[0].group(), Some("scala/collection"));
        assert_eq!(components[0].component_type(), ComponentType::Language);
    }

    #[tokio::test]
    async fn test_commented_import_ignored() {
        let components = parse("// import foo.Bar\nimport org.example.Baz").await;
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].name(), "Baz");
    }
}
