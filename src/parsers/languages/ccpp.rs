//! C and C++ include grammar.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::model::{ComponentBuilder, ComponentType};
use crate::parsers::ParserContext;

use super::stdlib::C_CPP_HEADERS;

/// Matches angle-bracket and quoted includes. Runs on comment-stripped text.
pub(super) static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"#include[ \t]*(?:<([^>\n]+)>|"([^"\n]+)")"#)
        .expect("c/c++ include regex must compile")
});

pub(super) fn parse_match(caps: &Captures, out: &mut Vec<ComponentBuilder>) {
    if let Some(external) = caps.get(1) {
        out.push(ComponentBuilder::new(external.as_str().trim()));
    } else if let Some(quoted) = caps.get(2) {
        // Quoted includes are speculatively internal; the lookup decides.
        let mut builder = ComponentBuilder::new(quoted.as_str().trim());
        builder.set_type(ComponentType::Internal);
        out.push(builder);
    }
}

/// Header lookup by bare file name. Makefiles control include paths, so the
/// path prefix of an include tells us nothing; `.in` templates count as
/// their generated header.
pub(super) fn is_internal(ctx: &ParserContext, builder: &ComponentBuilder) -> bool {
    let name = builder.name().to_lowercase().replace('\\', "/");
    let target = name.rsplit('/').next().unwrap_or(&name);

    ctx.source_files.iter().any(|file| {
        let mut file_name = file
            .rsplit('/')
            .next()
            .unwrap_or(file)
            .to_lowercase();
        if let Some(stem) = file_name.strip_suffix(".in") {
            file_name = stem.to_string();
        }
        file_name == target
    })
}

/// Standard headers match exactly; a `foo.h` header also counts when the
/// C++ `cfoo` form is standard.
pub(super) fn is_stdlib(builder: &ComponentBuilder) -> bool {
    let name = builder.name();
    if C_CPP_HEADERS.contains(name) {
        return true;
    }
    match name.strip_suffix(".h") {
        Some(stem) => C_CPP_HEADERS.contains(format!("c{}", stem).as_str()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Language, LanguageParser};
    use super::*;
    use crate::parsers::Parser;

    async fn parse_with_files(source: &str, files: &[&str]) -> Vec<ComponentBuilder> {
        let mut ctx = ParserContext::new("proj");
        ctx.source_files = files.iter().map(|f| f.to_string()).collect();
        let mut components = Vec::new();
        LanguageParser::new(Language::CCpp)
            .parse(&ctx, &mut components, source)
            .await;
        components
    }

    #[tokio::test]
    async fn test_angle_include_stdlib() {
        let components = parse_with_files("#include <vector>", &[]).await;
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].name(), "vector");
        assert_eq!(components[0].component_type(), ComponentType::Language);
    }

    #[tokio::test]
    async fn test_c_header_resolves_via_clib_form() {
        // math.h is standard because cmath is
        let components = parse_with_files("#include <math.h>", &[]).await;
        assert_eq!(components[0].component_type(), ComponentType::Language);
    }

    #[tokio::test]
    async fn test_angle_include_external() {
        let components = parse_with_files("#include <boost/asio.hpp>", &[]).await;
        assert_eq!(components[0].name(), "boost/asio.hpp");
        assert_eq!(components[0].component_type(), ComponentType::External);
    }

    #[tokio::test]
    async fn test_quoted_include_found_is_internal() {
        let components =
            parse_with_files("#include \"parser.h\"", &["src/include/parser.h"]).await;
        assert_eq!(components[0].component_type(), ComponentType::Internal);
    }

    #[tokio::test]
    async fn test_quoted_include_missing_is_retagged_external() {
        // Marked internal by quoting style, but no such file exists
        let components = parse_with_files("#include \"ghost.h\"", &["src/main.cpp"]).await;
        assert_eq!(components[0].component_type(), ComponentType::External);
    }

    #[tokio::test]
    async fn test_quoted_include_matches_dot_in_template() {
        let components = parse_with_files("#include \"config.h\"", &["src/config.h.in"]).await;
        assert_eq!(components[0].component_type(), ComponentType::Internal);
    }

    #[tokio::test]
    async fn test_commented_include_ignored() {
        let source = "// #include <vector>\n/* #include <map> */\n#include <set>";
        let components = parse_with_files(source, &[]).await;
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].name(), "set");
    }
}
