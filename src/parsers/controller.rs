//! Central controller that interfaces between the driver and the language
//! and package-manager specific parsers.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use indicatif::ProgressBar;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::model::Sbom;
use crate::registry::RegistryQuery;
use crate::shared::security;
use crate::shared::Result;

use super::languages::{Language, LanguageParser};
use super::packagemanagers::{
    CargoParser, ConanParser, CsProjParser, GradleParser, MavenParser, RequirementsParser,
};
use super::{Parser, ParserContext};

/// Supported manifest formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Maven,
    Cargo,
    Requirements,
    Gradle,
    Conan,
    CsProj,
}

impl PackageManager {
    fn build(self, registry: Arc<dyn RegistryQuery>) -> Box<dyn Parser> {
        match self {
            PackageManager::Maven => Box::new(MavenParser::new(registry)),
            PackageManager::Cargo => Box::new(CargoParser::new(registry)),
            PackageManager::Requirements => Box::new(RequirementsParser::new(registry)),
            PackageManager::Gradle => Box::new(GradleParser::new(registry)),
            PackageManager::Conan => Box::new(ConanParser::new(registry)),
            PackageManager::CsProj => Box::new(CsProjParser::new(registry)),
        }
    }
}

/// The parser a file resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    Language(Language),
    PackageManager(PackageManager),
}

/// Resolves a file name to its parser. Generic extensions like `xml`, `txt`,
/// and `toml` are matched by full basename instead.
pub fn parser_for(file_name: &str) -> Option<ParserKind> {
    match file_name {
        "pom.xml" => return Some(ParserKind::PackageManager(PackageManager::Maven)),
        "requirements.txt" => {
            return Some(ParserKind::PackageManager(PackageManager::Requirements))
        }
        "conanfile.txt" => return Some(ParserKind::PackageManager(PackageManager::Conan)),
        "Cargo.toml" => return Some(ParserKind::PackageManager(PackageManager::Cargo)),
        "build.gradle" => return Some(ParserKind::PackageManager(PackageManager::Gradle)),
        _ => {}
    }

    let extension = file_name.rsplit_once('.').map(|(_, ext)| ext)?;
    match extension {
        "c" | "h" | "cpp" | "hpp" | "cc" | "hh" => Some(ParserKind::Language(Language::CCpp)),
        "cs" => Some(ParserKind::Language(Language::CSharp)),
        "py" => Some(ParserKind::Language(Language::Python)),
        "java" => Some(ParserKind::Language(Language::Java)),
        "js" | "jsx" | "ts" | "tsx" => Some(ParserKind::Language(Language::JsTs)),
        "rb" => Some(ParserKind::Language(Language::Ruby)),
        "sc" | "scala" => Some(ParserKind::Language(Language::Scala)),
        "go" => Some(ParserKind::Language(Language::Go)),
        "gradle" => Some(ParserKind::PackageManager(PackageManager::Gradle)),
        "csproj" => Some(ParserKind::PackageManager(PackageManager::CsProj)),
        _ => None,
    }
}

/// Walks a project tree, dispatches each file to its parser, and aggregates
/// everything into one project-rooted dependency graph.
pub struct ParserController {
    project_name: String,
    registry: Arc<dyn RegistryQuery>,
    sbom: Sbom,
    ctx: ParserContext,
    dir_count: usize,
    file_count: usize,
}

impl ParserController {
    pub fn new(source_root: &Path, registry: Arc<dyn RegistryQuery>) -> Self {
        let project_name = source_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string());

        Self {
            sbom: Sbom::new(&project_name),
            project_name,
            registry,
            ctx: ParserContext::new(source_root),
            dir_count: 0,
            file_count: 0,
        }
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn sbom(&self) -> &Sbom {
        &self.sbom
    }

    pub fn into_sbom(self) -> Sbom {
        self.sbom
    }

    pub fn dir_count(&self) -> usize {
        self.dir_count
    }

    pub fn file_count(&self) -> usize {
        self.file_count
    }

    pub fn component_count(&self) -> usize {
        self.sbom.component_count()
    }

    /// Seeds the internal-file index directly. Production walks call this
    /// implicitly; tests use it to build virtual trees.
    pub fn set_source_files(&mut self, files: Vec<String>) {
        self.ctx.source_files = files;
    }

    /// Walks the source root and parses every recognized file in walk order.
    ///
    /// The first pass indexes all file paths so internal-component lookups
    /// see the whole tree before any file is parsed.
    pub async fn parse_project(&mut self, progress: Option<&ProgressBar>) -> Result<()> {
        let root = self.ctx.source_root.clone();
        let mut files = Vec::new();

        for entry in WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                // Hidden directories (.git and friends) are not project source
                !e.file_name()
                    .to_string_lossy()
                    .starts_with('.')
                    || e.depth() == 0
            })
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(error = %e, "unreadable entry, skipping");
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                if entry.depth() > 0 {
                    self.dir_count += 1;
                }
                continue;
            }
            if entry.path_is_symlink() {
                debug!(path = %entry.path().display(), "skipping symlink");
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");
            files.push((relative, entry.path().to_path_buf()));
        }

        self.ctx.source_files = files.iter().map(|(relative, _)| relative.clone()).collect();

        for (relative, path) in files {
            if parser_for(file_name_of(&relative)).is_none() {
                debug!(file = %relative, "skipping file with ignored filetype");
                continue;
            }
            if !security::within_size_limit(&path) {
                debug!(file = %relative, "skipping oversized file");
                continue;
            }

            let contents = match std::fs::read_to_string(&path) {
                Ok(contents) => contents,
                Err(e) => {
                    debug!(file = %relative, error = %e, "unreadable file, skipping");
                    continue;
                }
            };

            if let Some(progress) = progress {
                progress.set_message(relative.clone());
                progress.tick();
            }

            self.parse_file(&relative, &contents).await;
        }

        Ok(())
    }

    /// Parses one file and attaches its components to the head component.
    ///
    /// Parser errors never escape the file: an unrecognized or unparseable
    /// file contributes nothing and the walk continues.
    pub async fn parse_file(&mut self, relative_path: &str, contents: &str) {
        let file_name = file_name_of(relative_path);

        let kind = match parser_for(file_name) {
            Some(kind) => kind,
            None => {
                debug!(file = %relative_path, "skipping file with ignored filetype");
                return;
            }
        };
        info!(file = %relative_path, "parsing file");

        self.ctx.pwd = Path::new(relative_path)
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default();

        let mut builders = Vec::new();
        let packaged = match kind {
            ParserKind::Language(language) => {
                LanguageParser::new(language)
                    .parse(&self.ctx, &mut builders, contents)
                    .await;
                false
            }
            ParserKind::PackageManager(package_manager) => {
                package_manager
                    .build(Arc::clone(&self.registry))
                    .parse(&self.ctx, &mut builders, contents)
                    .await;
                true
            }
        };

        // Repeated references within one file collapse to one component
        let mut seen: HashSet<(String, Option<String>)> = HashSet::new();
        let mut components = Vec::new();
        for mut builder in builders {
            let key = (
                builder.name().to_string(),
                builder.group().map(str::to_string),
            );
            if !seen.insert(key) {
                debug!(name = builder.name(), "duplicate reference in file, skipping");
                continue;
            }

            if packaged {
                builder.set_packaged();
            }
            builder.add_file(relative_path);
            components.push(builder.build());
        }

        let head = self.sbom.head_id();
        self.sbom.add_components(head, components);
        self.file_count += 1;
    }
}

fn file_name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::super::packagemanagers::test_support::FailingRegistry;
    use super::*;
    use crate::model::ComponentType;

    fn controller() -> ParserController {
        ParserController::new(Path::new("demo-project"), Arc::new(FailingRegistry))
    }

    #[test]
    fn test_parser_for_basenames() {
        assert_eq!(
            parser_for("pom.xml"),
            Some(ParserKind::PackageManager(PackageManager::Maven))
        );
        assert_eq!(
            parser_for("requirements.txt"),
            Some(ParserKind::PackageManager(PackageManager::Requirements))
        );
        assert_eq!(
            parser_for("Cargo.toml"),
            Some(ParserKind::PackageManager(PackageManager::Cargo))
        );
    }

    #[test]
    fn test_parser_for_extensions() {
        assert_eq!(parser_for("Main.java"), Some(ParserKind::Language(Language::Java)));
        assert_eq!(parser_for("app.py"), Some(ParserKind::Language(Language::Python)));
        assert_eq!(parser_for("demo.csproj"), Some(ParserKind::PackageManager(PackageManager::CsProj)));
    }

    #[test]
    fn test_parser_for_unknown() {
        assert_eq!(parser_for("README.md"), None);
        assert_eq!(parser_for("data.xml"), None);
        assert_eq!(parser_for("notes.txt"), None);
        assert_eq!(parser_for("no_extension"), None);
    }

    #[tokio::test]
    async fn test_parse_file_attaches_to_head() {
        let mut controller = controller();
        controller
            .parse_file("src/Main.java", "import com.example.Widget;")
            .await;

        let sbom = controller.sbom();
        assert_eq!(sbom.component_count(), 1);
        let children = sbom.children_of(sbom.head_id());
        assert_eq!(sbom.component(children[0]).unwrap().name(), "Widget");
    }

    #[tokio::test]
    async fn test_parse_file_tags_origin_file() {
        let mut controller = controller();
        controller
            .parse_file("src/Main.java", "import com.example.Widget;")
            .await;

        let sbom = controller.sbom();
        let id = sbom.children_of(sbom.head_id())[0];
        assert_eq!(sbom.component(id).unwrap().files(), ["src/Main.java"]);
    }

    #[tokio::test]
    async fn test_package_manager_output_is_packaged() {
        let mut controller = controller();
        controller
            .parse_file("requirements.txt", "requests == 2.31.0\n")
            .await;

        let sbom = controller.sbom();
        let id = sbom.children_of(sbom.head_id())[0];
        let component = sbom.component(id).unwrap();
        assert!(component.is_packaged());
        assert_eq!(component.component_type(), ComponentType::External);
    }

    #[tokio::test]
    async fn test_language_output_is_unpackaged() {
        let mut controller = controller();
        controller
            .parse_file("src/app.py", "import requests\n")
            .await;

        let sbom = controller.sbom();
        let id = sbom.children_of(sbom.head_id())[0];
        assert!(!sbom.component(id).unwrap().is_packaged());
    }

    #[tokio::test]
    async fn test_unknown_file_type_is_skipped() {
        let mut controller = controller();
        controller.parse_file("README.md", "import nothing").await;
        assert_eq!(controller.component_count(), 0);
        assert_eq!(controller.file_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_references_in_one_file_collapse() {
        let mut controller = controller();
        controller
            .parse_file("src/app.py", "import requests\nimport requests\n")
            .await;
        assert_eq!(controller.component_count(), 1);
    }

    #[tokio::test]
    async fn test_file_count_increments_per_parsed_file() {
        let mut controller = controller();
        controller.parse_file("src/app.py", "import requests\n").await;
        controller.parse_file("src/other.py", "import flask\n").await;
        assert_eq!(controller.file_count(), 2);
    }

    #[tokio::test]
    async fn test_idempotent_reparse_with_fresh_graph() {
        let source = "import requests\nimport flask\n";

        let mut first = controller();
        first.parse_file("src/app.py", source).await;
        let mut second = controller();
        second.parse_file("src/app.py", source).await;

        let mut names_first: Vec<String> = first
            .sbom()
            .all_components()
            .filter(|c| c.id() != first.sbom().head_id())
            .map(|c| format!("{}:{:?}", c.name(), c.component_type()))
            .collect();
        let mut names_second: Vec<String> = second
            .sbom()
            .all_components()
            .filter(|c| c.id() != second.sbom().head_id())
            .map(|c| format!("{}:{:?}", c.name(), c.component_type()))
            .collect();
        names_first.sort();
        names_second.sort();

        assert_eq!(names_first, names_second);
    }
}
