//! srcbom - SBOM generation from static source analysis
//!
//! This library analyzes a source project (language files plus
//! package-manager manifests) and produces a Software Bill of Materials as
//! a CycloneDX or SPDX document.
//!
//! # Pipeline
//!
//! - **Parsers** (`parsers`): per-language and per-manifest extractors that
//!   turn raw file text into classified components
//! - **Model** (`model`): components, licenses, and the project-rooted
//!   dependency graph
//! - **Registry** (`registry`): best-effort license enrichment against
//!   package registries
//! - **Generation** (`generation`): schema-specific stores and serializers
//!
//! # Example
//!
//! ```no_run
//! use srcbom::prelude::*;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> srcbom::shared::Result<()> {
//! let registry = Arc::new(HttpRegistry::new()?);
//! let mut controller = ParserController::new(Path::new("."), registry);
//! controller.parse_project(None).await?;
//!
//! let generator = SbomGenerator::new(controller.into_sbom(), GeneratorSchema::CycloneDx);
//! let document = generator.write_string(GeneratorFormat::Json)?;
//! println!("{}", document);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod generation;
pub mod model;
pub mod parsers;
pub mod registry;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::generation::{
        BomStore, GeneratorFormat, GeneratorSchema, SbomGenerator, Tool,
    };
    pub use crate::model::{Component, ComponentBuilder, ComponentId, ComponentType, License, Sbom};
    pub use crate::parsers::controller::{parser_for, ParserController, ParserKind};
    pub use crate::parsers::languages::{Language, LanguageParser};
    pub use crate::parsers::{Parser, ParserContext};
    pub use crate::registry::{HttpRegistry, RegistryQuery, RegistryResponse};
    pub use crate::shared::Result;
}
