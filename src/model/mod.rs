//! Domain model: components, licenses, and the dependency graph.

pub mod component;
pub mod license;
pub mod sbom;

pub use component::{Component, ComponentBuilder, ComponentId, ComponentType};
pub use license::License;
pub use sbom::Sbom;
