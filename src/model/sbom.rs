use std::collections::HashMap;

use tracing::{debug, warn};

use crate::shared::SbomError;

use super::component::{Component, ComponentBuilder, ComponentId, ComponentType};

/// The canonical dependency graph built from all parser output.
///
/// A forest rooted at a synthetic head component (the project itself),
/// stored as an id-keyed component map plus a parent -> ordered children
/// map. Children keep insertion order so document output is deterministic.
/// Components are never removed; the graph lives for one generation run.
#[derive(Debug, Clone)]
pub struct Sbom {
    head: ComponentId,
    components: HashMap<ComponentId, Component>,
    children: HashMap<ComponentId, Vec<ComponentId>>,
}

impl Sbom {
    /// Creates a graph whose head component is the project itself.
    pub fn new(project_name: &str) -> Self {
        let mut builder = ComponentBuilder::new(project_name);
        builder.set_type(ComponentType::Application);
        let head = builder.build();
        let head_id = head.id();

        let mut components = HashMap::new();
        components.insert(head_id, head);

        Self {
            head: head_id,
            components,
            children: HashMap::new(),
        }
    }

    pub fn head_id(&self) -> ComponentId {
        self.head
    }

    pub fn head(&self) -> &Component {
        &self.components[&self.head]
    }

    /// Attaches a component under an existing parent.
    ///
    /// The parent must already be present in the graph; a never-seen parent
    /// id is a hard graph-consistency error, not a silent no-op.
    pub fn add_component(
        &mut self,
        parent: ComponentId,
        component: Component,
    ) -> Result<ComponentId, SbomError> {
        if !self.components.contains_key(&parent) {
            return Err(SbomError::GraphConsistency {
                parent: parent.to_string(),
                child: component.name().to_string(),
            });
        }

        let id = component.id();
        debug!(component = %component.to_readable_string(), "new component");
        self.components.insert(id, component);
        self.children.entry(parent).or_default().push(id);
        Ok(id)
    }

    /// Appends a per-file batch of components under the given parent.
    ///
    /// Individual insertion failures are logged and skipped; one bad
    /// insertion never aborts the batch.
    pub fn add_components(&mut self, parent: ComponentId, components: Vec<Component>) {
        for component in components {
            if let Err(e) = self.add_component(parent, component) {
                warn!(error = %e, "dropping component");
            }
        }
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(&id)
    }

    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.components.get_mut(&id)
    }

    /// Child ids of a parent, in insertion order. Empty for leaves and
    /// unknown ids.
    pub fn children_of(&self, parent: ComponentId) -> &[ComponentId] {
        self.children
            .get(&parent)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every component in the graph, head included, in unspecified order.
    pub fn all_components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    /// Looks up an existing component by name, used by the controller to
    /// merge duplicate discoveries from different files.
    pub fn find_by_name(&self, name: &str) -> Option<ComponentId> {
        self.components
            .values()
            .find(|c| c.id() != self.head && c.name() == name)
            .map(|c| c.id())
    }

    /// Number of components excluding the head.
    pub fn component_count(&self) -> usize {
        self.components.len() - 1
    }
}
