//! Persistence of the configuration in the host graph.

use crate::config::{Properties, storage_keys};
use crate::error::GraphConfigError;

/// Label of the entity holding the configuration mapping.
pub const GRAPH_CONFIG_LABEL: &str = "_GraphConfig";
/// Label of the sibling entity holding the forcibly assigned node properties.
pub const NODE_PROPERTIES_LABEL: &str = "_ForciblyAssignedOnImportNodeProperties";
/// Relationship type linking the two entities.
pub const HAS_REL: &str = "HAS";

/// The host graph, as seen by the configuration [`procedures`](crate::procedures).
///
/// The persisted form is the mapping returned by [`GraphConfig::to_stored`](crate::GraphConfig::to_stored),
/// minus the forcibly assigned node properties that are stored separately.
pub trait GraphConfigStore {
    /// Whether the graph already holds imported resources.
    fn has_resources(&self) -> Result<bool, GraphConfigError>;

    /// Loads the stored configuration.
    ///
    /// The node properties entity, if any, is returned nested under
    /// [`storage_keys::FORCIBLY_ASSIGNED_NODE_PROPERTIES`].
    fn load_config(&self) -> Result<Option<Properties>, GraphConfigError>;

    /// Replaces the stored configuration.
    fn save_config(
        &mut self,
        config: Properties,
        node_properties: Properties,
    ) -> Result<(), GraphConfigError>;

    /// Removes the stored configuration and its node properties entity.
    fn delete_config(&mut self) -> Result<(), GraphConfigError>;
}

/// A [`GraphConfigStore`] kept in memory.
///
/// ```
/// use graphconf::{GraphConfigStore, MemoryGraphStore};
///
/// let mut store = MemoryGraphStore::new();
/// assert!(!store.has_resources()?);
/// store.add_resources(3);
/// assert!(store.has_resources()?);
/// # Result::<_, graphconf::GraphConfigError>::Ok(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryGraphStore {
    config: Option<Properties>,
    node_properties: Option<Properties>,
    resources: usize,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates the import of `count` resources.
    pub fn add_resources(&mut self, count: usize) {
        self.resources += count;
    }

    /// Removes every resource, leaving the configuration in place.
    pub fn clear_resources(&mut self) {
        self.resources = 0;
    }

    pub fn resource_count(&self) -> usize {
        self.resources
    }

    /// The raw `_GraphConfig` entity, without the nested node properties.
    pub fn config_entity(&self) -> Option<&Properties> {
        self.config.as_ref()
    }

    /// The raw `_ForciblyAssignedOnImportNodeProperties` entity.
    pub fn node_properties_entity(&self) -> Option<&Properties> {
        self.node_properties.as_ref()
    }
}

impl GraphConfigStore for MemoryGraphStore {
    fn has_resources(&self) -> Result<bool, GraphConfigError> {
        Ok(self.resources > 0)
    }

    fn load_config(&self) -> Result<Option<Properties>, GraphConfigError> {
        Ok(self.config.as_ref().map(|config| {
            let mut stored = config.clone();
            if let Some(node_properties) = &self.node_properties {
                stored.insert(
                    storage_keys::FORCIBLY_ASSIGNED_NODE_PROPERTIES.into(),
                    node_properties.clone().into(),
                );
            }
            stored
        }))
    }

    fn save_config(
        &mut self,
        mut config: Properties,
        node_properties: Properties,
    ) -> Result<(), GraphConfigError> {
        config.remove(storage_keys::FORCIBLY_ASSIGNED_NODE_PROPERTIES);
        self.config = Some(config);
        self.node_properties = Some(node_properties);
        Ok(())
    }

    fn delete_config(&mut self) -> Result<(), GraphConfigError> {
        self.config = None;
        self.node_properties = None;
        Ok(())
    }
}
